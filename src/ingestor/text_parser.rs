//! Plain-text `name,#url` listings
//!
//! A line whose URL part is the `genre#` marker opens a new group for the
//! lines that follow it.

use tracing::debug;

use super::{ParseReport, PlaylistParser};
use crate::models::{ChannelRecord, SourceFormat, DEFAULT_GROUP};

const DELIMITER: &str = ",#";
const GENRE_MARKER: &str = "genre#";

#[derive(Debug, Default, Clone, Copy)]
pub struct TextParser;

impl PlaylistParser for TextParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Text
    }

    fn parse(&self, content: &str, source_id: &str, priority: i32) -> ParseReport {
        let mut report = ParseReport::new(SourceFormat::Text);
        let mut group = DEFAULT_GROUP.to_string();

        for (index, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((name, url)) = line.split_once(DELIMITER) else {
                report.skip(index + 1, "missing ',#' delimiter");
                continue;
            };
            let (name, url) = (name.trim(), url.trim());

            if url.eq_ignore_ascii_case(GENRE_MARKER) {
                group = if name.is_empty() {
                    DEFAULT_GROUP.to_string()
                } else {
                    name.to_string()
                };
                continue;
            }

            if url.is_empty() {
                report.skip(index + 1, "empty URL");
                continue;
            }

            report.records.push(
                ChannelRecord::new(name, url, source_id, priority).with_group(group.clone()),
            );
        }

        debug!(
            "Parsed {} text entries from '{}' ({} skipped)",
            report.records.len(),
            source_id,
            report.skipped.len()
        );
        report
    }
}
