//! Extended M3U parsing
//!
//! `#EXTINF` opens a pending entry; the next non-comment line supplies its
//! URL. Directive lines in between (`#EXTVLCOPT`, `#EXTGRP`, ...) are
//! ignored. A pending entry that never receives a URL is dropped and
//! reported as a skip.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::{ParseReport, PlaylistParser};
use crate::models::{ChannelRecord, SourceFormat, DEFAULT_GROUP, LIVE_DURATION};

const EXTINF_PREFIX: &str = "#EXTINF";

/// Parser for `#EXTM3U` playlists
#[derive(Debug, Default, Clone, Copy)]
pub struct M3uParser;

/// Metadata collected from an `#EXTINF` line, waiting for its URL
#[derive(Debug, Clone, PartialEq)]
struct PendingEntry {
    line: usize,
    name: String,
    group: String,
    tvg_id: String,
    logo: String,
    duration_seconds: i64,
}

impl PendingEntry {
    fn into_record(self, url: &str, source_id: &str, priority: i32) -> ChannelRecord {
        ChannelRecord::new(self.name, url, source_id, priority)
            .with_group(self.group)
            .with_tvg_id(self.tvg_id)
            .with_logo(self.logo)
            .with_duration(self.duration_seconds)
    }
}

impl PlaylistParser for M3uParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::M3u
    }

    fn parse(&self, content: &str, source_id: &str, priority: i32) -> ParseReport {
        let mut report = ParseReport::new(SourceFormat::M3u);
        let mut pending: Option<PendingEntry> = None;

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();

            if line.is_empty() {
                continue;
            }

            if line.starts_with(EXTINF_PREFIX) {
                if let Some(orphan) = pending.take() {
                    report.skip(orphan.line, "metadata line without URL");
                }
                pending = Some(parse_extinf_line(line, line_number));
            } else if line.starts_with('#') {
                continue;
            } else if let Some(entry) = pending.take() {
                report
                    .records
                    .push(entry.into_record(line, source_id, priority));
            } else {
                report.skip(line_number, "URL without preceding metadata line");
            }
        }

        if let Some(orphan) = pending {
            report.skip(orphan.line, "metadata line without URL at end of input");
        }

        debug!(
            "Parsed {} M3U entries from '{}' ({} skipped)",
            report.records.len(),
            source_id,
            report.skipped.len()
        );
        report
    }
}

/// Parse `#EXTINF:<runtime> key="value" ...,<display name>`
///
/// Unparseable attributes keep their defaults; the line itself is never rejected.
fn parse_extinf_line(line: &str, line_number: usize) -> PendingEntry {
    let body = line
        .strip_prefix(EXTINF_PREFIX)
        .unwrap_or(line)
        .trim_start_matches(':');

    let (attributes_part, name) = match find_title_separator(body) {
        Some(pos) => (&body[..pos], body[pos + 1..].trim()),
        None => (body, ""),
    };

    let mut entry = PendingEntry {
        line: line_number,
        name: name.to_string(),
        group: DEFAULT_GROUP.to_string(),
        tvg_id: String::new(),
        logo: String::new(),
        duration_seconds: attributes_part
            .split_whitespace()
            .next()
            .and_then(parse_duration)
            .unwrap_or(LIVE_DURATION),
    };

    for (key, value) in parse_attributes(attributes_part) {
        match key.to_ascii_lowercase().as_str() {
            "group-title" if !value.is_empty() => entry.group = value,
            "tvg-id" => entry.tvg_id = value,
            "tvg-logo" => entry.logo = value,
            "duration" => match parse_duration(&value) {
                Some(seconds) => entry.duration_seconds = seconds,
                None => debug!(
                    "Ignoring unparseable duration '{}' at line {}",
                    value, line_number
                ),
            },
            _ => {}
        }
    }

    entry
}

/// Position of the first comma that is not inside a quoted attribute value
fn find_title_separator(body: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (pos, ch) in body.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some(pos),
            _ => {}
        }
    }
    // Unbalanced quotes: fall back to the first comma anywhere
    body.find(',')
}

fn parse_attributes(attributes: &str) -> Vec<(String, String)> {
    static ATTRIBUTE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = ATTRIBUTE.get_or_init(|| Regex::new(r#"([A-Za-z0-9_-]+)="([^"]*)""#).ok())
    else {
        return Vec::new();
    };

    re.captures_iter(attributes)
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect()
}

fn parse_duration(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|seconds| seconds.is_finite())
            .map(|seconds| seconds as i64)
    })
}
