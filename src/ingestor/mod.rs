//! Source ingestion
//!
//! Turns raw source text into [`ChannelRecord`]s and drives the fetch/parse
//! cycle for every configured source. Parsing never fails as a whole: a
//! malformed line only produces a [`ParseSkip`].

pub mod m3u_parser;
pub mod text_parser;

pub use m3u_parser::M3uParser;
pub use text_parser::TextParser;

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{ChannelRecord, SourceDefinition, SourceFormat, WorkOutcome};
use crate::sources::SourceFetcher;
use crate::utils::url::UrlUtils;

/// Number of leading characters inspected by format auto-detection
const FORMAT_SNIFF_CHARS: usize = 20;
const M3U_HEADER: &str = "#EXTM3U";

/// One line (or record) that was dropped while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSkip {
    /// 1-based line number the skipped record started on
    pub line: usize,
    pub reason: String,
}

/// Records recovered from one source plus everything that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    /// Format actually used, never [`SourceFormat::Auto`]
    pub format: SourceFormat,
    pub records: Vec<ChannelRecord>,
    pub skipped: Vec<ParseSkip>,
}

impl ParseReport {
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub(crate) fn skip<S: Into<String>>(&mut self, line: usize, reason: S) {
        let reason = reason.into();
        debug!("Skipping line {}: {}", line, reason);
        self.skipped.push(ParseSkip { line, reason });
    }
}

/// Parser for one concrete listing format
pub trait PlaylistParser: Send + Sync {
    fn format(&self) -> SourceFormat;

    fn parse(&self, content: &str, source_id: &str, priority: i32) -> ParseReport;
}

/// Resolve `Auto` by looking for the `#EXTM3U` header near the start
pub fn detect_format(content: &str) -> SourceFormat {
    let head: String = content
        .trim_start_matches('\u{feff}')
        .chars()
        .take(FORMAT_SNIFF_CHARS)
        .collect();
    if head.contains(M3U_HEADER) {
        SourceFormat::M3u
    } else {
        SourceFormat::Text
    }
}

/// Parse raw text into channel records
pub fn parse(content: &str, format: SourceFormat, source_id: &str, priority: i32) -> Vec<ChannelRecord> {
    parse_with_report(content, format, source_id, priority).records
}

/// Parse raw text, keeping track of skipped lines
pub fn parse_with_report(
    content: &str,
    format: SourceFormat,
    source_id: &str,
    priority: i32,
) -> ParseReport {
    let format = match format {
        SourceFormat::Auto => detect_format(content),
        explicit => explicit,
    };

    match format {
        SourceFormat::Text => TextParser.parse(content, source_id, priority),
        _ => M3uParser.parse(content, source_id, priority),
    }
}

/// Result of ingesting one configured source
#[derive(Debug, Clone)]
pub struct SourceIngestion {
    pub source: SourceDefinition,
    pub outcome: WorkOutcome<ParseReport>,
}

/// Fetches and parses every configured source on a bounded pool
pub struct IngestorService {
    fetcher: Arc<dyn SourceFetcher>,
    workers: usize,
}

impl IngestorService {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
        }
    }

    /// Ingest all sources concurrently
    ///
    /// Results come back in the same order as `sources`, whatever order the
    /// fetches complete in.
    pub async fn ingest_all(&self, sources: &[SourceDefinition]) -> Vec<SourceIngestion> {
        info!(
            "Ingesting {} sources with {} workers",
            sources.len(),
            self.workers
        );

        let results: Vec<SourceIngestion> = stream::iter(sources.iter().cloned())
            .map(|source| async move {
                let outcome = self.ingest_source(&source).await;
                SourceIngestion { source, outcome }
            })
            .buffered(self.workers)
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
        info!(
            "Ingestion finished: {}/{} sources succeeded",
            succeeded,
            results.len()
        );
        results
    }

    /// Fetch and parse a single source
    pub async fn ingest_source(&self, source: &SourceDefinition) -> WorkOutcome<ParseReport> {
        let safe_locator = UrlUtils::obfuscate_credentials(&source.url);

        let content = match self.fetcher.fetch(&source.url).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to fetch source '{}': {}", safe_locator, e);
                return WorkOutcome::Failed(e.to_string());
            }
        };

        if content.trim().is_empty() {
            warn!("Source '{}' returned no content", safe_locator);
            return WorkOutcome::Skipped("source returned no content".to_string());
        }

        let mut report = parse_with_report(&content, source.format, &source.url, source.priority);
        for record in &mut report.records {
            record.url = UrlUtils::resolve_entry(&source.url, &record.url);
        }

        info!(
            "Source '{}' ({}): {} records, {} skipped lines",
            safe_locator,
            report.format,
            report.records.len(),
            report.skipped.len()
        );
        WorkOutcome::Success(report)
    }
}
