//! Channel merge engine
//!
//! Collapses records from every source into one entry per channel
//! fingerprint, then filters and optionally injects a static catchup
//! template. The fingerprint table is owned by a single merge call and handed
//! back as an immutable [`ChannelCatalog`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::config::{CatchupInjectionConfig, FilterConfig};
use crate::models::{CatchupReport, ChannelRecord};
use crate::utils::fingerprint::FingerprintStrategy;
use crate::utils::url::UrlUtils;

/// How to choose between two records with the same fingerprint and priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The record with the longer URL replaces the current one
    #[default]
    LongerUrl,
    /// The record seen first is kept
    FirstSeen,
}

impl TieBreak {
    /// Whether `candidate` should replace `incumbent` at equal priority
    fn prefers(&self, candidate: &ChannelRecord, incumbent: &ChannelRecord) -> bool {
        match self {
            TieBreak::LongerUrl => candidate.url.chars().count() > incumbent.url.chars().count(),
            TieBreak::FirstSeen => false,
        }
    }
}

/// What happened to the records fed into a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub input: usize,
    /// Records that displaced an earlier record with the same fingerprint
    pub replaced: usize,
    /// Records that lost against the record already in the table
    pub discarded: usize,
    pub filtered_incomplete: usize,
    pub filtered_duration: usize,
    pub filtered_extension: usize,
    pub injected: usize,
}

/// Fingerprint-keyed best-record table
///
/// Each fingerprint keeps the slot it was first inserted at, so replacing a
/// record never changes catalog order.
#[derive(Debug, Default)]
pub struct FingerprintTable {
    slots: HashMap<String, usize>,
    entries: Vec<(String, ChannelRecord)>,
}

/// Outcome of offering one record to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Inserted,
    Replaced,
    Discarded,
}

impl FingerprintTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, fingerprint: String, record: ChannelRecord, tie_break: TieBreak) -> Offer {
        match self.slots.get(&fingerprint) {
            Some(&slot) => {
                let incumbent = &self.entries[slot].1;
                let wins = record.priority > incumbent.priority
                    || (record.priority == incumbent.priority && tie_break.prefers(&record, incumbent));
                if wins {
                    self.entries[slot].1 = record;
                    Offer::Replaced
                } else {
                    Offer::Discarded
                }
            }
            None => {
                self.slots.insert(fingerprint.clone(), self.entries.len());
                self.entries.push((fingerprint, record));
                Offer::Inserted
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_entries(self) -> Vec<(String, ChannelRecord)> {
        self.entries
    }
}

/// Deduplicated channel catalog, in first-insertion order
#[derive(Debug, Clone, Default)]
pub struct ChannelCatalog {
    entries: Vec<(String, ChannelRecord)>,
    stats: MergeStats,
}

impl ChannelCatalog {
    pub fn records(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.entries.iter().map(|(_, record)| record)
    }

    pub fn into_records(self) -> Vec<ChannelRecord> {
        self.entries.into_iter().map(|(_, record)| record).collect()
    }

    pub fn get(&self, fingerprint: &str) -> Option<&ChannelRecord> {
        self.entries
            .iter()
            .find(|(fp, _)| fp == fingerprint)
            .map(|(_, record)| record)
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(fp, _)| fp.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Distinct stream URLs, first occurrence order
    pub fn distinct_urls(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.records()
            .filter(|record| seen.insert(record.url.as_str()))
            .map(|record| record.url.clone())
            .collect()
    }

    /// Attach detection reports by URL; records without a report are untouched
    pub fn attach_reports(&mut self, reports: &HashMap<String, CatchupReport>) {
        for (_, record) in &mut self.entries {
            if let Some(report) = reports.get(&record.url) {
                record.catchup = Some(report.clone());
            }
        }
    }

    /// Append the configured template to every URL, placeholders kept verbatim
    ///
    /// Returns the number of rewritten URLs. Inactive or malformed
    /// configurations leave the catalog untouched.
    pub fn inject_catchup(&mut self, injection: &CatchupInjectionConfig) -> usize {
        if !injection.is_active() {
            return 0;
        }
        let pairs = match UrlUtils::parse_query_template(&injection.template) {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!("Skipping catchup injection: {}", e);
                return 0;
            }
        };

        for (_, record) in &mut self.entries {
            record.url = UrlUtils::apply_query_template(&record.url, &pairs);
        }
        self.stats.injected = self.entries.len();
        self.entries.len()
    }
}

/// Merges parsed records into a [`ChannelCatalog`]
#[derive(Debug, Clone, Default)]
pub struct ChannelMerger {
    strategy: FingerprintStrategy,
    tie_break: TieBreak,
    injection: Option<CatchupInjectionConfig>,
}

impl ChannelMerger {
    pub fn new(strategy: FingerprintStrategy, tie_break: TieBreak) -> Self {
        Self {
            strategy,
            tie_break,
            injection: None,
        }
    }

    /// Inject a static catchup template into every surviving URL
    pub fn with_injection(mut self, injection: CatchupInjectionConfig) -> Self {
        self.injection = Some(injection);
        self
    }

    /// Fingerprint, resolve conflicts, filter, then inject
    pub fn merge<I>(&self, records: I, filters: &FilterConfig) -> ChannelCatalog
    where
        I: IntoIterator<Item = ChannelRecord>,
    {
        let mut stats = MergeStats::default();
        let mut table = FingerprintTable::new();

        for record in records {
            stats.input += 1;
            let fingerprint = self.strategy.fingerprint(&record);
            match table.offer(fingerprint, record, self.tie_break) {
                Offer::Inserted => {}
                Offer::Replaced => stats.replaced += 1,
                Offer::Discarded => stats.discarded += 1,
            }
        }

        let entries = table
            .into_entries()
            .into_iter()
            .filter(|(_, record)| match rejection(record, filters) {
                Some(Rejection::Incomplete) => {
                    stats.filtered_incomplete += 1;
                    false
                }
                Some(Rejection::Duration) => {
                    stats.filtered_duration += 1;
                    false
                }
                Some(Rejection::Extension) => {
                    stats.filtered_extension += 1;
                    false
                }
                None => true,
            })
            .collect();

        let mut catalog = ChannelCatalog { entries, stats };
        if let Some(injection) = &self.injection {
            catalog.inject_catchup(injection);
        }
        catalog
    }
}

enum Rejection {
    Incomplete,
    Duration,
    Extension,
}

fn rejection(record: &ChannelRecord, filters: &FilterConfig) -> Option<Rejection> {
    if record.name.trim().is_empty() || record.url.trim().is_empty() {
        return Some(Rejection::Incomplete);
    }
    if filters.min_duration_seconds > 0
        && !record.is_live()
        && record.duration_seconds < filters.min_duration_seconds
    {
        return Some(Rejection::Duration);
    }
    if let Some(extensions) = &filters.allowed_extensions {
        if !UrlUtils::has_allowed_extension(&record.url, extensions) {
            return Some(Rejection::Extension);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(name: &str, url: &str, priority: i32) -> ChannelRecord {
        ChannelRecord::new(name, url, "src", priority).with_group("News")
    }

    fn merger() -> ChannelMerger {
        ChannelMerger::default()
    }

    fn urls(catalog: &ChannelCatalog) -> Vec<&str> {
        catalog.records().map(|r| r.url.as_str()).collect()
    }

    #[test]
    fn test_higher_priority_wins_regardless_of_order() {
        let low = record("CNN", "http://a/cnn-long-url.m3u8", 10);
        let high = record("CNN", "http://b/cnn.m3u8", 90);

        for input in [vec![low.clone(), high.clone()], vec![high.clone(), low.clone()]] {
            let catalog = merger().merge(input, &FilterConfig::permissive());
            assert_eq!(urls(&catalog), vec!["http://b/cnn.m3u8"]);
        }
    }

    #[test]
    fn test_priority_tie_prefers_longer_url() {
        let catalog = merger().merge(
            vec![
                record("CNN", "http://a/c.ts", 50),
                record("CNN", "http://a/cnn-hd.ts", 50),
                record("CNN", "http://a/cn.ts", 50),
            ],
            &FilterConfig::permissive(),
        );
        assert_eq!(urls(&catalog), vec!["http://a/cnn-hd.ts"]);
        assert_eq!(catalog.stats().replaced, 1);
        assert_eq!(catalog.stats().discarded, 1);
    }

    #[test]
    fn test_equal_length_tie_keeps_first_seen() {
        let catalog = merger().merge(
            vec![record("CNN", "http://a/1.ts", 50), record("CNN", "http://a/2.ts", 50)],
            &FilterConfig::permissive(),
        );
        assert_eq!(urls(&catalog), vec!["http://a/1.ts"]);
    }

    #[test]
    fn test_first_seen_tie_break_ignores_url_length() {
        let catalog = ChannelMerger::new(FingerprintStrategy::NameGroup, TieBreak::FirstSeen).merge(
            vec![record("CNN", "http://a/c.ts", 50), record("CNN", "http://a/cnn-hd.ts", 50)],
            &FilterConfig::permissive(),
        );
        assert_eq!(urls(&catalog), vec!["http://a/c.ts"]);
    }

    #[test]
    fn test_replacement_keeps_first_insertion_slot() {
        let catalog = merger().merge(
            vec![
                record("A", "http://x/a1.ts", 1),
                record("B", "http://x/b.ts", 1),
                record("A", "http://x/a2.ts", 99),
            ],
            &FilterConfig::permissive(),
        );
        assert_eq!(urls(&catalog), vec!["http://x/a2.ts", "http://x/b.ts"]);

        let fingerprint = FingerprintStrategy::NameGroup.fingerprint(&record("A", "", 0));
        assert_eq!(
            catalog.get(&fingerprint).map(|r| r.url.as_str()),
            Some("http://x/a2.ts")
        );
        assert_eq!(catalog.fingerprints().next(), Some(fingerprint.as_str()));
    }

    #[test]
    fn test_table_tracks_distinct_fingerprints() {
        let mut table = FingerprintTable::new();
        assert!(table.is_empty());
        assert_eq!(
            table.offer("fp".to_string(), record("A", "http://x/a.ts", 5), TieBreak::LongerUrl),
            Offer::Inserted
        );
        assert_eq!(
            table.offer("fp".to_string(), record("A", "http://x/a.ts", 1), TieBreak::LongerUrl),
            Offer::Discarded
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_same_name_different_group_are_distinct() {
        let catalog = merger().merge(
            vec![
                record("CNN", "http://x/a.ts", 1),
                record("CNN", "http://x/b.ts", 1).with_group("Intl"),
            ],
            &FilterConfig::permissive(),
        );
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![
            record("A", "http://x/a.ts", 10),
            record("B", "http://x/b.ts", 20),
            record("A", "http://x/a-better.ts", 10),
        ];
        let once = merger().merge(input, &FilterConfig::default());
        let first: Vec<ChannelRecord> = once.records().cloned().collect();
        let twice = merger().merge(first.clone(), &FilterConfig::default());
        let second: Vec<ChannelRecord> = twice.into_records();
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(5, 10, false)]
    #[case(-1, 10, true)]
    #[case(0, 10, true)]
    #[case(10, 10, true)]
    #[case(5, 0, true)]
    fn test_duration_filter(#[case] duration: i64, #[case] min: i64, #[case] kept: bool) {
        let filters = FilterConfig {
            min_duration_seconds: min,
            allowed_extensions: None,
        };
        let catalog = merger().merge(
            vec![record("Clip", "http://x/clip.mp4", 1).with_duration(duration)],
            &filters,
        );
        assert_eq!(catalog.len() == 1, kept);
    }

    #[rstest]
    #[case("http://x/a.ts", true)]
    #[case("http://x/A.TS", true)]
    #[case("http://x/a.mp4", false)]
    #[case("http://x/a.ts?token=1", false)]
    fn test_extension_filter(#[case] url: &str, #[case] kept: bool) {
        let filters = FilterConfig {
            min_duration_seconds: 0,
            allowed_extensions: Some(vec![".ts".to_string()]),
        };
        let catalog = merger().merge(vec![record("A", url, 1)], &filters);
        assert_eq!(catalog.len() == 1, kept);
    }

    #[test]
    fn test_empty_extension_list_drops_everything() {
        let filters = FilterConfig {
            min_duration_seconds: 0,
            allowed_extensions: Some(Vec::new()),
        };
        let catalog = merger().merge(vec![record("A", "http://x/a.mp4", 1)], &filters);
        assert!(catalog.is_empty());
        assert_eq!(catalog.stats().filtered_extension, 1);

        let unfiltered = merger().merge(vec![record("A", "http://x/a.mp4", 1)], &FilterConfig::permissive());
        assert_eq!(unfiltered.len(), 1);
    }

    #[test]
    fn test_filter_runs_after_conflict_resolution() {
        let filters = FilterConfig {
            min_duration_seconds: 0,
            allowed_extensions: Some(vec![".ts".to_string()]),
        };
        let catalog = merger().merge(
            vec![record("A", "http://x/a.ts", 1), record("A", "http://x/a.mp4", 99)],
            &filters,
        );
        assert!(catalog.is_empty());
        assert_eq!(catalog.stats().filtered_extension, 1);
    }

    #[test]
    fn test_incomplete_records_are_dropped() {
        let catalog = merger().merge(
            vec![record("", "http://x/a.ts", 1), record("B", "", 1)],
            &FilterConfig::permissive(),
        );
        assert!(catalog.is_empty());
        assert_eq!(catalog.stats().filtered_incomplete, 2);
    }

    #[test]
    fn test_static_injection_preserves_query_and_placeholders() {
        let injection = CatchupInjectionConfig {
            enable: true,
            days: 3,
            template: "playseek={utc}-{utcend}".to_string(),
        };
        let catalog = merger().with_injection(injection).merge(
            vec![record("A", "http://x/a.m3u8?token=abc", 1)],
            &FilterConfig::permissive(),
        );
        assert_eq!(
            urls(&catalog),
            vec!["http://x/a.m3u8?token=abc&playseek={utc}-{utcend}"]
        );
        assert_eq!(catalog.stats().injected, 1);
    }

    #[test]
    fn test_injection_skipped_when_inactive() {
        let injection = CatchupInjectionConfig {
            enable: true,
            days: 0,
            template: "dvr={days}".to_string(),
        };
        let catalog = merger()
            .with_injection(injection)
            .merge(vec![record("A", "http://x/a.ts", 1)], &FilterConfig::permissive());
        assert_eq!(urls(&catalog), vec!["http://x/a.ts"]);
    }

    #[test]
    fn test_attach_reports_by_url() {
        let mut catalog = merger().merge(
            vec![record("A", "http://x/a.ts", 1), record("B", "http://x/b.ts", 1)],
            &FilterConfig::permissive(),
        );
        let mut reports = HashMap::new();
        reports.insert(
            "http://x/a.ts".to_string(),
            CatchupReport {
                supported: true,
                max_days: 7,
                ..CatchupReport::default()
            },
        );
        catalog.attach_reports(&reports);

        let records: Vec<&ChannelRecord> = catalog.records().collect();
        assert_eq!(records[0].catchup.as_ref().map(|r| r.max_days), Some(7));
        assert!(records[1].catchup.is_none());
    }

    #[test]
    fn test_distinct_urls() {
        let catalog = merger().merge(
            vec![
                record("A", "http://x/same.ts", 1),
                record("B", "http://x/same.ts", 1),
                record("C", "http://x/c.ts", 1),
            ],
            &FilterConfig::permissive(),
        );
        assert_eq!(catalog.distinct_urls(), vec!["http://x/same.ts", "http://x/c.ts"]);
    }
}
