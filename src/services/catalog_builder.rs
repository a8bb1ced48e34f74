//! End-to-end catalog build
//!
//! fetch → parse → merge → (detect) → inject. Every per-source and per-URL
//! failure is absorbed here and only shows up in the summary counts.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::catchup_detector::{CatchupDetector, DetectorSettings};
use super::channel_merger::{ChannelCatalog, ChannelMerger, MergeStats};
use super::probe_client::{HttpProbeClient, ProbeClient};
use crate::config::Config;
use crate::errors::AppResult;
use crate::ingestor::IngestorService;
use crate::models::{CatchupReport, ChannelRecord, WorkOutcome};
use crate::sources::{HttpSourceFetcher, SourceFetcher};
use crate::utils::url::UrlUtils;

/// Per-source tallies of one build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceTally {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub parse_skips: usize,
    pub records: usize,
}

#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub catalog: ChannelCatalog,
    pub sources: SourceTally,
    /// Present only when detection ran
    pub reports: Option<HashMap<String, CatchupReport>>,
}

impl BuildSummary {
    pub fn merge_stats(&self) -> MergeStats {
        self.catalog.stats()
    }
}

pub struct CatalogBuilder {
    config: Config,
    ingestor: IngestorService,
    detector: CatchupDetector,
}

impl CatalogBuilder {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn SourceFetcher>,
        probe_client: Arc<dyn ProbeClient>,
    ) -> Self {
        let ingestor = IngestorService::new(fetcher, config.performance.threads);
        let detector = CatchupDetector::new(probe_client, DetectorSettings::from(&config.detection));
        Self {
            config,
            ingestor,
            detector,
        }
    }

    /// Builder backed by reqwest clients configured from `config`
    pub fn from_config(config: Config) -> AppResult<Self> {
        let fetcher = HttpSourceFetcher::with_settings(
            &config.performance.user_agent,
            config.performance.timeout,
        )?;
        let probe_client = HttpProbeClient::with_settings(
            &config.performance.user_agent,
            config.detection.timeout,
        )?;
        Ok(Self::new(config, Arc::new(fetcher), Arc::new(probe_client)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn build(&self) -> BuildSummary {
        let (records, tally) = self.collect_records().await;
        if tally.succeeded == 0 {
            warn!("No source produced any channels");
        }

        let merger = ChannelMerger::new(self.config.merge.fingerprint, self.config.merge.tie_break);
        let mut catalog = merger.merge(records, &self.config.filters);

        let reports = if self.config.detection.enable {
            let reports = self
                .detector
                .detect_all(catalog.distinct_urls(), self.config.detection.workers)
                .await;
            catalog.attach_reports(&reports);
            Some(reports)
        } else {
            None
        };

        let injected = catalog.inject_catchup(&self.config.catchup);

        let stats = catalog.stats();
        info!(
            "Merged {} records into {} channels ({} replaced, {} discarded as duplicates)",
            stats.input,
            catalog.len(),
            stats.replaced,
            stats.discarded
        );
        info!(
            "Filtered {} incomplete, {} too short, {} by extension; catchup injected into {} URLs",
            stats.filtered_incomplete, stats.filtered_duration, stats.filtered_extension, injected
        );

        BuildSummary {
            catalog,
            sources: tally,
            reports,
        }
    }

    async fn collect_records(&self) -> (Vec<ChannelRecord>, SourceTally) {
        let mut tally = SourceTally::default();
        let mut records = Vec::new();

        for ingestion in self.ingestor.ingest_all(&self.config.sources).await {
            match ingestion.outcome {
                WorkOutcome::Success(report) => {
                    tally.succeeded += 1;
                    tally.parse_skips += report.skipped.len();
                    tally.records += report.records.len();
                    records.extend(report.records);
                }
                WorkOutcome::Skipped(reason) => {
                    tally.skipped += 1;
                    info!(
                        "Skipped source '{}': {}",
                        UrlUtils::obfuscate_credentials(ingestion.source.display_name()),
                        reason
                    );
                }
                WorkOutcome::Failed(_) => tally.failed += 1,
            }
        }

        info!(
            "Sources: {} succeeded, {} skipped, {} failed; {} records, {} unparseable lines",
            tally.succeeded, tally.skipped, tally.failed, tally.records, tally.parse_skips
        );
        (records, tally)
    }
}
