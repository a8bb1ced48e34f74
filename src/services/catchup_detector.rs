//! Catchup capability detection
//!
//! Probes one stream URL in four strictly ordered steps:
//!
//! 1. connectivity gate (HEAD must succeed, otherwise stop)
//! 2. look-back search over [`LOOK_BACK_WINDOWS`], largest first
//! 3. template selection over [`CatchupTemplate::PRIORITY_ORDER`] with a
//!    fixed one-day window
//! 4. a streaming GET for latency and a codec hint
//!
//! A failing probe is a negative answer for that probe only.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::probe_client::{ProbeClient, ProbeResponse};
use crate::config::DetectionConfig;
use crate::errors::ProbeFailure;
use crate::models::{
    CatchupReport, CatchupTemplate, CodecHint, ProbeAttempt, ProbeOutcome, ProbeStage,
};
use crate::utils::url::UrlUtils;

/// Candidate look-back windows in days, tried in this order
pub const LOOK_BACK_WINDOWS: [u32; 5] = [30, 15, 7, 3, 1];

/// Window used when comparing templates
pub const TEMPLATE_TEST_DAYS: u32 = 1;

/// Template used to build look-back probes
const LOOK_BACK_TEMPLATE: CatchupTemplate = CatchupTemplate::UtcRange;

const PLAYABLE_CONTENT_TYPES: [&str; 2] = ["video/", "application/vnd.apple.mpegurl"];
const MPEG_TS_SYNC_BYTE: u8 = 0x47;
const MPEG_PS_START_CODE: [u8; 4] = [0x00, 0x00, 0x01, 0xBA];
const HLS_MARKER: &[u8] = b"#EXTM3U";

/// Timeouts and limits for one detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSettings {
    pub timeout: Duration,
    pub template_timeout: Duration,
    pub sniff_bytes: usize,
}

impl From<&DetectionConfig> for DetectorSettings {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            timeout: config.timeout,
            template_timeout: config.template_timeout,
            sniff_bytes: config.sniff_bytes,
        }
    }
}

pub struct CatchupDetector {
    client: Arc<dyn ProbeClient>,
    settings: DetectorSettings,
}

impl CatchupDetector {
    pub fn new(client: Arc<dyn ProbeClient>, settings: DetectorSettings) -> Self {
        Self { client, settings }
    }

    /// Detect catchup support for `url` using the current time
    pub async fn detect(&self, url: &str) -> CatchupReport {
        self.detect_at(url, Utc::now()).await
    }

    /// Detect catchup support with all time windows ending at `now`
    pub async fn detect_at(&self, url: &str, now: DateTime<Utc>) -> CatchupReport {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        let mut attempts = Vec::new();

        let gate = self.client.head(url, self.settings.timeout).await;
        let gate_outcome = outcome(&gate, |response| is_success(response.status));
        let reachable = gate_outcome.is_accepted();
        attempts.push(ProbeAttempt {
            stage: ProbeStage::Connectivity,
            url: url.to_string(),
            outcome: gate_outcome,
        });
        if !reachable {
            debug!("Catchup detection: {} is unreachable", safe_url);
            return CatchupReport::unreachable(attempts);
        }

        let mut report = CatchupReport::default();

        for days in LOOK_BACK_WINDOWS {
            let probe_url = UrlUtils::catchup_probe_url(url, &LOOK_BACK_TEMPLATE.instantiate(days, now));
            let result = self.client.head(&probe_url, self.settings.timeout).await;
            let probe_outcome = outcome(&result, |response| {
                response.status == 200 && is_playable(response.content_type.as_deref())
            });
            let accepted = probe_outcome.is_accepted();
            attempts.push(ProbeAttempt {
                stage: ProbeStage::LookBack { days },
                url: probe_url,
                outcome: probe_outcome,
            });
            if accepted {
                report.supported = true;
                report.max_days = days;
                break;
            }
        }

        for template in CatchupTemplate::PRIORITY_ORDER {
            let probe_url =
                UrlUtils::catchup_probe_url(url, &template.instantiate(TEMPLATE_TEST_DAYS, now));
            let result = self
                .client
                .head_without_redirects(&probe_url, self.settings.template_timeout)
                .await;
            let probe_outcome = outcome(&result, |response| response.status == 200);
            let accepted = probe_outcome.is_accepted();
            attempts.push(ProbeAttempt {
                stage: ProbeStage::Template { template },
                url: probe_url,
                outcome: probe_outcome,
            });
            if accepted {
                report.recommended_template = Some(template);
                break;
            }
        }

        match self
            .client
            .sniff(url, self.settings.sniff_bytes, self.settings.timeout)
            .await
        {
            Ok(sniff) => {
                report.latency_ms = u64::try_from(sniff.latency.as_millis()).unwrap_or(u64::MAX);
                report.codec_hint = classify_codec(sniff.content_type.as_deref(), &sniff.prefix);
                let sniff_outcome = if is_success(sniff.status) {
                    ProbeOutcome::Accepted {
                        status: sniff.status,
                    }
                } else {
                    ProbeOutcome::Rejected {
                        status: sniff.status,
                        content_type: sniff.content_type,
                    }
                };
                attempts.push(ProbeAttempt {
                    stage: ProbeStage::Sniff,
                    url: url.to_string(),
                    outcome: sniff_outcome,
                });
            }
            Err(failure) => attempts.push(ProbeAttempt {
                stage: ProbeStage::Sniff,
                url: url.to_string(),
                outcome: ProbeOutcome::Failed { failure },
            }),
        }

        debug!(
            "Catchup detection for {}: supported={} max_days={} template={:?} codec={}",
            safe_url,
            report.supported,
            report.max_days,
            report.recommended_template.map(|t| t.as_str()),
            report.codec_hint
        );

        report.attempts = attempts;
        report
    }

    /// Detect every URL once, `workers` URLs at a time
    ///
    /// Duplicate URLs are probed once. Completion order is irrelevant; the
    /// result is keyed by URL.
    pub async fn detect_all<I>(&self, urls: I, workers: usize) -> HashMap<String, CatchupReport>
    where
        I: IntoIterator<Item = String>,
    {
        let mut distinct: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for url in urls {
            if seen.insert(url.clone()) {
                distinct.push(url);
            }
        }

        info!(
            "Running catchup detection for {} URLs with {} workers",
            distinct.len(),
            workers.max(1)
        );

        let reports: HashMap<String, CatchupReport> = stream::iter(distinct)
            .map(|url| async move {
                let report = self.detect(&url).await;
                (url, report)
            })
            .buffer_unordered(workers.max(1))
            .collect()
            .await;

        let supported = reports.values().filter(|r| r.supported).count();
        let unreachable = reports
            .values()
            .filter(|r| {
                r.attempts
                    .first()
                    .is_some_and(|attempt| !attempt.outcome.is_accepted())
            })
            .count();
        info!(
            "Catchup detection finished: {} supported, {} unreachable, {} total",
            supported,
            unreachable,
            reports.len()
        );
        reports
    }
}

fn outcome<F>(result: &Result<ProbeResponse, ProbeFailure>, accept: F) -> ProbeOutcome
where
    F: FnOnce(&ProbeResponse) -> bool,
{
    match result {
        Ok(response) if accept(response) => ProbeOutcome::Accepted {
            status: response.status,
        },
        Ok(response) => ProbeOutcome::Rejected {
            status: response.status,
            content_type: response.content_type.clone(),
        },
        Err(failure) => ProbeOutcome::Failed {
            failure: failure.clone(),
        },
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn is_playable(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let ct = ct.trim().to_ascii_lowercase();
        PLAYABLE_CONTENT_TYPES
            .iter()
            .any(|prefix| ct.starts_with(prefix))
    })
}

/// Container named by the content-type, if any
pub fn codec_from_content_type(content_type: Option<&str>) -> Option<CodecHint> {
    let ct = content_type?.to_ascii_lowercase();
    if ct.contains("mpegurl") {
        Some(CodecHint::Hls)
    } else if ct.contains("mp2t") {
        Some(CodecHint::MpegTs)
    } else if ct.contains("flv") {
        Some(CodecHint::Flv)
    } else {
        None
    }
}

/// Container hint from the content-type, falling back to the body prefix
pub fn classify_codec(content_type: Option<&str>, prefix: &[u8]) -> CodecHint {
    if let Some(codec) = codec_from_content_type(content_type) {
        return codec;
    }

    if prefix
        .windows(HLS_MARKER.len())
        .any(|window| window == HLS_MARKER)
    {
        CodecHint::Hls
    } else if prefix.first() == Some(&MPEG_TS_SYNC_BYTE) || prefix.starts_with(&MPEG_PS_START_CODE) {
        CodecHint::MpegTs
    } else {
        CodecHint::Unknown
    }
}
