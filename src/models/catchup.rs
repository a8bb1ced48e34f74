//! Catchup (time-shift) vocabulary and detection report types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ProbeFailure;

/// Timestamp layout used by `playseek` ranges
pub const UTC_RANGE_FORMAT: &str = "%Y%m%d%H%M%S";

const SECONDS_PER_DAY: u64 = 86_400;

/// Closed set of catchup query templates the detector knows how to synthesize
///
/// Variants are declared in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatchupTemplate {
    #[serde(rename = "playseek={utc}-{utcend}")]
    UtcRange,
    #[serde(rename = "timeshift={sec}")]
    SecondsOffset,
    #[serde(rename = "utc={start}&end={end}")]
    EpochRange,
    #[serde(rename = "dvr={days}")]
    DayCount,
}

impl CatchupTemplate {
    /// Every template, highest priority first
    pub const PRIORITY_ORDER: [CatchupTemplate; 4] = [
        CatchupTemplate::UtcRange,
        CatchupTemplate::SecondsOffset,
        CatchupTemplate::EpochRange,
        CatchupTemplate::DayCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatchupTemplate::UtcRange => "playseek={utc}-{utcend}",
            CatchupTemplate::SecondsOffset => "timeshift={sec}",
            CatchupTemplate::EpochRange => "utc={start}&end={end}",
            CatchupTemplate::DayCount => "dvr={days}",
        }
    }

    /// Bind the template to a concrete look-back window ending at `now`
    pub fn instantiate(&self, days: u32, now: DateTime<Utc>) -> CatchupParams {
        let start = now - Duration::days(i64::from(days));
        match self {
            CatchupTemplate::UtcRange => CatchupParams::UtcRange { start, end: now },
            CatchupTemplate::SecondsOffset => CatchupParams::SecondsOffset {
                seconds: u64::from(days) * SECONDS_PER_DAY,
            },
            CatchupTemplate::EpochRange => CatchupParams::EpochRange {
                start: start.timestamp(),
                end: now.timestamp(),
            },
            CatchupTemplate::DayCount => CatchupParams::DayCount { days },
        }
    }
}

impl std::fmt::Display for CatchupTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CatchupTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatchupTemplate::PRIORITY_ORDER
            .into_iter()
            .find(|template| template.as_str() == s.trim())
            .ok_or_else(|| format!("unknown catchup template '{s}'"))
    }
}

/// A template bound to typed parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchupParams {
    UtcRange { start: DateTime<Utc>, end: DateTime<Utc> },
    SecondsOffset { seconds: u64 },
    EpochRange { start: i64, end: i64 },
    DayCount { days: u32 },
}

impl CatchupParams {
    /// Render as the value carried by the `catchup` query parameter
    pub fn to_query_value(&self) -> String {
        match self {
            CatchupParams::UtcRange { start, end } => format!(
                "playseek={}-{}",
                start.format(UTC_RANGE_FORMAT),
                end.format(UTC_RANGE_FORMAT)
            ),
            CatchupParams::SecondsOffset { seconds } => format!("timeshift={seconds}"),
            CatchupParams::EpochRange { start, end } => format!("utc={start}&end={end}"),
            CatchupParams::DayCount { days } => format!("dvr={days}"),
        }
    }
}

/// Container hint derived from content-type or leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CodecHint {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "HLS")]
    Hls,
    #[serde(rename = "MPEG-TS")]
    MpegTs,
    #[serde(rename = "FLV")]
    Flv,
}

impl std::fmt::Display for CodecHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CodecHint::Unknown => "unknown",
            CodecHint::Hls => "HLS",
            CodecHint::MpegTs => "MPEG-TS",
            CodecHint::Flv => "FLV",
        };
        f.write_str(label)
    }
}

/// Which step of detection a probe belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProbeStage {
    Connectivity,
    LookBack { days: u32 },
    Template { template: CatchupTemplate },
    Sniff,
}

/// What a single probe observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Server answered with what the stage requires
    Accepted { status: u16 },
    /// Server answered, but status or content-type did not qualify
    Rejected {
        status: u16,
        content_type: Option<String>,
    },
    /// No usable answer at all
    Failed { failure: ProbeFailure },
}

impl ProbeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProbeOutcome::Accepted { .. })
    }
}

/// One entry of the detection trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeAttempt {
    #[serde(flatten)]
    pub stage: ProbeStage,
    pub url: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

/// Result of probing one stream URL for catchup support
///
/// Produced once per distinct URL and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatchupReport {
    pub supported: bool,
    /// Largest accepted look-back window, 0 when unsupported
    pub max_days: u32,
    pub recommended_template: Option<CatchupTemplate>,
    pub latency_ms: u64,
    pub codec_hint: CodecHint,
    /// Every probe issued, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<ProbeAttempt>,
}

impl CatchupReport {
    /// Report for a stream that failed the connectivity gate
    pub fn unreachable(attempts: Vec<ProbeAttempt>) -> Self {
        Self {
            attempts,
            ..Self::default()
        }
    }
}
