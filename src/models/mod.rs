use serde::{Deserialize, Serialize};

pub mod catchup;

pub use catchup::*;

/// Group assigned to entries whose source omits one
pub const DEFAULT_GROUP: &str = "Default";

/// Duration marker for live / unspecified entries
pub const LIVE_DURATION: i64 = -1;

/// One playable entry parsed from a source listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub name: String,
    pub group: String,
    pub tvg_id: String,
    pub logo: String,
    pub url: String,
    /// Seconds, or [`LIVE_DURATION`] for live streams
    pub duration_seconds: i64,
    pub source_id: String,
    /// Higher wins conflicts between sources
    pub priority: i32,
    /// Detection result, attached only when enrichment ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catchup: Option<CatchupReport>,
}

impl ChannelRecord {
    /// Create a record with default metadata for the given source
    pub fn new<N: Into<String>, U: Into<String>>(
        name: N,
        url: U,
        source_id: &str,
        priority: i32,
    ) -> Self {
        Self {
            name: name.into(),
            group: DEFAULT_GROUP.to_string(),
            tvg_id: String::new(),
            logo: String::new(),
            url: url.into(),
            duration_seconds: LIVE_DURATION,
            source_id: source_id.to_string(),
            priority,
            catchup: None,
        }
    }

    pub fn with_group<S: Into<String>>(mut self, group: S) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_tvg_id<S: Into<String>>(mut self, tvg_id: S) -> Self {
        self.tvg_id = tvg_id.into();
        self
    }

    pub fn with_logo<S: Into<String>>(mut self, logo: S) -> Self {
        self.logo = logo.into();
        self
    }

    pub fn with_duration(mut self, duration_seconds: i64) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn is_live(&self) -> bool {
        self.duration_seconds <= 0
    }
}

/// Listing format of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Extended M3U with `#EXTINF` metadata lines
    #[serde(alias = "m3u8")]
    M3u,
    /// `name,#url` per line
    #[serde(alias = "txt")]
    Text,
    /// Sniff the first characters for `#EXTM3U`
    #[default]
    Auto,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::M3u => write!(f, "m3u"),
            SourceFormat::Text => write!(f, "text"),
            SourceFormat::Auto => write!(f, "auto"),
        }
    }
}

/// A configured listing source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Display name used in logs; falls back to the locator
    #[serde(default)]
    pub name: String,
    /// Remote URL or local file path
    pub url: String,
    #[serde(default, alias = "type")]
    pub format: SourceFormat,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    crate::config::defaults::DEFAULT_SOURCE_PRIORITY
}

impl SourceDefinition {
    pub fn new<U: Into<String>>(url: U, format: SourceFormat, priority: i32) -> Self {
        Self {
            name: String::new(),
            url: url.into(),
            format,
            priority,
        }
    }

    /// Name for logging, never empty
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// Result of one independent unit of work (a source fetch, a detection)
#[derive(Debug, Clone, PartialEq)]
pub enum WorkOutcome<T> {
    Success(T),
    /// Intentionally not processed
    Skipped(String),
    /// Attempted and failed; the run carries on without it
    Failed(String),
}

impl<T> WorkOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkOutcome::Success(_))
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            WorkOutcome::Success(value) => Some(value),
            _ => None,
        }
    }
}
