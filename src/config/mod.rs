use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::models::SourceDefinition;
use crate::services::channel_merger::TieBreak;
use crate::utils::fingerprint::FingerprintStrategy;
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub sources: Vec<SourceDefinition>,
    #[serde(default)]
    pub filters: FilterConfig,
    /// Static catchup injection applied by the merge engine
    #[serde(default)]
    pub catchup: CatchupInjectionConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Per-request timeout for source fetches
    #[serde(default = "default_timeout", with = "duration_serde::duration")]
    pub timeout: Duration,
    /// Worker pool size for source fetches
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Inclusion filters applied after conflict resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Finite entries shorter than this are dropped; 0 disables the check
    #[serde(default = "default_min_duration", alias = "min_duration")]
    pub min_duration_seconds: i64,
    /// Lowercased URL must end with one of these, compared as written.
    /// `None` disables the check; an empty list drops every record.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Option<Vec<String>>,
}

/// A static catchup template appended to URLs without probing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchupInjectionConfig {
    #[serde(default)]
    pub enable: bool,
    /// Advertised look-back; 0 disables injection
    #[serde(default = "default_catchup_days")]
    pub days: u32,
    /// Query fragment such as `playseek={utc}-{utcend}`, placeholders kept verbatim
    #[serde(default = "default_catchup_template", alias = "format")]
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Probe every distinct catalog URL after merging
    #[serde(default)]
    pub enable: bool,
    /// Timeout for the connectivity, look-back and sniff probes
    #[serde(default = "default_detection_timeout", with = "duration_serde::duration")]
    pub timeout: Duration,
    /// Timeout for template probes
    #[serde(default = "default_template_timeout", with = "duration_serde::duration")]
    pub template_timeout: Duration,
    /// Body prefix inspected when the content-type is inconclusive
    #[serde(default = "default_sniff_bytes")]
    pub sniff_bytes: usize,
    /// Concurrent detections across distinct URLs
    #[serde(default = "default_detection_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub fingerprint: FingerprintStrategy,
    #[serde(default)]
    pub tie_break: TieBreak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// Advertised in the full playlist header
    #[serde(default)]
    pub epg_url: String,
    /// Template appended per entry in the restricted playlist
    #[serde(default)]
    pub catchup: CatchupInjectionConfig,
    #[serde(default = "default_restricted_file")]
    pub restricted_file: String,
    #[serde(default = "default_full_file")]
    pub full_file: String,
    #[serde(default = "default_text_file")]
    pub text_file: String,
    #[serde(default = "default_catchup_report_file")]
    pub catchup_report_file: String,
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_min_duration() -> i64 {
    DEFAULT_MIN_DURATION
}

fn default_allowed_extensions() -> Option<Vec<String>> {
    Some(
        DEFAULT_ALLOWED_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
    )
}

fn default_catchup_days() -> u32 {
    DEFAULT_CATCHUP_DAYS
}

fn default_catchup_template() -> String {
    DEFAULT_CATCHUP_TEMPLATE.to_string()
}

fn default_detection_timeout() -> Duration {
    Duration::from_secs(DEFAULT_DETECTION_TIMEOUT_SECS)
}

fn default_template_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TEMPLATE_TIMEOUT_SECS)
}

fn default_sniff_bytes() -> usize {
    DEFAULT_SNIFF_BYTES
}

fn default_detection_workers() -> usize {
    DEFAULT_DETECTION_WORKERS
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)
}

fn default_restricted_file() -> String {
    DEFAULT_RESTRICTED_FILE.to_string()
}

fn default_full_file() -> String {
    DEFAULT_FULL_FILE.to_string()
}

fn default_text_file() -> String {
    DEFAULT_TEXT_FILE.to_string()
}

fn default_catchup_report_file() -> String {
    DEFAULT_CATCHUP_REPORT_FILE.to_string()
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            threads: default_threads(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_duration_seconds: default_min_duration(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl FilterConfig {
    /// Filters that let every record with a URL through
    pub fn permissive() -> Self {
        Self {
            min_duration_seconds: 0,
            allowed_extensions: None,
        }
    }
}

impl Default for CatchupInjectionConfig {
    fn default() -> Self {
        Self {
            enable: false,
            days: default_catchup_days(),
            template: default_catchup_template(),
        }
    }
}

impl CatchupInjectionConfig {
    /// Injection happens only when enabled with a positive day count
    pub fn is_active(&self) -> bool {
        self.enable && self.days > 0
    }

    fn validate(&self, section: &str) -> AppResult<()> {
        if !self.enable {
            return Ok(());
        }
        UrlUtils::parse_query_template(&self.template)
            .map(|_| ())
            .map_err(|e| AppError::configuration(format!("{section}.template: {e}")))
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enable: false,
            timeout: default_detection_timeout(),
            template_timeout: default_template_timeout(),
            sniff_bytes: default_sniff_bytes(),
            workers: default_detection_workers(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            epg_url: String::new(),
            catchup: CatchupInjectionConfig::default(),
            restricted_file: default_restricted_file(),
            full_file: default_full_file(),
            text_file: default_text_file(),
            catchup_report_file: default_catchup_report_file(),
        }
    }
}

impl Config {
    /// Load from `CONFIG_FILE`, falling back to `config.toml`
    pub fn load() -> AppResult<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Load and validate a TOML file, or JSON when the extension is `.json`
    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> AppResult<Self> {
        let path = config_file.as_ref();
        if !path.exists() {
            return Err(AppError::configuration(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Config = if is_json {
            serde_json::from_str(&contents)
                .map_err(|e| AppError::configuration(format!("{}: {e}", path.display())))?
        } else {
            Self::from_toml_str(&contents)?
        };

        config.validate()?;
        info!(
            "Loaded configuration from {} ({} sources)",
            path.display(),
            config.sources.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Reject configurations that cannot produce a run
    pub fn validate(&self) -> AppResult<()> {
        if self.sources.is_empty() {
            return Err(AppError::configuration("no sources configured"));
        }
        if let Some(index) = self.sources.iter().position(|s| s.url.trim().is_empty()) {
            return Err(AppError::configuration(format!(
                "sources[{index}].url must not be empty"
            )));
        }
        if self.performance.threads == 0 {
            return Err(AppError::configuration(
                "performance.threads must be at least 1",
            ));
        }
        if self.detection.enable && self.detection.workers == 0 {
            return Err(AppError::configuration(
                "detection.workers must be at least 1",
            ));
        }
        self.catchup.validate("catchup")?;
        self.output.catchup.validate("output.catchup")?;

        debug!("Configuration validated");
        Ok(())
    }
}
