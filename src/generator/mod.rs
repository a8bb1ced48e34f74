//! Output rendering and persistence
//!
//! Generators turn the catalog into playlist text; [`OutputWriter`] puts the
//! three playlist variants and the optional catchup report on disk.

pub mod m3u;
pub mod text;

pub use m3u::M3uGenerator;
pub use text::TextGenerator;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::info;

use crate::config::OutputConfig;
use crate::errors::AppResult;
use crate::models::{CatchupReport, ChannelRecord};

/// Renders a channel sequence as playlist text
pub trait PlaylistGenerator {
    fn generate(&self, records: &[ChannelRecord]) -> String;
}

/// Attribute values cannot carry `"` or line breaks
pub(crate) fn attribute_value(value: &str) -> String {
    single_line(value).replace('"', "'")
}

pub(crate) fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Writes every output file into the configured directory
pub struct OutputWriter<'a> {
    config: &'a OutputConfig,
    catchup_enabled: bool,
}

impl<'a> OutputWriter<'a> {
    /// `catchup_enabled` only feeds the informational header of the full playlist
    pub fn new(config: &'a OutputConfig, catchup_enabled: bool) -> Self {
        Self {
            config,
            catchup_enabled,
        }
    }

    /// Write the restricted, full and text playlists
    pub async fn write_playlists(&self, records: &[ChannelRecord]) -> AppResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.config.directory).await?;

        let outputs = [
            (
                &self.config.restricted_file,
                M3uGenerator::restricted(&self.config.catchup).generate(records),
            ),
            (
                &self.config.full_file,
                M3uGenerator::full(self.config.epg_url.as_str(), self.catchup_enabled)
                    .generate(records),
            ),
            (&self.config.text_file, TextGenerator.generate(records)),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (file_name, content) in outputs {
            let path = self.config.directory.join(file_name);
            tokio::fs::write(&path, content).await?;
            info!("Wrote {} channels to {}", records.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Write detection reports as pretty JSON, sorted by URL
    pub async fn write_catchup_report(
        &self,
        reports: &HashMap<String, CatchupReport>,
    ) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.config.directory).await?;

        let sorted: BTreeMap<&String, &CatchupReport> = reports.iter().collect();
        let json = serde_json::to_string_pretty(&sorted)?;
        let path = self.config.directory.join(&self.config.catchup_report_file);
        tokio::fs::write(&path, json).await?;

        info!("Wrote {} catchup reports to {}", reports.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatchupTemplate, CodecHint};

    fn output_config(dir: &std::path::Path) -> OutputConfig {
        OutputConfig {
            directory: dir.join("out"),
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_attribute_value() {
        assert_eq!(attribute_value("a \"b\"\nc"), "a 'b' c");
    }

    #[tokio::test]
    async fn test_write_playlists_creates_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = output_config(dir.path());
        let records = vec![ChannelRecord::new("CNN", "http://x/cnn.ts", "s", 1)];

        let written = OutputWriter::new(&config, false)
            .write_playlists(&records)
            .await
            .unwrap();

        assert_eq!(written.len(), 3);
        let text = std::fs::read_to_string(dir.path().join("out/simple.txt")).unwrap();
        assert_eq!(text, "CNN,#http://x/cnn.ts\n");
        let restricted = std::fs::read_to_string(dir.path().join("out/tvbox.m3u")).unwrap();
        assert!(restricted.starts_with("#EXTM3U\n#EXTINF:-1"));
        let full = std::fs::read_to_string(dir.path().join("out/full.m3u")).unwrap();
        assert!(full.starts_with("#EXTM3U x-tvg-url=\"\"\n# Generated on "));
    }

    #[tokio::test]
    async fn test_write_catchup_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = output_config(dir.path());
        let mut reports = HashMap::new();
        reports.insert(
            "http://x/a.ts".to_string(),
            CatchupReport {
                supported: true,
                max_days: 3,
                recommended_template: Some(CatchupTemplate::SecondsOffset),
                latency_ms: 5,
                codec_hint: CodecHint::Hls,
                attempts: Vec::new(),
            },
        );

        let path = OutputWriter::new(&config, true)
            .write_catchup_report(&reports)
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["http://x/a.ts"]["max_days"], 3);
        assert_eq!(json["http://x/a.ts"]["recommended_template"], "timeshift={sec}");
    }
}
