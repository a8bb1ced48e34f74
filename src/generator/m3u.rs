use chrono::{DateTime, Local};

use super::{attribute_value, single_line, PlaylistGenerator};
use crate::config::CatchupInjectionConfig;
use crate::models::ChannelRecord;
use crate::utils::url::UrlUtils;

const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
enum Variant {
    /// Bare header, static catchup query appended per entry
    Restricted { catchup: Vec<(String, String)> },
    /// EPG header and generation comment, URLs untouched
    Full {
        epg_url: String,
        catchup_enabled: bool,
        generated_at: DateTime<Local>,
    },
}

/// Extended M3U playlist renderer
#[derive(Debug, Clone)]
pub struct M3uGenerator {
    variant: Variant,
}

impl M3uGenerator {
    /// Player-restricted playlist, `#EXTM3U` header only
    ///
    /// When `catchup` is active its template is added to every URL with the
    /// query-preserving rule; an unparseable template is ignored.
    pub fn restricted(catchup: &CatchupInjectionConfig) -> Self {
        let pairs = if catchup.is_active() {
            UrlUtils::parse_query_template(&catchup.template).unwrap_or_default()
        } else {
            Vec::new()
        };
        Self {
            variant: Variant::Restricted { catchup: pairs },
        }
    }

    /// Full playlist advertising `epg_url`, generated now
    pub fn full<S: Into<String>>(epg_url: S, catchup_enabled: bool) -> Self {
        Self::full_at(epg_url, catchup_enabled, Local::now())
    }

    pub fn full_at<S: Into<String>>(
        epg_url: S,
        catchup_enabled: bool,
        generated_at: DateTime<Local>,
    ) -> Self {
        Self {
            variant: Variant::Full {
                epg_url: epg_url.into(),
                catchup_enabled,
                generated_at,
            },
        }
    }

    fn header(&self) -> String {
        match &self.variant {
            Variant::Restricted { .. } => "#EXTM3U\n".to_string(),
            Variant::Full {
                epg_url,
                catchup_enabled,
                generated_at,
            } => format!(
                "#EXTM3U x-tvg-url=\"{}\"\n# Generated on {}\n# Catchup: {}\n",
                attribute_value(epg_url),
                generated_at.format(GENERATED_AT_FORMAT),
                if *catchup_enabled { "Enabled" } else { "Disabled" }
            ),
        }
    }

    fn entry_url(&self, record: &ChannelRecord) -> String {
        match &self.variant {
            Variant::Restricted { catchup } if !catchup.is_empty() => {
                UrlUtils::apply_query_template(&record.url, catchup)
            }
            _ => record.url.clone(),
        }
    }
}

impl PlaylistGenerator for M3uGenerator {
    fn generate(&self, records: &[ChannelRecord]) -> String {
        let mut m3u = self.header();

        for record in records {
            let extinf = format!(
                "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}\n",
                attribute_value(&record.tvg_id),
                attribute_value(&record.name),
                attribute_value(&record.logo),
                attribute_value(&record.group),
                single_line(&record.name)
            );
            m3u.push_str(&extinf);
            m3u.push_str(&single_line(&self.entry_url(record)));
            m3u.push('\n');
        }

        m3u
    }
}
