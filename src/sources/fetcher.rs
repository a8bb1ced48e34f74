//! HTTP and local-file source fetcher

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::traits::SourceFetcher;
use crate::errors::{SourceError, SourceResult};
use crate::utils::http_client::build_http_client;
use crate::utils::url::UrlUtils;

const UTF8_BOM: char = '\u{feff}';

/// Fetches remote sources with reqwest and local ones with tokio::fs
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    client: Client,
}

impl HttpSourceFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a fetcher with its own client
    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, timeout)?))
    }

    async fn fetch_remote(&self, locator: &str) -> SourceResult<String> {
        let safe_locator = UrlUtils::obfuscate_credentials(locator);
        debug!("Fetching remote source {}", safe_locator);

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| map_request_error(&safe_locator, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                locator: safe_locator,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_request_error(&safe_locator, &e))?;
        Ok(strip_bom(body))
    }

    async fn fetch_local(&self, locator: &str) -> SourceResult<String> {
        let path = Path::new(locator);
        debug!("Reading local source {}", path.display());

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::InvalidLocator {
                locator: locator.to_string(),
            },
            _ => SourceError::unavailable(locator, e.to_string()),
        })?;

        let body = String::from_utf8(bytes).map_err(|e| SourceError::Decode {
            locator: locator.to_string(),
            message: e.to_string(),
        })?;
        Ok(strip_bom(body))
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, locator: &str) -> SourceResult<String> {
        if UrlUtils::is_remote(locator) {
            self.fetch_remote(locator).await
        } else {
            self.fetch_local(locator).await
        }
    }
}

fn map_request_error(safe_locator: &str, error: &reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout {
            locator: safe_locator.to_string(),
        }
    } else if error.is_decode() || error.is_body() {
        SourceError::Decode {
            locator: safe_locator.to_string(),
            message: UrlUtils::obfuscate_credentials(&error.to_string()),
        }
    } else {
        SourceError::unavailable(
            safe_locator,
            UrlUtils::obfuscate_credentials(&error.to_string()),
        )
    }
}

fn strip_bom(body: String) -> String {
    match body.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => body,
    }
}
