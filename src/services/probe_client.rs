//! HTTP probing primitives used by catchup detection

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::trace;

use super::catchup_detector::codec_from_content_type;
use crate::errors::ProbeFailure;
use crate::utils::http_client::{build_http_client, build_non_redirecting_client};
use crate::utils::url::UrlUtils;

/// Status and content-type of a header-only probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// Lowercased, parameters included
    pub content_type: Option<String>,
}

/// Result of a streaming GET that reads only the start of the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// At most `max_bytes` leading body bytes. Empty when the content-type
    /// already names the container or the body did not arrive in time.
    pub prefix: Vec<u8>,
    /// Time until response headers arrived
    pub latency: Duration,
}

/// Network seam for catchup detection
///
/// Every call is bounded by `timeout`; expiry is reported as
/// [`ProbeFailure::Timeout`] and never as an error of the caller.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    async fn head(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, ProbeFailure>;

    /// HEAD that reports a redirect as its own status instead of following it
    async fn head_without_redirects(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeFailure> {
        self.head(url, timeout).await
    }

    /// GET that stops once the headers are known, reading body bytes only
    /// when the content-type does not name the container
    async fn sniff(
        &self,
        url: &str,
        max_bytes: usize,
        timeout: Duration,
    ) -> Result<SniffResponse, ProbeFailure>;
}

/// reqwest-backed probe client
#[derive(Debug, Clone)]
pub struct HttpProbeClient {
    client: Client,
    exact_client: Client,
}

impl HttpProbeClient {
    /// `exact_client` must not follow redirects
    pub fn new(client: Client, exact_client: Client) -> Self {
        Self {
            client,
            exact_client,
        }
    }

    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(user_agent, timeout)?,
            build_non_redirecting_client(user_agent, timeout)?,
        ))
    }

    async fn send_head(
        client: &Client,
        url: &str,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeFailure> {
        let response = client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(&e))?;

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_type: content_type(&response),
        })
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase())
}

/// Fill `prefix` up to `max_bytes`; a broken body ends the read early
async fn read_prefix(response: &mut Response, prefix: &mut Vec<u8>, max_bytes: usize) {
    while prefix.len() < max_bytes {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = (max_bytes - prefix.len()).min(chunk.len());
                prefix.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                trace!("Sniff body read stopped: {}", e);
                break;
            }
        }
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn head(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, ProbeFailure> {
        trace!("HEAD {}", UrlUtils::obfuscate_credentials(url));
        Self::send_head(&self.client, url, timeout).await
    }

    async fn head_without_redirects(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeFailure> {
        trace!("HEAD (no redirects) {}", UrlUtils::obfuscate_credentials(url));
        Self::send_head(&self.exact_client, url, timeout).await
    }

    async fn sniff(
        &self,
        url: &str,
        max_bytes: usize,
        timeout: Duration,
    ) -> Result<SniffResponse, ProbeFailure> {
        trace!("GET (sniff) {}", UrlUtils::obfuscate_credentials(url));

        let started = Instant::now();
        let mut response = tokio::time::timeout(timeout, self.client.get(url).send())
            .await
            .map_err(|_| ProbeFailure::Timeout)?
            .map_err(|e| ProbeFailure::from_reqwest(&e))?;
        let latency = started.elapsed();

        let status = response.status().as_u16();
        let content_type = content_type(&response);

        let mut prefix = Vec::new();
        if codec_from_content_type(content_type.as_deref()).is_none() {
            // A stalled body keeps whatever arrived before the deadline
            let read = read_prefix(&mut response, &mut prefix, max_bytes);
            let timed_out = tokio::time::timeout(timeout, read).await.is_err();
            if timed_out {
                trace!("Sniff body timed out after {} bytes", prefix.len());
            }
        }

        Ok(SniffResponse {
            status,
            content_type,
            prefix,
            latency,
        })
    }
}
