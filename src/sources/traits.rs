//! Source fetcher trait definitions

use async_trait::async_trait;

use crate::errors::SourceResult;

/// Retrieves the raw text of a listing source
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the full body behind `locator`
    ///
    /// Fails when the locator cannot be read, times out or answers with a
    /// non-success status. Never retries.
    async fn fetch(&self, locator: &str) -> SourceResult<String>;
}
