//! Source fetching
//!
//! A source locator is either an http(s) URL or a local file path. Fetching
//! is abstracted behind [`SourceFetcher`] so ingestion can be driven by
//! in-memory fixtures in tests.

pub mod fetcher;
pub mod traits;

pub use fetcher::HttpSourceFetcher;
pub use traits::SourceFetcher;
