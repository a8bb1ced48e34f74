//! Centralized error handling for the catalog builder
//!
//! Errors are split by the layer that produces them so callers can decide
//! which ones abort a run and which ones only skip a single unit of work.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: fatal, raised before any source is touched
//! - **Source Errors**: one source could not be fetched; the run continues
//! - **Probe Failures**: one catchup probe failed; detection continues
//!
//! # Usage
//!
//! ```rust
//! use m3u_catalog::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("no sources configured"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
