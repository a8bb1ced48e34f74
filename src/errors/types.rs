//! Error type definitions for the catalog builder
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that keeps fatal and per-unit
//! failures apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::url::UrlUtils;

/// Top-level application error type
///
/// Only configuration problems and output I/O abort a run. Everything that
/// happens to a single source or probe is reported through [`SourceError`]
/// or [`ProbeFailure`] and absorbed by the orchestrator.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Source handling errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Filesystem errors while reading config or writing outputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization failures for reports and config
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Source fetch specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Source could not be reached or read at all
    #[error("Source unavailable: {locator} - {message}")]
    Unavailable { locator: String, message: String },

    /// Network timeout while fetching
    #[error("Connection timeout: {locator}")]
    Timeout { locator: String },

    /// Non-success HTTP status
    #[error("HTTP error: {status} - {locator}")]
    Http { status: u16, locator: String },

    /// Locator is neither a URL nor an existing path
    #[error("Invalid locator: {locator}")]
    InvalidLocator { locator: String },

    /// Body could not be decoded as text
    #[error("Decode error: {locator} - {message}")]
    Decode { locator: String, message: String },
}

/// Why a single catchup probe produced a negative result
///
/// A failure is never fatal. It is kept distinct from a rejected probe
/// (the server answered, just not with what we wanted) so that callers can
/// tell a timeout from a 404.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// Probe exceeded its timeout
    #[error("probe timed out")]
    Timeout,

    /// TCP/TLS connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other request-level failure (invalid URL, protocol error)
    #[error("request failed: {0}")]
    Request(String),

    /// Response headers arrived but the body could not be read
    #[error("body read failed: {0}")]
    Body(String),
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create an unavailable error
    pub fn unavailable<L: Into<String>, M: Into<String>>(locator: L, message: M) -> Self {
        Self::Unavailable {
            locator: locator.into(),
            message: message.into(),
        }
    }
}

impl ProbeFailure {
    /// Classify a reqwest error into a probe failure
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let message = UrlUtils::obfuscate_credentials(&error.to_string());
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(message)
        } else if error.is_body() || error.is_decode() {
            Self::Body(message)
        } else {
            Self::Request(message)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(error: toml::de::Error) -> Self {
        Self::configuration(error.to_string())
    }
}
