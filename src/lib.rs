//! Channel listing ingestion for IPTV playlists
//!
//! Fetches M3U and plain-text listings from many sources, merges them into
//! one deduplicated catalog and optionally probes every stream for catchup
//! (time-shift) support.

pub mod config;
pub mod errors;
pub mod generator;
pub mod ingestor;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;
