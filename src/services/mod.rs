pub mod catalog_builder;
pub mod catchup_detector;
pub mod channel_merger;
pub mod probe_client;

pub use catalog_builder::{BuildSummary, CatalogBuilder, SourceTally};
pub use catchup_detector::{CatchupDetector, DetectorSettings};
pub use channel_merger::{ChannelCatalog, ChannelMerger, MergeStats, TieBreak};
pub use probe_client::{HttpProbeClient, ProbeClient, ProbeResponse, SniffResponse};
