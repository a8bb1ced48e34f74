//! Shared helpers: URL handling, fingerprints, HTTP client setup, playlist checks

pub mod fingerprint;
pub mod http_client;
pub mod url;
pub mod validation;

pub use fingerprint::{generate_fingerprint, FingerprintStrategy};
pub use http_client::{build_http_client, build_non_redirecting_client};
pub use url::UrlUtils;
pub use validation::validate_m3u;
