//! Deterministic channel fingerprints
//!
//! A fingerprint identifies "the same channel" across sources. The same
//! qualifying fields always produce the same digest, whichever source the
//! record came from and whatever order sources were processed in.

use serde::{Deserialize, Serialize};

use crate::models::ChannelRecord;

/// Which record fields make up a channel's identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintStrategy {
    /// `name|group`
    #[default]
    NameGroup,
    /// `group|name|tvg_id`, keeps same-named channels with different EPG ids apart
    GroupNameTvgId,
}

impl FingerprintStrategy {
    pub fn fingerprint(&self, record: &ChannelRecord) -> String {
        match self {
            FingerprintStrategy::NameGroup => generate_fingerprint(&[&record.name, &record.group]),
            FingerprintStrategy::GroupNameTvgId => {
                generate_fingerprint(&[&record.group, &record.name, &record.tvg_id])
            }
        }
    }
}

/// Lowercase hex MD5 of the parts joined with `|`
///
/// ```rust
/// use m3u_catalog::utils::fingerprint::generate_fingerprint;
///
/// let a = generate_fingerprint(&["CNN", "News"]);
/// assert_eq!(a, generate_fingerprint(&["CNN", "News"]));
/// assert_eq!(a.len(), 32);
/// ```
pub fn generate_fingerprint(parts: &[&str]) -> String {
    let key = parts.join("|");
    format!("{:x}", md5::compute(key.as_bytes()))
}
