//! SHA-256 checksums for task plans.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fingerprint an ordered list of task labels.
///
/// Labels are length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn plan_fingerprint<S: AsRef<str>>(labels: &[S]) -> String {
    let mut hasher = Sha256::new();
    for label in labels {
        let label = label.as_ref();
        hasher.update((label.len() as u64).to_le_bytes());
        hasher.update(label.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
