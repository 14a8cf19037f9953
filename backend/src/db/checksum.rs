//! Checksum calculation for feed change detection.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of a raw feed body.
///
/// Stands in for `meta.generated_at` when a feed does not carry one.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    let result = hasher.finalize();
    hex::encode(result)
}
