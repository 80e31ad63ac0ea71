//! Shared-secret digest authentication for inbound batches.
//!
//! The accepted digest is the lowercase-hex SHA-256 of the byte
//! concatenation `secret || deduplicationId`. Comparison is exact and
//! case-sensitive: a correct digest in uppercase is rejected.

use sha2::{Digest, Sha256};

/// Computes the expected digest for a batch with the given deduplication id.
#[must_use]
pub fn batch_digest(secret: &str, deduplication_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(deduplication_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Returns `true` if `presented` matches the expected digest exactly.
#[must_use]
pub fn verify_digest(secret: &str, deduplication_id: &str, presented: &str) -> bool {
    batch_digest(secret, deduplication_id) == presented
}
