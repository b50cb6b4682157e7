//! Payload digests.
//!
//! The ledger stores provenance, not content: every audit entry carries a
//! one-way digest of its payload instead of the payload itself.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of a payload's canonical JSON encoding.
///
/// `serde_json::to_vec` on a `Value` is deterministic (object keys are
/// stored sorted), so the same payload always produces the same digest.
///
/// Returns a lowercase 64-character hex string.
pub fn payload_hash(payload: &serde_json::Value) -> String {
    // to_vec on an in-memory Value cannot fail.
    let canonical = serde_json::to_vec(payload).unwrap_or_default();
    hex::encode(Sha256::digest(&canonical))
}
