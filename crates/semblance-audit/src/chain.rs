//! Hash-chain primitives: the genesis digest, entry linkage, and chain
//! integrity verification.
//!
//! Each ledger entry's `chain_hash` commits to its immediate predecessor.
//! Every field that contributes to the linkage is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Chain hash input layout (bytes, in order, fed into SHA-256):
//!   1. previous entry's `id` as hyphenated-UUID UTF-8 bytes
//!   2. previous entry's `payload_hash` as UTF-8 bytes (64 ASCII hex chars)
//!   3. previous entry's `signature` as UTF-8 bytes
//!
//! `timestamp` and `metadata` are deliberately outside the chain: they are
//! caller-supplied annotation, not evidentiary content. Anything
//! security-relevant must live in the payload, where `payload_hash` covers
//! it.

use std::sync::OnceLock;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use semblance_contracts::entry::AuditEntry;

/// The literal whose digest seeds every chain.
///
/// Fixed and public: any implementation must reproduce the same genesis
/// value for cross-implementation chain compatibility and existing-ledger
/// migration.
pub const GENESIS_LITERAL: &str = "semblance-audit-genesis";

static GENESIS: OnceLock<String> = OnceLock::new();

/// The chain hash assigned to the first entry of an empty ledger:
/// lowercase SHA-256 hex of [`GENESIS_LITERAL`].
pub fn genesis_hash() -> &'static str {
    GENESIS.get_or_init(|| hex::encode(Sha256::digest(GENESIS_LITERAL.as_bytes())))
}

/// The last-entry fields the next append chains onto.
///
/// Holding this cursor makes `append` O(1): no re-read of history is
/// needed to compute the next entry's `chain_hash`.
#[derive(Debug, Clone)]
pub struct ChainCursor {
    pub id: Uuid,
    pub payload_hash: String,
    pub signature: String,
}

impl From<&AuditEntry> for ChainCursor {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id,
            payload_hash: entry.payload_hash.clone(),
            signature: entry.signature.clone(),
        }
    }
}

/// Compute the chain hash binding a new entry to its predecessor.
///
/// Returns a lowercase 64-character hex string.
pub fn chain_hash(prev: &ChainCursor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev.id.to_string().as_bytes());
    hasher.update(prev.payload_hash.as_bytes());
    hasher.update(prev.signature.as_bytes());
    hex::encode(hasher.finalize())
}

/// The result of walking a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainVerification {
    /// Every entry links correctly back to genesis.
    Valid,

    /// The chain breaks at this entry: its stored `chain_hash` does not
    /// match the value recomputed from its predecessor. Trust in history
    /// from this entry forward is lost.
    Broken { entry_id: Uuid },
}

impl ChainVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChainVerification::Valid)
    }
}

/// Verify the integrity of a chain of entries in insertion order.
///
/// Two rules:
///
/// 1. The first entry's `chain_hash` must equal [`genesis_hash`].
/// 2. Every subsequent entry's `chain_hash` must equal
///    `chain_hash(prev.id, prev.payload_hash, prev.signature)`.
///
/// Returns `Broken` with the id of the first entry that fails. A pure
/// function of stored data — no key material is needed: chaining proves
/// non-repudiation of ordering and content, not authenticity. Authenticity
/// is proved separately by each entry's `signature`. An empty chain is
/// defined as valid.
pub fn verify_chain(entries: &[AuditEntry]) -> ChainVerification {
    let mut expected = genesis_hash().to_string();

    for entry in entries {
        if entry.chain_hash != expected {
            return ChainVerification::Broken { entry_id: entry.id };
        }
        expected = chain_hash(&ChainCursor::from(entry));
    }

    ChainVerification::Valid
}
