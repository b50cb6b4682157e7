//! Audit ledger entry types.
//!
//! `AuditEntry` is a single row in the hash-chained ledger — one is written
//! per direction per request, and rows are never updated or deleted.
//! `NewAuditEntry` is the append input: an entry minus the fields the trail
//! itself generates (`id` and `chain_hash`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionType;

/// Whether an entry records the inbound request or the terminal response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Request,
    Response,
}

/// Entry outcome status.
///
/// `Pending` is the status of every request-direction entry (written before
/// any external call); the other four are terminal response statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Success,
    Error,
    Rejected,
    RateLimited,
}

/// One immutable row in the audit ledger.
///
/// The ledger stores provenance, not content: `payload_hash` is a one-way
/// digest of the action payload, never the payload itself. `chain_hash`
/// binds this entry to its immediate predecessor, so mutating any stored
/// field of an earlier entry is detectable by chain verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier, generated by the trail at append time.
    pub id: Uuid,

    /// Correlates a request entry with its paired response entry.
    pub request_id: Uuid,

    /// Caller-supplied instant (UTC), not wall clock at write time, so
    /// ordering is deterministic under test.
    pub timestamp: DateTime<Utc>,

    /// The namespaced action this entry records.
    pub action: ActionType,

    /// Request or response side of the exchange.
    pub direction: Direction,

    /// Outcome status at the time this entry was written.
    pub status: EntryStatus,

    /// SHA-256 hex digest of the canonical payload JSON.
    pub payload_hash: String,

    /// Attestation `proofValue` over the payload at the time of this entry.
    pub signature: String,

    /// Digest binding this entry to its predecessor (genesis digest for the
    /// first entry). Computed by the trail, never by the caller.
    pub chain_hash: String,

    /// Optional caller annotation (autonomy tier, notes).
    ///
    /// Deliberately excluded from the chain hash: metadata is annotation,
    /// not evidence. Anything security-relevant belongs in the payload,
    /// where it is covered by `payload_hash` and `signature`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// Estimated seconds of user time this action saved. Defaults to 0.
    #[serde(default)]
    pub estimated_time_saved_seconds: u64,
}

/// The append input: an `AuditEntry` without the trail-generated fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: ActionType,
    pub direction: Direction,
    pub status: EntryStatus,
    pub payload_hash: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub estimated_time_saved_seconds: u64,
}

impl NewAuditEntry {
    /// Complete this entry with the fields the trail generates.
    pub fn into_entry(self, id: Uuid, chain_hash: String) -> AuditEntry {
        AuditEntry {
            id,
            request_id: self.request_id,
            timestamp: self.timestamp,
            action: self.action,
            direction: self.direction,
            status: self.status,
            payload_hash: self.payload_hash,
            signature: self.signature,
            chain_hash,
            metadata: self.metadata,
            estimated_time_saved_seconds: self.estimated_time_saved_seconds,
        }
    }
}
