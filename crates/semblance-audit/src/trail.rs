//! The in-memory audit trail.
//!
//! `InMemoryAuditTrail` is the reference implementation of the `AuditSink`
//! trait: an append-only `Vec` of entries plus the `ChainCursor` of the
//! most recent one, both behind a single `Mutex`. Reading the cursor and
//! writing the new entry happen under one lock acquisition, so concurrent
//! appends serialize and the chain can never interleave — a race here
//! would silently break tamper evidence without raising an error.
//!
//! Appending is the only write operation. There is no update or delete
//! anywhere on this type, by design.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use semblance_contracts::{
    action::ActionType,
    entry::{AuditEntry, NewAuditEntry},
    error::{GatewayError, GatewayResult},
};
use semblance_core::traits::AuditSink;

use crate::chain::{chain_hash, genesis_hash, verify_chain, ChainCursor, ChainVerification};

/// The mutable interior of an `InMemoryAuditTrail`.
pub(crate) struct TrailState {
    /// All entries in append order.
    pub(crate) entries: Vec<AuditEntry>,

    /// Cursor over the last appended entry, `None` while the ledger is
    /// empty. Kept in lockstep with `entries` so append is O(1).
    pub(crate) cursor: Option<ChainCursor>,
}

/// An append-only, hash-chained audit trail held in memory.
///
/// Clones share the same underlying ledger; hand one clone to the
/// dispatcher as its `AuditSink` and keep another for reads.
#[derive(Clone)]
pub struct InMemoryAuditTrail {
    pub(crate) state: Arc<Mutex<TrailState>>,
}

impl InMemoryAuditTrail {
    /// Create an empty trail. The first append will chain onto the genesis
    /// digest.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TrailState {
                entries: Vec::new(),
                cursor: None,
            })),
        }
    }

    /// Append one entry, returning its generated id.
    ///
    /// Computes the entry's `chain_hash` from the cursor (or the genesis
    /// digest for the first entry), persists it, then advances the cursor —
    /// all under one lock. Once begun, an append runs to completion or
    /// fails loudly; the only failure is a poisoned lock, surfaced as
    /// `AuditWriteFailed` rather than swallowed.
    pub fn append(&self, new: NewAuditEntry) -> GatewayResult<Uuid> {
        let mut state = self.state.lock().map_err(|e| GatewayError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let chain = match &state.cursor {
            Some(cursor) => chain_hash(cursor),
            None => genesis_hash().to_string(),
        };

        let id = Uuid::new_v4();
        let entry = new.into_entry(id, chain);

        debug!(
            id = %id,
            request_id = %entry.request_id,
            action = %entry.action,
            direction = ?entry.direction,
            status = ?entry.status,
            "audit entry appended"
        );

        state.cursor = Some(ChainCursor::from(&entry));
        state.entries.push(entry);

        Ok(id)
    }

    /// All entries for one correlation id, in insertion order.
    pub fn get_by_request_id(&self, request_id: Uuid) -> Vec<AuditEntry> {
        self.lock_read()
            .entries
            .iter()
            .filter(|e| e.request_id == request_id)
            .cloned()
            .collect()
    }

    /// Entries whose timestamp falls within `[start, end]`, insertion order.
    pub fn get_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<AuditEntry> {
        self.lock_read()
            .entries
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .cloned()
            .collect()
    }

    /// Entries for one action type, insertion order.
    pub fn get_by_action(&self, action: &ActionType) -> Vec<AuditEntry> {
        self.lock_read()
            .entries
            .iter()
            .filter(|e| &e.action == action)
            .cloned()
            .collect()
    }

    /// The `limit` most recent entries, in ascending insertion order.
    pub fn get_recent(&self, limit: usize) -> Vec<AuditEntry> {
        let state = self.lock_read();
        let skip = state.entries.len().saturating_sub(limit);
        state.entries[skip..].to_vec()
    }

    /// Total number of entries.
    pub fn count(&self) -> usize {
        self.lock_read().entries.len()
    }

    /// Walk the full chain and report the first break, if any.
    ///
    /// Needs no key material; see `chain::verify_chain`.
    pub fn verify_chain_integrity(&self) -> ChainVerification {
        let state = self.state.lock().expect("audit state lock poisoned");
        let result = verify_chain(&state.entries);

        match &result {
            ChainVerification::Valid => {
                info!(entries = state.entries.len(), "audit chain verified")
            }
            ChainVerification::Broken { entry_id } => tracing::error!(
                entry_id = %entry_id,
                "audit chain BROKEN: history is untrustworthy from this entry forward"
            ),
        }
        result
    }

    fn lock_read(&self) -> std::sync::MutexGuard<'_, TrailState> {
        self.state.lock().expect("audit state lock poisoned")
    }
}

impl Default for InMemoryAuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for InMemoryAuditTrail {
    fn append(&self, entry: NewAuditEntry) -> GatewayResult<Uuid> {
        InMemoryAuditTrail::append(self, entry)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use semblance_contracts::{
        action::ActionType,
        entry::{Direction, EntryStatus, NewAuditEntry},
    };

    use crate::chain::{genesis_hash, ChainVerification};

    use super::InMemoryAuditTrail;

    /// Build a distinguishable append input.
    fn make_entry(request_id: Uuid, n: u64) -> NewAuditEntry {
        NewAuditEntry {
            request_id,
            timestamp: Utc::now(),
            action: ActionType::EmailFetch,
            direction: if n % 2 == 0 { Direction::Request } else { Direction::Response },
            status: if n % 2 == 0 { EntryStatus::Pending } else { EntryStatus::Success },
            payload_hash: format!("{:064x}", n),
            signature: format!("sig-{}", n),
            metadata: None,
            estimated_time_saved_seconds: 0,
        }
    }

    #[test]
    fn test_chain_valid_after_sequential_appends() {
        let trail = InMemoryAuditTrail::new();
        let rid = Uuid::new_v4();
        for n in 0..6 {
            trail.append(make_entry(rid, n)).unwrap();
        }

        assert_eq!(trail.count(), 6);
        assert!(trail.verify_chain_integrity().is_valid());
    }

    #[test]
    fn test_first_entry_carries_genesis_hash() {
        let trail = InMemoryAuditTrail::new();
        trail.append(make_entry(Uuid::new_v4(), 0)).unwrap();

        let entries = trail.get_recent(1);
        assert_eq!(entries[0].chain_hash, genesis_hash());
    }

    /// Mutating a mid-chain entry's payload hash breaks the link at the
    /// NEXT entry — the next chain_hash no longer matches its predecessor.
    #[test]
    fn test_tampering_with_payload_hash_detected_at_successor() {
        let trail = InMemoryAuditTrail::new();
        let rid = Uuid::new_v4();
        for n in 0..4 {
            trail.append(make_entry(rid, n)).unwrap();
        }

        let successor_id = {
            let mut state = trail.state.lock().unwrap();
            state.entries[1].payload_hash = format!("{:064x}", 0xbad);
            state.entries[2].id
        };

        assert_eq!(
            trail.verify_chain_integrity(),
            ChainVerification::Broken { entry_id: successor_id }
        );
    }

    /// Mutating an entry's own chain_hash is detected at that entry.
    #[test]
    fn test_tampering_with_chain_hash_detected_in_place() {
        let trail = InMemoryAuditTrail::new();
        let rid = Uuid::new_v4();
        for n in 0..3 {
            trail.append(make_entry(rid, n)).unwrap();
        }

        let victim_id = {
            let mut state = trail.state.lock().unwrap();
            state.entries[1].chain_hash = format!("{:064x}", 0xbad);
            state.entries[1].id
        };

        assert_eq!(
            trail.verify_chain_integrity(),
            ChainVerification::Broken { entry_id: victim_id }
        );
    }

    /// Tampering with id or signature is likewise caught at the successor.
    #[test]
    fn test_tampering_with_id_and_signature_detected() {
        for field in ["id", "signature"] {
            let trail = InMemoryAuditTrail::new();
            let rid = Uuid::new_v4();
            for n in 0..3 {
                trail.append(make_entry(rid, n)).unwrap();
            }

            let successor_id = {
                let mut state = trail.state.lock().unwrap();
                match field {
                    "id" => state.entries[0].id = Uuid::new_v4(),
                    _ => state.entries[0].signature = "forged".to_string(),
                }
                state.entries[1].id
            };

            assert_eq!(
                trail.verify_chain_integrity(),
                ChainVerification::Broken { entry_id: successor_id },
                "mutating '{}' must break the chain at the successor",
                field
            );
        }
    }

    /// Metadata is annotation, not evidence: altering it does not break the
    /// chain. Anything security-relevant belongs in the payload.
    #[test]
    fn test_metadata_mutation_does_not_break_chain() {
        let trail = InMemoryAuditTrail::new();
        let rid = Uuid::new_v4();
        for n in 0..3 {
            trail.append(make_entry(rid, n)).unwrap();
        }

        {
            let mut state = trail.state.lock().unwrap();
            state.entries[0].metadata = Some(serde_json::json!({ "edited": true }));
        }

        assert!(trail.verify_chain_integrity().is_valid());
    }

    #[test]
    fn test_get_by_request_id_preserves_insertion_order() {
        let trail = InMemoryAuditTrail::new();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();

        trail.append(make_entry(mine, 0)).unwrap();
        trail.append(make_entry(other, 0)).unwrap();
        trail.append(make_entry(mine, 1)).unwrap();

        let entries = trail.get_by_request_id(mine);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].payload_hash, format!("{:064x}", 0));
        assert_eq!(entries[1].payload_hash, format!("{:064x}", 1));
    }

    #[test]
    fn test_get_recent_returns_tail_in_ascending_order() {
        let trail = InMemoryAuditTrail::new();
        let rid = Uuid::new_v4();
        for n in 0..5 {
            trail.append(make_entry(rid, n)).unwrap();
        }

        let recent = trail.get_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].payload_hash, format!("{:064x}", 3));
        assert_eq!(recent[1].payload_hash, format!("{:064x}", 4));

        // A limit larger than the ledger returns everything.
        assert_eq!(trail.get_recent(100).len(), 5);
    }

    #[test]
    fn test_get_by_action_filters() {
        let trail = InMemoryAuditTrail::new();
        let rid = Uuid::new_v4();
        trail.append(make_entry(rid, 0)).unwrap();

        let mut other = make_entry(rid, 1);
        other.action = ActionType::CalendarCreate;
        trail.append(other).unwrap();

        assert_eq!(trail.get_by_action(&ActionType::EmailFetch).len(), 1);
        assert_eq!(trail.get_by_action(&ActionType::CalendarCreate).len(), 1);
        assert_eq!(trail.get_by_action(&ActionType::PaymentSend).len(), 0);
    }

    #[test]
    fn test_get_by_time_range_is_inclusive() {
        let trail = InMemoryAuditTrail::new();
        let rid = Uuid::new_v4();
        let t0 = Utc::now();

        let mut e = make_entry(rid, 0);
        e.timestamp = t0;
        trail.append(e).unwrap();

        let mut e = make_entry(rid, 1);
        e.timestamp = t0 + chrono::Duration::seconds(10);
        trail.append(e).unwrap();

        assert_eq!(trail.get_by_time_range(t0, t0).len(), 1);
        assert_eq!(
            trail
                .get_by_time_range(t0, t0 + chrono::Duration::seconds(10))
                .len(),
            2
        );
        assert_eq!(
            trail
                .get_by_time_range(t0 + chrono::Duration::seconds(1), t0 + chrono::Duration::seconds(5))
                .len(),
            0
        );
    }

    /// Appends from multiple threads serialize on the lock and still form
    /// one valid chain.
    #[test]
    fn test_concurrent_appends_keep_chain_valid() {
        let trail = InMemoryAuditTrail::new();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let trail = trail.clone();
                std::thread::spawn(move || {
                    let rid = Uuid::new_v4();
                    for n in 0..25 {
                        trail.append(make_entry(rid, t * 100 + n)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(trail.count(), 200);
        assert!(trail.verify_chain_integrity().is_valid());
    }
}
