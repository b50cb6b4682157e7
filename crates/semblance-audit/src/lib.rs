//! # semblance-audit
//!
//! Append-only, SHA-256 hash-chained audit ledger for the Semblance
//! gateway, plus the read-only query layer over the same storage.
//!
//! ## Overview
//!
//! Every action the dispatcher mediates produces two ledger entries — one
//! per direction — each linked to its predecessor via a chain hash.
//! Tampering with any stored entry, even a single field, breaks the chain
//! and is detected by `verify_chain_integrity()`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use semblance_audit::{AuditQuery, InMemoryAuditTrail, Period};
//!
//! let trail = InMemoryAuditTrail::new();
//! trail.append(entry)?;
//! assert!(trail.verify_chain_integrity().is_valid());
//!
//! let query = AuditQuery::new(&trail);
//! let report = query.aggregate_by_service(Period::Week);
//! ```

pub mod chain;
pub mod query;
pub mod trail;

pub use chain::{chain_hash, genesis_hash, verify_chain, ChainCursor, ChainVerification};
pub use query::{AuditQuery, EntryFilter, Granularity, Period, ServiceAggregate, TimelineBucket};
pub use trail::InMemoryAuditTrail;

// ── Tests ────────────────────────────────────────────────────────────────────
