//! Trait seams for the Semblance gateway trust boundary.
//!
//! These five traits define the complete boundary:
//!
//! - `AttestationSigner`   — trusted producer of signed envelopes
//! - `AttestationVerifier` — trusted checker of inbound envelopes
//! - `DestinationPolicy`   — trusted gate over network destinations
//! - `AuditSink`           — trusted sink (records every attempt immutably)
//! - `ActionAdapter`       — untrusted downstream executor
//!
//! The dispatcher wires them together in the correct order. An
//! `ActionAdapter` is never invoked unless the verifier and the destination
//! policy have both approved the request.

use semblance_contracts::{
    action::ActionType,
    attestation::{Attestation, Verification},
    dispatch::AdapterOutcome,
    entry::NewAuditEntry,
    error::GatewayResult,
};
use uuid::Uuid;

/// Produces signed envelopes over arbitrary structured payloads.
///
/// Implementations hold private key material. The dispatcher uses a signer
/// to attest response payloads before they are logged.
pub trait AttestationSigner: Send + Sync {
    /// Build an attestation over `payload` with a freshly created proof.
    ///
    /// Fails only when the payload cannot be canonically encoded or the key
    /// material is unusable — never as a function of payload content.
    fn sign(&self, payload: &serde_json::Value) -> GatewayResult<Attestation>;
}

/// Checks signed envelopes.
///
/// Implementations hold whatever key material their scheme needs to verify:
/// the shared secret for the symmetric scheme, only the public key for the
/// asymmetric one.
pub trait AttestationVerifier: Send + Sync {
    /// Verify `attestation` against this verifier's key.
    ///
    /// Must not panic or error on malformed input — a bad envelope from an
    /// untrusted peer yields `Verification::invalid()`.
    fn verify(&self, attestation: &Attestation) -> Verification;
}

/// The sole authority on whether a network destination may be contacted.
///
/// Absence of an entry means denial by default.
pub trait DestinationPolicy: Send + Sync {
    /// True iff at least one active entry matches `domain` exactly.
    fn is_allowed(&self, domain: &str) -> bool;
}

/// The append-only ledger of every mediated action.
///
/// A failed append is fatal to the pipeline run: an action without an audit
/// record is a security regression, so implementations must propagate
/// storage failures rather than drop the record.
pub trait AuditSink: Send + Sync {
    /// Append one entry, returning the generated entry id.
    ///
    /// Implementations must treat this as append-only. Entries written here
    /// are never modified or deleted by the gateway.
    fn append(&self, entry: NewAuditEntry) -> GatewayResult<Uuid>;
}

/// An external service adapter (mail, calendar, payment, search).
///
/// Implementations are **untrusted** from the gateway's perspective and are
/// only invoked after the verifier and destination policy have approved the
/// request. The dispatcher calls `call()` on a worker thread and owns the
/// timeout, so a hung or panicking adapter still produces a terminal audit
/// entry.
pub trait ActionAdapter: Send + Sync {
    /// Execute the approved action against the downstream service.
    fn call(&self, action: &ActionType, payload: &serde_json::Value) -> AdapterOutcome;
}
