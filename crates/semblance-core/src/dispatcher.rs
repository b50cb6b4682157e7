//! The dispatch pipeline: the single path an action takes across the
//! Core → Gateway trust boundary.
//!
//! Per request the pipeline runs:
//!
//!   received → pre-log → signature check → allowlist check → adapter → post-log
//!
//! The security invariant is absolute: the adapter is NEVER invoked unless
//! the attestation verifier accepted the envelope AND the destination policy
//! approved the host. Both refusals are logged as `rejected` — an unsigned
//! but allowed request and a signed but disallowed request are equally
//! refused.
//!
//! No path exits the pipeline without a terminal response entry: adapter
//! errors, timeouts, and panics all land in the ledger as `error`.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use semblance_contracts::{
    dispatch::{AdapterOutcome, DispatchOutcome, DispatchRequest},
    entry::{Direction, EntryStatus, NewAuditEntry},
    error::GatewayResult,
};

use crate::hash::payload_hash;
use crate::traits::{
    ActionAdapter, AttestationSigner, AttestationVerifier, AuditSink, DestinationPolicy,
};

/// The gateway dispatcher.
///
/// Owns the trusted components — verifier, destination policy, audit sink,
/// and a signer for response envelopes — plus the untrusted adapter and the
/// bounded timeout its invocations run under. One dispatcher is shared
/// across concurrent requests; each `dispatch()` call is an independent
/// pipeline run.
pub struct Dispatcher {
    audit: Arc<dyn AuditSink>,
    policy: Arc<dyn DestinationPolicy>,
    verifier: Box<dyn AttestationVerifier>,
    signer: Box<dyn AttestationSigner>,
    adapter: Arc<dyn ActionAdapter>,
    adapter_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher with the given components.
    ///
    /// `adapter_timeout` bounds step 4 of every pipeline run; on expiry the
    /// run is logged as an adapter `error`.
    pub fn new(
        audit: Arc<dyn AuditSink>,
        policy: Arc<dyn DestinationPolicy>,
        verifier: Box<dyn AttestationVerifier>,
        signer: Box<dyn AttestationSigner>,
        adapter: Arc<dyn ActionAdapter>,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            audit,
            policy,
            verifier,
            signer,
            adapter,
            adapter_timeout,
        }
    }

    /// Run one request through the full pipeline.
    ///
    /// # Pipeline
    ///
    /// 1. Append a `request`/`pending` entry — before any external call, so
    ///    an attempted-but-never-completed action is still discoverable
    /// 2. Verify the envelope; on failure log `response`/`rejected` and stop
    /// 3. Check the destination against the allowlist; same treatment
    /// 4. Invoke the adapter on a worker thread under `adapter_timeout`
    /// 5. Append the terminal `response` entry with the adapter's status and
    ///    a fresh signature over the response payload
    ///
    /// # Errors
    ///
    /// Rejections and adapter failures are `Ok` outcomes — they are recorded
    /// and reported, not raised. The only `Err` paths are gateway-internal
    /// hard failures: an audit entry that could not be written or a response
    /// envelope that could not be signed.
    pub fn dispatch(&self, request: DispatchRequest) -> GatewayResult<DispatchOutcome> {
        let request_id = Uuid::new_v4();

        debug!(
            request_id = %request_id,
            action = %request.action,
            destination = %request.destination,
            "dispatch starting"
        );

        // ── Step 1: pre-log the attempt ──────────────────────────────────────
        self.audit.append(NewAuditEntry {
            request_id,
            timestamp: Utc::now(),
            action: request.action.clone(),
            direction: Direction::Request,
            status: EntryStatus::Pending,
            payload_hash: payload_hash(&request.payload),
            signature: request.envelope.proof.proof_value.clone(),
            metadata: request.metadata.clone(),
            estimated_time_saved_seconds: request.estimated_time_saved_seconds,
        })?;

        // ── Step 2: authenticity ─────────────────────────────────────────────
        //
        // The envelope's proof must verify AND its payload must be the
        // payload being dispatched; a valid proof over different bytes is
        // still a forgery.
        let verification = self.verifier.verify(&request.envelope);
        if !verification.valid {
            warn!(
                request_id = %request_id,
                action = %request.action,
                "attestation signature rejected"
            );
            return self.reject(request_id, &request, "attestation signature rejected");
        }
        if request.envelope.payload != request.payload {
            warn!(
                request_id = %request_id,
                action = %request.action,
                "envelope payload does not match dispatched payload"
            );
            return self.reject(
                request_id,
                &request,
                "envelope payload does not match dispatched payload",
            );
        }

        // ── Step 3: destination policy ───────────────────────────────────────
        //
        // Checked even though the signature was valid: signed-but-disallowed
        // is refused exactly like unsigned-but-allowed.
        if !self.policy.is_allowed(&request.destination) {
            warn!(
                request_id = %request_id,
                destination = %request.destination,
                "destination is not on the allowlist"
            );
            return self.reject(
                request_id,
                &request,
                &format!("destination '{}' is not on the allowlist", request.destination),
            );
        }

        // ── Step 4: adapter invocation under a bounded timeout ───────────────
        let outcome = self.invoke_adapter(&request);

        // ── Step 5: terminal response entry ──────────────────────────────────
        let (status, data, error) = match outcome {
            AdapterOutcome::Success(value) => (EntryStatus::Success, Some(value), None),
            AdapterOutcome::Error(message) => (EntryStatus::Error, None, Some(message)),
            AdapterOutcome::RateLimited => (
                EntryStatus::RateLimited,
                None,
                Some("rate limited by downstream service".to_string()),
            ),
        };

        let response_payload = json!({
            "status": status,
            "data": data,
            "error": error,
        });

        // Time saved only counts when the action actually completed.
        let time_saved = if status == EntryStatus::Success {
            request.estimated_time_saved_seconds
        } else {
            0
        };
        self.log_response(request_id, &request, status, &response_payload, time_saved)?;

        debug!(
            request_id = %request_id,
            action = %request.action,
            status = ?status,
            "dispatch complete"
        );

        Ok(DispatchOutcome {
            request_id,
            status,
            data,
            error,
        })
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Run the adapter on a worker thread and wait at most `adapter_timeout`.
    ///
    /// A timeout and a panicking adapter (observed as a disconnected
    /// channel) are both mapped to `AdapterOutcome::Error`, so every run
    /// still reaches step 5. A timed-out worker is detached; its late result
    /// is discarded.
    fn invoke_adapter(&self, request: &DispatchRequest) -> AdapterOutcome {
        let adapter = Arc::clone(&self.adapter);
        let action = request.action.clone();
        let payload = request.payload.clone();

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(adapter.call(&action, &payload));
        });

        match rx.recv_timeout(self.adapter_timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    action = %request.action,
                    timeout_ms = self.adapter_timeout.as_millis() as u64,
                    "adapter timed out"
                );
                AdapterOutcome::Error(format!(
                    "adapter timed out after {}ms",
                    self.adapter_timeout.as_millis()
                ))
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(action = %request.action, "adapter terminated without an outcome");
                AdapterOutcome::Error("adapter terminated without producing an outcome".to_string())
            }
        }
    }

    /// Log a `response`/`rejected` entry and surface the refusal as an
    /// outcome.
    fn reject(
        &self,
        request_id: Uuid,
        request: &DispatchRequest,
        reason: &str,
    ) -> GatewayResult<DispatchOutcome> {
        let response_payload = json!({
            "status": EntryStatus::Rejected,
            "error": reason,
        });
        self.log_response(request_id, request, EntryStatus::Rejected, &response_payload, 0)?;

        Ok(DispatchOutcome {
            request_id,
            status: EntryStatus::Rejected,
            data: None,
            error: Some(reason.to_string()),
        })
    }

    /// Append the terminal response entry, freshly signed over the response
    /// payload with the gateway's own signer.
    fn log_response(
        &self,
        request_id: Uuid,
        request: &DispatchRequest,
        status: EntryStatus,
        response_payload: &serde_json::Value,
        time_saved: u64,
    ) -> GatewayResult<()> {
        let envelope = self.signer.sign(response_payload)?;

        self.audit.append(NewAuditEntry {
            request_id,
            timestamp: Utc::now(),
            action: request.action.clone(),
            direction: Direction::Response,
            status,
            payload_hash: payload_hash(response_payload),
            signature: envelope.proof.proof_value,
            metadata: None,
            estimated_time_saved_seconds: time_saved,
        })?;

        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
