//! Dispatch call-surface types.
//!
//! `DispatchRequest` is what the Core process hands to the gateway;
//! `DispatchOutcome` is what comes back after the pipeline has logged,
//! checked, and (when approved) executed the action.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionType;
use crate::attestation::Attestation;
use crate::entry::EntryStatus;

/// An inbound action request crossing the Core → Gateway trust boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// The namespaced action to perform.
    pub action: ActionType,

    /// The action payload handed to the adapter after approval.
    pub payload: serde_json::Value,

    /// The exact hostname the adapter will contact. Checked against the
    /// allowlist before any adapter call.
    pub destination: String,

    /// The signature-bearing envelope over `payload`. Its proof must verify
    /// and its payload must match `payload` byte-for-byte.
    pub envelope: Attestation,

    /// Optional caller annotation, copied onto the request audit entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// Estimated seconds of user time this action saves if it succeeds.
    #[serde(default)]
    pub estimated_time_saved_seconds: u64,
}

/// The terminal result of one pipeline run.
///
/// Rejections are outcomes, not errors — the only `Err` paths out of
/// dispatch are hard failures of the gateway itself (an audit entry that
/// could not be written, a response that could not be signed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Correlation id shared by the request and response audit entries.
    pub request_id: Uuid,

    /// Terminal status, identical to the response entry's status.
    pub status: EntryStatus,

    /// Adapter response data, present on success.
    pub data: Option<serde_json::Value>,

    /// Refusal or failure description, present on every non-success.
    pub error: Option<String>,
}

/// What an external adapter reports back for one invocation.
///
/// Adapters do not retry; the gateway records the outcome and leaves retry
/// policy to higher layers.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterOutcome {
    /// The downstream call succeeded with this response body.
    Success(serde_json::Value),

    /// The downstream call failed; the message is recorded in the ledger's
    /// response payload.
    Error(String),

    /// The downstream service refused on rate-limit grounds.
    RateLimited,
}
