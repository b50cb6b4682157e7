//! Allowlist entry types.
//!
//! The allowlist is the sole authority on whether a network destination may
//! be contacted. Entries are exact hostnames — no wildcards, ever — so the
//! list can never silently widen scope through a pattern match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One enrolled network destination.
///
/// Multiple entries may share a domain (one added by credential setup, one
/// added manually); uniqueness is per entry id. Revocation deactivates an
/// entry rather than deleting it, preserving history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowlistEntry {
    pub id: Uuid,

    /// Human label for the service this destination belongs to.
    pub service_name: String,

    /// Exact hostname. Validated at insertion to contain no wildcard.
    pub domain: String,

    /// Protocol the adapter uses to reach the destination (e.g. "https").
    pub protocol: String,

    /// Provenance: who or what caused this entry (e.g. "credential_setup").
    pub added_by: String,

    /// Only active entries authorize traffic.
    pub active: bool,

    /// When the entry was enrolled (UTC).
    pub added_at: DateTime<Utc>,
}

/// The caller-supplied fields for enrolling a destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub service_name: String,
    pub domain: String,
    pub protocol: String,

    /// Defaults to `"manual"` when absent.
    #[serde(default)]
    pub added_by: Option<String>,
}
