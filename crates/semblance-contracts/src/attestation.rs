//! Attestation envelope types.
//!
//! An attestation bundles an arbitrary structured payload with a proof of
//! its origin and integrity. The proof's `proof_value` is a signature over
//! a canonical encoding of the payload plus the other proof fields — so
//! altering any signed field invalidates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payload plus the cryptographic proof over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    /// The structured object being attested.
    pub payload: serde_json::Value,

    /// The proof block binding the payload to a signer.
    pub proof: Proof,
}

/// The proof block of an attestation.
///
/// All fields except `proof_value` are covered by the signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// Signature scheme discriminant (e.g. `"HmacSha256Proof"`).
    #[serde(rename = "type")]
    pub proof_type: String,

    /// When the proof was produced (UTC).
    pub created: DateTime<Utc>,

    /// Identifies the signing key or device that produced the proof.
    pub verification_method: String,

    /// Why the proof was produced (e.g. `"assertionMethod"`).
    pub proof_purpose: String,

    /// Hex-encoded signature over the canonical signing bytes.
    pub proof_value: String,
}

/// The outcome of verifying an attestation.
///
/// Verification never throws on malformed input — a bad envelope from an
/// untrusted peer yields `valid: false`, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,

    /// The `verification_method` of the proof, when it verified.
    pub signer_device: Option<String>,

    /// The proof's `created` instant, when it verified.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Verification {
    /// A successful verification, carrying the signer identity and the
    /// proof's creation time.
    pub fn valid(signer_device: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            valid: true,
            signer_device: Some(signer_device.into()),
            timestamp: Some(timestamp),
        }
    }

    /// A failed verification. Carries no signer details: an invalid proof
    /// proves nothing about who produced it.
    pub fn invalid() -> Self {
        Self {
            valid: false,
            signer_device: None,
            timestamp: None,
        }
    }
}
