//! Canonical signing-byte encoding shared by both attestation schemes.
//!
//! Every field that contributes to a proof's signature is listed explicitly
//! so nothing is accidentally omitted, and every field is length-prefixed
//! so no two field sequences can produce the same byte stream.
//!
//! Signing input layout (bytes, in order, each field preceded by its length
//! as 8-byte little-endian):
//!   1. canonical JSON of the payload (serde_json, sorted object keys)
//!   2. proof `type` as UTF-8 bytes
//!   3. proof `created` as RFC 3339 UTF-8 bytes
//!   4. proof `verification_method` as UTF-8 bytes
//!   5. proof `proof_purpose` as UTF-8 bytes
//!
//! `proof_value` itself is never part of the input — it is the output.

use chrono::{DateTime, Utc};

use semblance_contracts::error::{GatewayError, GatewayResult};

/// Build the byte sequence both schemes sign and verify.
///
/// Returns `GatewayError::Attestation` only when the payload cannot be
/// serialized to JSON, which cannot happen for an in-memory
/// `serde_json::Value`.
pub fn signing_bytes(
    payload: &serde_json::Value,
    proof_type: &str,
    created: &DateTime<Utc>,
    verification_method: &str,
    proof_purpose: &str,
) -> GatewayResult<Vec<u8>> {
    let payload_json = serde_json::to_vec(payload).map_err(|e| GatewayError::Attestation {
        reason: format!("payload cannot be canonically serialized: {}", e),
    })?;

    let created = created.to_rfc3339();

    let mut bytes = Vec::with_capacity(payload_json.len() + 128);
    for field in [
        payload_json.as_slice(),
        proof_type.as_bytes(),
        created.as_bytes(),
        verification_method.as_bytes(),
        proof_purpose.as_bytes(),
    ] {
        bytes.extend_from_slice(&(field.len() as u64).to_le_bytes());
        bytes.extend_from_slice(field);
    }

    Ok(bytes)
}
