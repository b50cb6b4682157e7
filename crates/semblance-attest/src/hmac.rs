//! Symmetric keyed-digest attestation.
//!
//! `HmacAttestor` signs and verifies with one shared secret, which makes it
//! the right scheme when both sides sit in the same trust domain — the Core
//! and Gateway processes of a single installation sharing a per-install
//! secret. For cross-device proofs, where the verifier must not hold
//! signing material, use the Ed25519 scheme instead.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use semblance_contracts::{
    attestation::{Attestation, Proof, Verification},
    error::{GatewayError, GatewayResult},
};
use semblance_core::traits::{AttestationSigner, AttestationVerifier};

use crate::canonical::signing_bytes;

type HmacSha256 = Hmac<Sha256>;

/// Proof `type` value emitted by this scheme.
pub const HMAC_PROOF_TYPE: &str = "HmacSha256Proof";

/// Proof purpose for action and message attestation.
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// HMAC-SHA256 signer/verifier over a shared secret.
pub struct HmacAttestor {
    secret: Vec<u8>,
    verification_method: String,
}

impl HmacAttestor {
    /// Create an attestor from the shared secret and a label identifying
    /// the signing installation (recorded as `verification_method`).
    pub fn new(secret: impl Into<Vec<u8>>, verification_method: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            verification_method: verification_method.into(),
        }
    }

    fn mac(&self) -> GatewayResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| GatewayError::Attestation {
            reason: "HMAC secret is unusable".to_string(),
        })
    }
}

impl AttestationSigner for HmacAttestor {
    fn sign(&self, payload: &serde_json::Value) -> GatewayResult<Attestation> {
        let created = Utc::now();
        let bytes = signing_bytes(
            payload,
            HMAC_PROOF_TYPE,
            &created,
            &self.verification_method,
            PROOF_PURPOSE,
        )?;

        let mut mac = self.mac()?;
        mac.update(&bytes);
        let proof_value = hex::encode(mac.finalize().into_bytes());

        Ok(Attestation {
            payload: payload.clone(),
            proof: Proof {
                proof_type: HMAC_PROOF_TYPE.to_string(),
                created,
                verification_method: self.verification_method.clone(),
                proof_purpose: PROOF_PURPOSE.to_string(),
                proof_value,
            },
        })
    }
}

impl AttestationVerifier for HmacAttestor {
    /// Recompute the keyed digest and compare in constant time.
    ///
    /// Malformed input — wrong proof type, undecodable hex, truncated tag —
    /// yields `Verification::invalid()`, never a panic or error.
    fn verify(&self, attestation: &Attestation) -> Verification {
        let proof = &attestation.proof;

        if proof.proof_type != HMAC_PROOF_TYPE {
            debug!(proof_type = %proof.proof_type, "unexpected proof type");
            return Verification::invalid();
        }

        let bytes = match signing_bytes(
            &attestation.payload,
            &proof.proof_type,
            &proof.created,
            &proof.verification_method,
            &proof.proof_purpose,
        ) {
            Ok(bytes) => bytes,
            Err(_) => return Verification::invalid(),
        };

        let tag = match hex::decode(&proof.proof_value) {
            Ok(tag) => tag,
            Err(_) => {
                debug!("proof value is not valid hex");
                return Verification::invalid();
            }
        };

        let mut mac = match self.mac() {
            Ok(mac) => mac,
            Err(_) => return Verification::invalid(),
        };
        mac.update(&bytes);

        // verify_slice is constant-time and rejects truncated tags.
        match mac.verify_slice(&tag) {
            Ok(()) => Verification::valid(proof.verification_method.clone(), proof.created),
            Err(_) => Verification::invalid(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use semblance_core::traits::{AttestationSigner, AttestationVerifier};

    use super::HmacAttestor;

    fn attestor() -> HmacAttestor {
        HmacAttestor::new(b"per-install-secret".to_vec(), "gateway-local")
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let attestor = attestor();
        let attestation = attestor.sign(&json!({ "action": "email.send" })).unwrap();

        let verification = attestor.verify(&attestation);
        assert!(verification.valid);
        assert_eq!(verification.signer_device.as_deref(), Some("gateway-local"));
        assert_eq!(verification.timestamp, Some(attestation.proof.created));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let attestor = attestor();
        let mut attestation = attestor.sign(&json!({ "amount": 10 })).unwrap();
        attestation.payload = json!({ "amount": 10_000 });

        assert!(!attestor.verify(&attestation).valid);
    }

    #[test]
    fn test_tampered_proof_fields_fail() {
        let attestor = attestor();
        let base = attestor.sign(&json!({ "k": "v" })).unwrap();

        let mut altered = base.clone();
        altered.proof.verification_method = "someone-else".to_string();
        assert!(!attestor.verify(&altered).valid);

        let mut altered = base.clone();
        altered.proof.created = altered.proof.created + chrono::Duration::seconds(1);
        assert!(!attestor.verify(&altered).valid);

        let mut altered = base;
        altered.proof.proof_purpose = "authentication".to_string();
        assert!(!attestor.verify(&altered).valid);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let signer = attestor();
        let other = HmacAttestor::new(b"a-different-secret".to_vec(), "gateway-local");

        let attestation = signer.sign(&json!({ "k": "v" })).unwrap();
        assert!(!other.verify(&attestation).valid);
    }

    #[test]
    fn test_malformed_proof_value_does_not_panic() {
        let attestor = attestor();
        let mut attestation = attestor.sign(&json!({})).unwrap();

        for junk in ["", "zz", "deadbeef", "0x1234"] {
            attestation.proof.proof_value = junk.to_string();
            let verification = attestor.verify(&attestation);
            assert!(!verification.valid, "'{}' must not verify", junk);
            assert!(verification.signer_device.is_none());
        }
    }

    #[test]
    fn test_single_bit_flip_in_tag_fails() {
        let attestor = attestor();
        let attestation = attestor.sign(&json!({ "n": 42 })).unwrap();

        let mut tag = hex::decode(&attestation.proof.proof_value).unwrap();
        tag[0] ^= 0x01;

        let mut altered = attestation;
        altered.proof.proof_value = hex::encode(tag);
        assert!(!attestor.verify(&altered).valid);
    }
}
