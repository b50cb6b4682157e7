//! Asymmetric public-key attestation.
//!
//! `Ed25519Attestor` holds a private signing key; the corresponding
//! `Ed25519AttestationVerifier` holds only the public key. This is the
//! scheme for cross-device and cross-party proofs — sharing offers, backup
//! manifests — where the verifier is a different trust domain and must not
//! possess signing material.

use chrono::Utc;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use tracing::debug;

use semblance_contracts::{
    attestation::{Attestation, Proof, Verification},
    error::{GatewayError, GatewayResult},
};
use semblance_core::traits::{AttestationSigner, AttestationVerifier};

use crate::canonical::signing_bytes;
use crate::hmac::PROOF_PURPOSE;

/// Proof `type` value emitted by this scheme.
pub const ED25519_PROOF_TYPE: &str = "Ed25519Proof";

/// Ed25519 signer. Holds the private key.
pub struct Ed25519Attestor {
    signing_key: SigningKey,
    verification_method: String,
}

impl Ed25519Attestor {
    /// Generate a fresh random key pair.
    pub fn generate(verification_method: impl Into<String>) -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
            verification_method: verification_method.into(),
        }
    }

    /// Reconstruct an attestor from a stored 32-byte secret key.
    pub fn from_secret_bytes(
        bytes: &[u8],
        verification_method: impl Into<String>,
    ) -> GatewayResult<Self> {
        let secret: [u8; 32] = bytes.try_into().map_err(|_| GatewayError::Attestation {
            reason: format!("secret key must be 32 bytes, got {}", bytes.len()),
        })?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret),
            verification_method: verification_method.into(),
        })
    }

    /// The public key bytes, for publication alongside exported artifacts.
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// A verifier holding only this attestor's public key.
    pub fn verifier(&self) -> Ed25519AttestationVerifier {
        Ed25519AttestationVerifier {
            verifying_key: self.signing_key.verifying_key(),
        }
    }
}

impl AttestationSigner for Ed25519Attestor {
    fn sign(&self, payload: &serde_json::Value) -> GatewayResult<Attestation> {
        let created = Utc::now();
        let bytes = signing_bytes(
            payload,
            ED25519_PROOF_TYPE,
            &created,
            &self.verification_method,
            PROOF_PURPOSE,
        )?;

        let signature = self.signing_key.sign(&bytes);

        Ok(Attestation {
            payload: payload.clone(),
            proof: Proof {
                proof_type: ED25519_PROOF_TYPE.to_string(),
                created,
                verification_method: self.verification_method.clone(),
                proof_purpose: PROOF_PURPOSE.to_string(),
                proof_value: hex::encode(signature.to_bytes()),
            },
        })
    }
}

/// Ed25519 verifier. Holds only the public key.
pub struct Ed25519AttestationVerifier {
    verifying_key: VerifyingKey,
}

impl Ed25519AttestationVerifier {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    /// Build a verifier from published 32-byte public key material.
    pub fn from_public_key_bytes(bytes: &[u8]) -> GatewayResult<Self> {
        let key: [u8; 32] = bytes.try_into().map_err(|_| GatewayError::Attestation {
            reason: format!("public key must be 32 bytes, got {}", bytes.len()),
        })?;

        let verifying_key =
            VerifyingKey::from_bytes(&key).map_err(|e| GatewayError::Attestation {
                reason: format!("public key bytes are not a valid Ed25519 point: {}", e),
            })?;

        Ok(Self { verifying_key })
    }
}

impl AttestationVerifier for Ed25519AttestationVerifier {
    /// Recompute the signing bytes and check the signature.
    ///
    /// Malformed input yields `Verification::invalid()`, never a panic.
    fn verify(&self, attestation: &Attestation) -> Verification {
        let proof = &attestation.proof;

        if proof.proof_type != ED25519_PROOF_TYPE {
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

        let raw = match hex::decode(&proof.proof_value) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("proof value is not valid hex");
                return Verification::invalid();
            }
        };
        let raw: [u8; 64] = match raw.try_into() {
            Ok(raw) => raw,
            Err(_) => return Verification::invalid(),
        };

        match self.verifying_key.verify(&bytes, &Signature::from_bytes(&raw)) {
            Ok(()) => Verification::valid(proof.verification_method.clone(), proof.created),
            Err(_) => Verification::invalid(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
