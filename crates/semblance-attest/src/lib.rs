//! # semblance-attest
//!
//! Attestation signer/verifier pairs for the Semblance gateway.
//!
//! Two schemes share one envelope shape and one canonical signing encoding,
//! selected by trust topology at construction time:
//!
//! - [`HmacAttestor`] — symmetric keyed digest, for signer and verifier in
//!   the same trust domain (Core and Gateway of one installation).
//! - [`Ed25519Attestor`] / [`Ed25519AttestationVerifier`] — public-key
//!   signatures, for cross-device proofs where the verifier holds no
//!   signing material.

pub mod canonical;
pub mod ed25519;
pub mod hmac;

pub use self::ed25519::{Ed25519AttestationVerifier, Ed25519Attestor, ED25519_PROOF_TYPE};
pub use self::hmac::{HmacAttestor, HMAC_PROOF_TYPE, PROOF_PURPOSE};
