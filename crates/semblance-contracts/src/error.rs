//! Error types for the Semblance gateway core.
//!
//! All fallible operations across the gateway crates return
//! `GatewayResult<T>`. Error variants carry enough context to produce
//! actionable audit entries and log lines.

use thiserror::Error;

/// The unified error type for the gateway core.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Input failed a structural validation check (wildcard domain,
    /// malformed action name, empty field).
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// An attestation could not be produced (bad key material, payload
    /// that cannot be canonically serialized).
    ///
    /// Verification failures are NOT errors — `verify()` reports them as
    /// `valid: false` so malformed input from an untrusted peer never
    /// becomes a crash path.
    #[error("attestation failed: {reason}")]
    Attestation { reason: String },

    /// The audit trail could not persist an entry.
    ///
    /// This is treated as fatal — an action without a corresponding audit
    /// record is a security regression, so the failure propagates instead
    /// of being swallowed.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// No allowlist entry exists with the given id.
    #[error("allowlist entry '{id}' not found")]
    ServiceNotFound { id: uuid::Uuid },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the Semblance gateway crates.
pub type GatewayResult<T> = Result<T, GatewayError>;
