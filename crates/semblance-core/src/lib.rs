//! # semblance-core
//!
//! The dispatch pipeline and trait seams of the Semblance gateway.
//!
//! This crate provides:
//! - The five boundary traits (`AttestationSigner`, `AttestationVerifier`,
//!   `DestinationPolicy`, `AuditSink`, `ActionAdapter`)
//! - The `Dispatcher` that wires them together in the correct trust order
//! - Payload digest helpers shared by the pipeline and its tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use semblance_core::{Dispatcher, traits::AuditSink};
//! ```

pub mod dispatcher;
pub mod hash;
pub mod traits;

pub use dispatcher::Dispatcher;
