//! # semblance-contracts
//!
//! Shared types, schemas, and error contracts for the Semblance gateway
//! core.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod action;
pub mod allowlist;
pub mod attestation;
pub mod dispatch;
pub mod entry;
pub mod error;
