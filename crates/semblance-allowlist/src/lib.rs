//! # semblance-allowlist
//!
//! The domain allowlist: the only component permitted to answer "may we
//! contact host X". Exact hostname matching, deny by default, soft
//! revocation that preserves history.

pub mod config;
pub mod store;

pub use config::AllowlistConfig;
pub use store::Allowlist;
