//! TOML seeding for the allowlist.
//!
//! A deployment can ship its initially enrolled destinations as a TOML
//! document of `[[services]]` tables:
//!
//! ```toml
//! [[services]]
//! service_name = "mail"
//! domain = "mail.example.com"
//! protocol = "https"
//! added_by = "config"
//! ```
//!
//! Seeded entries pass through the same validation as `add_service`, so a
//! wildcard in a config file fails loudly instead of being enrolled.

use std::path::Path;

use serde::{Deserialize, Serialize};

use semblance_contracts::{
    allowlist::ServiceSpec,
    error::{GatewayError, GatewayResult},
};

use crate::store::Allowlist;

/// The top-level structure deserialized from a TOML allowlist file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowlistConfig {
    pub services: Vec<ServiceSpec>,
}

impl AllowlistConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `GatewayError::ConfigError` if the TOML is malformed or does
    /// not match the expected schema.
    pub fn from_toml_str(s: &str) -> GatewayResult<Self> {
        toml::from_str(s).map_err(|e| GatewayError::ConfigError {
            reason: format!("failed to parse allowlist TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML allowlist configuration.
    pub fn from_file(path: &Path) -> GatewayResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GatewayError::ConfigError {
            reason: format!("failed to read allowlist file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Enroll every configured service into `allowlist`, returning how many
    /// entries were created. Stops at the first invalid entry.
    pub fn seed(&self, allowlist: &Allowlist) -> GatewayResult<usize> {
        for spec in &self.services {
            let mut spec = spec.clone();
            if spec.added_by.is_none() {
                spec.added_by = Some("config".to_string());
            }
            allowlist.add_service(spec)?;
        }
        Ok(self.services.len())
    }
}
