//! In-memory allowlist store.
//!
//! Exact-match only, no wildcards — a deliberate over-restriction. Every
//! destination a feature needs must be explicitly and individually
//! enrolled (typically by credential setup), so the allowlist can never
//! silently widen scope through a pattern match.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use semblance_contracts::{
    allowlist::{AllowlistEntry, ServiceSpec},
    error::{GatewayError, GatewayResult},
};
use semblance_core::traits::DestinationPolicy;

/// The in-memory allowlist store.
///
/// # Thread safety
///
/// All operations acquire an internal `Mutex`. Clones share the same
/// underlying list, so one store can serve the dispatcher and a management
/// surface concurrently.
#[derive(Clone)]
pub struct Allowlist {
    entries: Arc<Mutex<Vec<AllowlistEntry>>>,
}

impl Allowlist {
    /// Create an empty allowlist. Denies every domain until services are
    /// enrolled.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Enroll a destination, returning the created entry.
    ///
    /// Rejects with `GatewayError::Validation` when the domain is empty or
    /// contains a wildcard character (`*` or `?`). Duplicate domains are
    /// permitted — uniqueness is per entry id, not per domain.
    pub fn add_service(&self, spec: ServiceSpec) -> GatewayResult<AllowlistEntry> {
        if spec.domain.is_empty() {
            return Err(GatewayError::Validation {
                reason: "domain must not be empty".to_string(),
            });
        }
        if spec.domain.contains('*') || spec.domain.contains('?') {
            return Err(GatewayError::Validation {
                reason: format!(
                    "domain '{}' contains a wildcard; only exact hostnames may be enrolled",
                    spec.domain
                ),
            });
        }

        let entry = AllowlistEntry {
            id: Uuid::new_v4(),
            service_name: spec.service_name,
            domain: spec.domain,
            protocol: spec.protocol,
            added_by: spec.added_by.unwrap_or_else(|| "manual".to_string()),
            active: true,
            added_at: Utc::now(),
        };

        info!(
            id = %entry.id,
            service = %entry.service_name,
            domain = %entry.domain,
            added_by = %entry.added_by,
            "destination enrolled"
        );

        let mut entries = self.entries.lock().expect("allowlist lock poisoned");
        entries.push(entry.clone());
        Ok(entry)
    }

    /// Soft revoke: the entry remains for history but no longer authorizes
    /// traffic.
    pub fn deactivate_service(&self, id: Uuid) -> GatewayResult<()> {
        let mut entries = self.entries.lock().expect("allowlist lock poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(GatewayError::ServiceNotFound { id })?;

        entry.active = false;
        info!(id = %id, domain = %entry.domain, "destination deactivated");
        Ok(())
    }

    /// Hard delete, used when a credential is fully removed. Distinct from
    /// deactivation: the entry disappears from `list_services()` too.
    pub fn remove_service(&self, id: Uuid) -> GatewayResult<()> {
        let mut entries = self.entries.lock().expect("allowlist lock poisoned");
        let before = entries.len();
        entries.retain(|e| e.id != id);

        if entries.len() == before {
            return Err(GatewayError::ServiceNotFound { id });
        }
        info!(id = %id, "destination removed");
        Ok(())
    }

    /// All entries, active and inactive, for audit and UI display.
    pub fn list_services(&self) -> Vec<AllowlistEntry> {
        self.entries.lock().expect("allowlist lock poisoned").clone()
    }
}

impl Default for Allowlist {
    fn default() -> Self {
        Self::new()
    }
}

impl DestinationPolicy for Allowlist {
    /// True iff at least one active entry matches `domain` exactly.
    fn is_allowed(&self, domain: &str) -> bool {
        let entries = self.entries.lock().expect("allowlist lock poisoned");
        let allowed = entries.iter().any(|e| e.active && e.domain == domain);

        if allowed {
            debug!(domain = %domain, "destination allowed");
        } else {
            warn!(domain = %domain, "destination denied: no active allowlist entry");
        }
        allowed
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use semblance_contracts::{allowlist::ServiceSpec, error::GatewayError};
    use semblance_core::traits::DestinationPolicy;

    use super::Allowlist;

    fn spec(domain: &str) -> ServiceSpec {
        ServiceSpec {
            service_name: "mail".to_string(),
            domain: domain.to_string(),
            protocol: "https".to_string(),
            added_by: None,
        }
    }

    #[test]
    fn test_wildcard_domain_rejected() {
        let allowlist = Allowlist::new();

        for bad in ["*.example.com", "mail.*.com", "mail.example.?", "*"] {
            let err = allowlist.add_service(spec(bad)).unwrap_err();
            assert!(
                matches!(err, GatewayError::Validation { .. }),
                "'{}' must fail validation",
                bad
            );
        }
        assert!(allowlist.list_services().is_empty());
    }

    #[test]
    fn test_empty_domain_rejected() {
        let allowlist = Allowlist::new();
        assert!(allowlist.add_service(spec("")).is_err());
    }

    #[test]
    fn test_exact_match_only() {
        let allowlist = Allowlist::new();
        allowlist.add_service(spec("mail.example.com")).unwrap();

        assert!(allowlist.is_allowed("mail.example.com"));
        assert!(!allowlist.is_allowed("other.example.com"));
        assert!(!allowlist.is_allowed("example.com"));
        assert!(!allowlist.is_allowed("sub.mail.example.com"));
    }

    #[test]
    fn test_empty_allowlist_denies_everything() {
        let allowlist = Allowlist::new();
        assert!(!allowlist.is_allowed("anything.example.com"));
    }

    #[test]
    fn test_deactivation_revokes_but_keeps_history() {
        let allowlist = Allowlist::new();
        let entry = allowlist.add_service(spec("mail.example.com")).unwrap();
        assert!(allowlist.is_allowed("mail.example.com"));

        allowlist.deactivate_service(entry.id).unwrap();

        assert!(!allowlist.is_allowed("mail.example.com"));
        let listed = allowlist.list_services();
        assert_eq!(listed.len(), 1, "deactivated entry must remain listed");
        assert!(!listed[0].active);
    }

    #[test]
    fn test_removal_deletes_entry() {
        let allowlist = Allowlist::new();
        let entry = allowlist.add_service(spec("mail.example.com")).unwrap();

        allowlist.remove_service(entry.id).unwrap();

        assert!(!allowlist.is_allowed("mail.example.com"));
        assert!(allowlist.list_services().is_empty());
    }

    #[test]
    fn test_unknown_id_errors() {
        let allowlist = Allowlist::new();
        let id = uuid::Uuid::new_v4();

        assert!(matches!(
            allowlist.deactivate_service(id),
            Err(GatewayError::ServiceNotFound { .. })
        ));
        assert!(matches!(
            allowlist.remove_service(id),
            Err(GatewayError::ServiceNotFound { .. })
        ));
    }

    /// The same domain may be enrolled twice (e.g. once by credential setup
    /// and once manually); deactivating one entry must not revoke the other.
    #[test]
    fn test_duplicate_domains_are_independent() {
        let allowlist = Allowlist::new();
        let auto = allowlist
            .add_service(ServiceSpec {
                added_by: Some("credential_setup".to_string()),
                ..spec("mail.example.com")
            })
            .unwrap();
        allowlist.add_service(spec("mail.example.com")).unwrap();

        allowlist.deactivate_service(auto.id).unwrap();
        assert!(
            allowlist.is_allowed("mail.example.com"),
            "the manually added entry still authorizes the domain"
        );
    }

    #[test]
    fn test_added_by_defaults_to_manual() {
        let allowlist = Allowlist::new();
        let entry = allowlist.add_service(spec("mail.example.com")).unwrap();
        assert_eq!(entry.added_by, "manual");
    }
}
