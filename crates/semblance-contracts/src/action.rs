//! Namespaced action types.
//!
//! Every mediated action is identified by a `service.operation` pair.
//! The known pairs are a closed enum so adapters can be wired at build
//! time; `Other` keeps the ledger forward-compatible with actions this
//! build does not know about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A namespaced action type, rendered on the wire as `service.operation`
/// (e.g. `email.fetch`).
///
/// The substring before the first dot is the "service", used by the query
/// layer for per-service aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActionType {
    EmailFetch,
    EmailSend,
    CalendarCreate,
    CalendarList,
    PaymentSend,
    SearchQuery,

    /// An action pair this build does not recognize.
    ///
    /// Kept so a ledger written by a newer build can still be read and
    /// aggregated; neither segment may be empty or contain a dot.
    Other { service: String, operation: String },
}

impl ActionType {
    /// The `(service, operation)` pair for this action.
    pub fn as_pair(&self) -> (&str, &str) {
        match self {
            ActionType::EmailFetch => ("email", "fetch"),
            ActionType::EmailSend => ("email", "send"),
            ActionType::CalendarCreate => ("calendar", "create"),
            ActionType::CalendarList => ("calendar", "list"),
            ActionType::PaymentSend => ("payment", "send"),
            ActionType::SearchQuery => ("search", "query"),
            ActionType::Other { service, operation } => (service, operation),
        }
    }

    /// The service prefix (segment before the first dot).
    pub fn service(&self) -> &str {
        self.as_pair().0
    }

    /// The operation suffix (segment after the first dot).
    pub fn operation(&self) -> &str {
        self.as_pair().1
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (service, operation) = self.as_pair();
        write!(f, "{}.{}", service, operation)
    }
}

impl FromStr for ActionType {
    type Err = GatewayError;

    /// Parse a dot-delimited `service.operation` string.
    ///
    /// Known pairs map to their closed variant; anything else becomes
    /// `Other`. A string without a dot, or with an empty segment, is a
    /// validation error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (service, operation) = s.split_once('.').ok_or_else(|| GatewayError::Validation {
            reason: format!("action '{}' is not a namespaced 'service.operation' pair", s),
        })?;

        if service.is_empty() || operation.is_empty() {
            return Err(GatewayError::Validation {
                reason: format!("action '{}' has an empty service or operation segment", s),
            });
        }

        Ok(match (service, operation) {
            ("email", "fetch") => ActionType::EmailFetch,
            ("email", "send") => ActionType::EmailSend,
            ("calendar", "create") => ActionType::CalendarCreate,
            ("calendar", "list") => ActionType::CalendarList,
            ("payment", "send") => ActionType::PaymentSend,
            ("search", "query") => ActionType::SearchQuery,
            _ => ActionType::Other {
                service: service.to_string(),
                operation: operation.to_string(),
            },
        })
    }
}

impl TryFrom<String> for ActionType {
    type Error = GatewayError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.to_string()
    }
}
