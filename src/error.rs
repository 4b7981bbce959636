//! Error types for sitekit.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sitekit.
///
/// Absence is never an error: lookups return `Ok(None)` when a record does
/// not exist. The variants here are the hard failures a caller must handle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body was unavailable or could not be decoded as JSON.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// An authorization check denied the requested action.
    #[error("policy violation: {0}")]
    Unauthorized(#[from] Violation),

    /// The site is configured in a way that cannot serve the request,
    /// e.g. no guest identity to fall back to.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backing record store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A password digest could not be produced.
    #[error("password error: {0}")]
    Password(String),
}

/// Failures reported by a [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The entity has no store attached to answer the query.
    #[error("no record store attached")]
    Detached,

    /// A write targeted a record that does not exist.
    #[error("{entity} {id} does not exist")]
    Missing {
        /// Kind of record, e.g. `"user"`
        entity: &'static str,
        /// Identifier that was not found
        id: i64,
    },

    /// Backend-specific failure.
    #[error("{0}")]
    Backend(String),
}

/// A policy violation with details about what failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Violation raised when `username` may not perform `action`.
    pub fn unauthorized(username: &str, action: &str) -> Self {
        Self::new(
            ViolationKind::Unauthorized {
                action: action.to_string(),
            },
            format!("user '{}' is not allowed to {}", username, action),
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Authorization failed for a specific action
    Unauthorized {
        /// The action that was not authorized
        action: String,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthorized { action } => write!(f, "Unauthorized for '{}'", action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display_names_the_action() {
        let v = Violation::unauthorized("user", "edit");
        assert_eq!(
            v.to_string(),
            "Unauthorized for 'edit': user 'user' is not allowed to edit"
        );
    }

    #[test]
    fn store_errors_convert_into_crate_errors() {
        let err: Error = StoreError::Detached.into();
        assert!(matches!(err, Error::Store(StoreError::Detached)));
        assert_eq!(err.to_string(), "store error: no record store attached");
    }

    #[test]
    fn violations_convert_into_unauthorized() {
        let err: Error = Violation::unauthorized("guest", "delete").into();
        assert!(matches!(
            err,
            Error::Unauthorized(Violation {
                kind: ViolationKind::Unauthorized { .. },
                ..
            })
        ));
    }
}
