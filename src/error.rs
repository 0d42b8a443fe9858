// ⚠️ Error taxonomy for the guest directory and its stores

use std::time::Duration;
use thiserror::Error;

use crate::guest::Event;
use crate::validation::ValidationIssue;

/// Errors raised by a `GuestStore` backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("guest record not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::CannotOpen | rusqlite::ErrorCode::DatabaseBusy
                ) =>
            {
                StoreError::Unavailable(err.to_string())
            }
            rusqlite::Error::SqliteFailure(ref e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::PermissionDenied | rusqlite::ErrorCode::ReadOnly
                ) =>
            {
                StoreError::PermissionDenied(err.to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("malformed guest document: {}", err))
    }
}

/// Errors surfaced by `GuestDirectory` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("store operation '{operation}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{name} already confirmed the {event}")]
    DuplicateConfirmation { name: String, event: Event },

    #[error("invalid RSVP: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("guest record not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),
}

impl DirectoryError {
    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    pub fn duplicate_confirmation(name: impl Into<String>, event: Event) -> Self {
        Self::DuplicateConfirmation {
            name: name.into(),
            event,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![ValidationIssue::new(field, message)])
    }
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => DirectoryError::Unavailable(msg),
            StoreError::PermissionDenied(msg) => DirectoryError::PermissionDenied(msg),
            StoreError::NotFound(id) => DirectoryError::NotFound(id),
            StoreError::Backend(msg) => DirectoryError::Store(msg),
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
