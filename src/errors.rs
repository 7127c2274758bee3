//! Unified error types and result handling.
//!
//! Every failure the crate can surface maps onto one of four categories
//! (see [`ErrorCategory`]) so callers can pick a specific message without
//! matching on every variant.

use crate::entities::{DocumentKind, DocumentStatus};
use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the billing core.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A required field is missing or malformed
    #[error("Validation failed: {message}")]
    Validation {
        /// What went wrong
        message: String,
    },

    /// A money or quantity value is negative
    #[error("Invalid {field}: {amount} (must be zero or greater)")]
    InvalidAmount {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        amount: Decimal,
    },

    /// A computed amount does not fit in a `Decimal`
    #[error("The {field} is too large to compute exactly")]
    AmountOverflow {
        /// Name of the figure that overflowed
        field: &'static str,
    },

    /// A tax rate outside 0..=100
    #[error("Invalid tax rate: {rate}% (must be between 0 and 100)")]
    InvalidTaxRate {
        /// The rejected rate
        rate: Decimal,
    },

    /// A status that does not belong to the document kind
    #[error("Status '{status}' does not belong to the {kind} lifecycle")]
    InvalidStatus {
        /// Document kind
        kind: DocumentKind,
        /// The rejected status
        status: DocumentStatus,
    },

    /// The record does not exist or is not owned by the caller
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record type, e.g. `"invoice"` or `"client"`
        entity: &'static str,
        /// The identifier that failed to resolve
        id: String,
    },

    /// The document number is already used by this user
    #[error("{kind} number '{number}' already exists")]
    DuplicateNumber {
        /// Document kind
        kind: DocumentKind,
        /// The conflicting number
        number: String,
    },

    /// The operation needs a different current status
    #[error("Cannot {action} {kind} while it is {status}")]
    InvalidState {
        /// Document kind
        kind: DocumentKind,
        /// Current status
        status: DocumentStatus,
        /// Attempted action, e.g. `"send"`
        action: &'static str,
    },

    /// The requested status change is not part of the lifecycle
    #[error("Cannot move {kind} from {from} to {to}")]
    InvalidTransition {
        /// Document kind
        kind: DocumentKind,
        /// Current status
        from: DocumentStatus,
        /// Requested status
        to: DocumentStatus,
    },

    /// Deleting a document in this status is forbidden by policy
    #[error("Cannot delete {kind} while it is {status}")]
    DeleteForbidden {
        /// Document kind
        kind: DocumentKind,
        /// Current status
        status: DocumentStatus,
    },

    /// The record changed since the caller last read it
    #[error("Document {id} was modified by someone else; reload and try again")]
    StaleWrite {
        /// Document id
        id: Uuid,
    },

    /// The caller lacks the admin flag
    #[error("Admin access required")]
    Forbidden,

    /// The notification collaborator failed
    #[error("Notification error: {message}")]
    Notification {
        /// What went wrong
        message: String,
    },

    /// Remote store failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Email template failed to render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

/// Coarse classification used by callers to render a message or pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input, caught before any store call
    Validation,
    /// Unknown id or not owned by the caller
    NotFound,
    /// Duplicate number, illegal transition, policy refusal, stale write
    Conflict,
    /// Store or notification collaborator unreachable or erroring
    DependencyFailure,
}

impl Error {
    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. }
            | Self::Validation { .. }
            | Self::InvalidAmount { .. }
            | Self::AmountOverflow { .. }
            | Self::InvalidTaxRate { .. }
            | Self::InvalidStatus { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::DuplicateNumber { .. }
            | Self::InvalidState { .. }
            | Self::InvalidTransition { .. }
            | Self::DeleteForbidden { .. }
            | Self::StaleWrite { .. }
            | Self::Forbidden => ErrorCategory::Conflict,
            Self::Notification { .. } | Self::Database(_) | Self::Io(_) | Self::Template(_) => {
                ErrorCategory::DependencyFailure
            }
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Maps a unique-index violation on the document number to `DuplicateNumber`.
    pub(crate) fn from_insert(err: DbErr, kind: DocumentKind, number: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateNumber {
                kind,
                number: number.to_string(),
            },
            _ => Self::Database(err),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
