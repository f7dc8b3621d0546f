//! Error types for domain operations

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in domain operations
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Entity, version or policy not found
    #[error("Not found: {entity_type} with key {key}")]
    NotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// Key that was searched for
        key: String,
    },

    /// Precondition on domain state failed (wrong status, empty scope, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Attempted lifecycle transition not permitted from the current status
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// Storage operation failed; the atomic close+insert pair either fully
    /// applied or not at all
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Remote domain call failed; propagated verbatim from the collaborator
    #[error("Network error calling {service}: {message}")]
    Network {
        /// Name of the remote service
        service: String,
        /// Error message from the service
        message: String,
    },

    /// Email dispatch failed; invitation workflows log and continue
    #[error("Email error: {0}")]
    Email(String),

    /// A multi-step orchestration failed after a non-compensable step
    /// succeeded; carries what was created so an operator can reconcile
    #[error("Partially completed: {description}")]
    PartiallyCompleted {
        /// What completed and what did not
        description: String,
        /// Journal entry left behind by a finalize run, if any
        journal_entry_id: Option<Uuid>,
    },
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Build a `NotFound` error
    pub fn not_found(entity_type: impl Into<String>, key: impl ToString) -> Self {
        DomainError::NotFound {
            entity_type: entity_type.into(),
            key: key.to_string(),
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_) | DomainError::InvalidStateTransition { .. }
        )
    }

    /// Check if retrying the whole operation could succeed.
    ///
    /// Network and persistence failures are transient; validation,
    /// not-found and transition errors require the caller to change the
    /// request. A partially-completed saga needs reconciliation, not a
    /// blind retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Network { .. } | DomainError::Persistence(_)
        )
    }
}
