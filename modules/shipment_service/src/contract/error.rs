//! Contract error types for the shipment service
//!
//! These errors are transport-agnostic and used for inter-module communication.

/// Shipment service domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingError {
    /// Entity not found
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (shipment, package, kit, ...)
        resource: String,
        /// Resource identifier
        id: String,
    },
    /// A lifecycle action was requested in a state that does not allow it
    #[error("cannot {action} shipment in status {status}")]
    InvalidTransition {
        /// Requested action (finalize, cancel, reopen, lose)
        action: String,
        /// Current status label
        status: String,
    },
    /// Validation error
    #[error("validation error: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },
    /// Conflict (duplicate, already exists, etc.)
    #[error("conflict: {reason}")]
    Conflict {
        /// Conflict reason
        reason: String,
    },
    /// Internal error
    #[error("internal error")]
    Internal,
}

impl TrackingError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
