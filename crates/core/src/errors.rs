use thiserror::Error;

use crate::domain::claim::{ClaimId, ClaimStatus};
use crate::domain::user::Role;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} cannot exceed {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must lie in {bounds} (got {value})")]
    OutOfRange { field: &'static str, bounds: String, value: String },
    #[error("a reason is required when rejecting a claim")]
    MissingRejectionNotes,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("claim {0} was not found")]
    NotFound(ClaimId),
    #[error("claim {id} is {status}; {action} is only allowed while the claim is pending")]
    InvalidState { id: ClaimId, status: ClaimStatus, action: &'static str },
    #[error("claim {id} is not ready for review by {role} or was already reviewed")]
    NotEligible { id: ClaimId, role: Role },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("csv codec failure: {0}")]
    Codec(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<ValidationError> for ApplicationError {
    fn from(value: ValidationError) -> Self {
        Self::Workflow(WorkflowError::Validation(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "The claim could not be saved. Check the fields and try again.",
            Self::NotFound { .. } => "The claim no longer exists.",
            Self::Conflict { .. } => {
                "The claim is not in a state that allows this action. Refresh and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    /// Stable machine-readable class, used in CLI and API payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "invalid_state",
            Self::Internal { .. } => "internal",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Workflow(WorkflowError::Validation(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Workflow(error @ WorkflowError::NotFound(_)) => {
                Self::NotFound { message: error.to_string(), correlation_id }
            }
            ApplicationError::Workflow(
                error @ (WorkflowError::InvalidState { .. } | WorkflowError::NotEligible { .. }),
            ) => Self::Conflict { message: error.to_string(), correlation_id },
            ApplicationError::Persistence(message)
            | ApplicationError::Codec(message)
            | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::claim::{ClaimId, ClaimStatus};
    use crate::domain::user::Role;
    use crate::errors::{ApplicationError, InterfaceError, ValidationError, WorkflowError};

    #[test]
    fn validation_error_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::from(ValidationError::Required { field: "title" }).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message == "title is required"
        ));
        assert_eq!(interface.error_class(), "validation");
    }

    #[test]
    fn not_eligible_maps_to_conflict_with_user_safe_message() {
        let interface = ApplicationError::from(WorkflowError::NotEligible {
            id: ClaimId(3),
            role: Role::Administrator,
        })
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Conflict { .. }));
        assert_eq!(
            interface.user_message(),
            "The claim is not in a state that allows this action. Refresh and try again."
        );
    }

    #[test]
    fn invalid_state_message_names_the_status() {
        let error = WorkflowError::InvalidState {
            id: ClaimId(9),
            status: ClaimStatus::UnderReview,
            action: "deletion",
        };

        assert_eq!(
            error.to_string(),
            "claim #9 is UnderReview; deletion is only allowed while the claim is pending"
        );
    }

    #[test]
    fn persistence_error_maps_to_internal() {
        let interface =
            ApplicationError::Persistence("store unavailable".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.error_class(), "internal");
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
