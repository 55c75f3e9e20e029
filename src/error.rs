use crate::models::MachineType;
use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error taxonomy for workshop operations.
///
/// Every error is returned as a typed result to the API layer; none are fatal
/// to the process. Failed attempts are never recorded in the activity log.
#[derive(Error, Debug)]
pub enum WorkshopError {
    /// Operation attempted from a disallowed status.
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    /// No eligible idle machine of the required type, including after the
    /// maintenance sweep removed candidates.
    #[error("no idle machine of type '{machine_type}' available")]
    NoMachineAvailable { machine_type: MachineType },

    /// Referenced entity id does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// Lost the atomic machine-claim race. The assignment engine retries once
    /// transparently; a second loss surfaces as `NoMachineAvailable`, so this
    /// variant is only seen on claim paths with no retry budget left.
    #[error("machine {machine_id} was claimed concurrently")]
    MachineConflict { machine_id: Uuid },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl WorkshopError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for WorkshopError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict { id, .. } => Self::MachineConflict { machine_id: id },
            StoreError::TaskConflict { id, expected } => Self::InvalidState {
                reason: format!("task {id} was concurrently moved out of '{expected}'"),
            },
        }
    }
}

/// Result type alias for workshop operations.
pub type Result<T> = std::result::Result<T, WorkshopError>;
