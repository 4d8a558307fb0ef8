//! Engine error type and its classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::document::InvalidStoredState;
use crate::domain::ids::UserId;
use crate::domain::validation::Violation;
use crate::ports::StoreError;

pub const INVALID_STATE_MESSAGE: &str =
    "Please reach out to the administrator as your user status is not recognized as valid.";

/// Operational classification of a [`StatusError`].
///
/// Callers map a kind to a response code with [`ErrorKind::status_code`]. None
/// of the kinds is retried by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request broke a status rule.
    Validation,
    /// No record (or no user) to act on.
    NotFound,
    /// The operation does not apply to the record's current state.
    Forbidden,
    /// Stored data holds a state outside the closed enum.
    InvalidState,
    /// The document store failed.
    Store,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::InvalidState | ErrorKind::Store => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Bad Request",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::InvalidState | ErrorKind::Store => "Internal Server Error",
        }
    }
}

#[derive(Debug, Error)]
pub enum StatusError {
    #[error(transparent)]
    Validation(#[from] Violation),

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Please reach out to the administrator as your user status is not recognized as valid.")]
    InvalidState {
        user_id: UserId,
        #[source]
        source: InvalidStoredState,
    },

    #[error(transparent)]
    Store(StoreError),
}

impl StatusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatusError::Validation(_) => ErrorKind::Validation,
            StatusError::NotFound { .. } => ErrorKind::NotFound,
            StatusError::Forbidden { .. } => ErrorKind::Forbidden,
            StatusError::InvalidState { .. } => ErrorKind::InvalidState,
            StatusError::Store(_) => ErrorKind::Store,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn status_not_found(user_id: &UserId) -> Self {
        StatusError::NotFound {
            message: format!("User status not found for user {user_id}"),
        }
    }
}

impl From<StoreError> for StatusError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidState { user_id, source } => {
                StatusError::InvalidState { user_id, source }
            }
            other => StatusError::Store(other),
        }
    }
}
