//! Structured error types for store and service operations.

use serde::Serialize;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    InvalidFieldValue,

    // Not found errors
    ListNotFound,
    UserNotFound,
    TodoIndexOutOfBounds,

    // Ownership errors
    PermissionDenied,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Error for store and service operations.
///
/// `NotFound`-class variants signal "record absent"; callers may create a
/// default instead of failing. `Database` covers transient IO (retryable),
/// while `PermissionDenied` is fatal and surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Todo index {index} out of bounds for list {list_id}")]
    TodoIndexOutOfBounds { list_id: String, index: usize },

    #[error("User {user_id} does not own list {list_id}")]
    PermissionDenied { user_id: String, list_id: String },

    #[error("{field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::ListNotFound(_) => ErrorCode::ListNotFound,
            StoreError::UserNotFound(_) => ErrorCode::UserNotFound,
            StoreError::TodoIndexOutOfBounds { .. } => ErrorCode::TodoIndexOutOfBounds,
            StoreError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            StoreError::InvalidValue { .. } => ErrorCode::InvalidFieldValue,
            StoreError::Database(_) => ErrorCode::DatabaseError,
            StoreError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// True when the record was simply absent and a caller may create it.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ListNotFound(_) | StoreError::UserNotFound(_)
        )
    }

    /// Transient IO: safe to retry the whole operation.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Internal(err.into())
    }
}

/// Result type for store and service operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
