//! Error types for the backup server.
//!
//! Every failure leaves as the `{success: false, error}` envelope. Status
//! codes follow the wire protocol: a lookup or storage failure is a 500, a
//! body that isn't a snapshot is a 400.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tally_core::ApiResponse;

/// Result type alias for backup store operations.
pub type BackupResult<T> = Result<T, BackupError>;

/// Backup server errors.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid backup content: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackupError {
    /// HTTP status sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            BackupError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BackupError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            BackupError::NotFound(_) | BackupError::Io(_) | BackupError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for BackupError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            BackupError::PayloadTooLarge
        } else {
            BackupError::InvalidRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for BackupError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Backup request failed");
        } else {
            tracing::warn!(error = %self, "Backup request rejected");
        }

        (status, Json(ApiResponse::<()>::failure(self.to_string()))).into_response()
    }
}
