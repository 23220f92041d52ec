//! # Sync Error Types
//!
//! Error types for backup push, restore and sync configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Network        │  │  Remote                 │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  InvalidResponse        │ │
//! │  │  ConfigLoad/Save│  │  HttpStatus     │  │  InvalidSnapshot        │ │
//! │  │                 │  │                 │  │  UnsupportedVersion     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │  Local Store    │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  Store(DbError) │  │  ShuttingDown   │                              │
//! │  │                 │  │  ChannelError   │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Push failures stop at the Synchronizer: they are logged and recorded in
//! its status, never returned to the code that made the local write.

use tally_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering every backup and restore failure.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid backup service URL.
    #[error("Invalid backup URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The backup service could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("Backup request timed out")]
    Timeout,

    /// Non-success status without a readable envelope.
    #[error("Backup service returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// The service answered `success: false`.
    #[error("Backup service error: {0}")]
    Remote(String),

    /// The response body is not the expected envelope.
    #[error("Invalid response from backup service: {0}")]
    InvalidResponse(String),

    /// The snapshot payload doesn't have the five-collection shape.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The snapshot was written by an incompatible version.
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(String),

    // =========================================================================
    // Local Store Errors
    // =========================================================================
    /// Export or restore against the local books failed.
    #[error("Local store error: {0}")]
    Store(#[from] DbError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// The synchronizer is shutting down.
    #[error("Synchronizer is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            SyncError::InvalidUrl(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if a later attempt may succeed without any change on
    /// this side.
    ///
    /// ## Retryable Errors
    /// - Network failures and timeouts
    /// - 5xx responses without an envelope
    /// - Local store failures (a transient read error during export)
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network(_) | SyncError::Timeout | SyncError::Store(_) => true,
            SyncError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
