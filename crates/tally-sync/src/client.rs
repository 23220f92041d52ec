//! # Backup Client
//!
//! The backup service as seen from the books: four calls over HTTP/JSON.
//!
//! ## Wire Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Call      Request                     Response data                   │
//! │  ────────  ──────────────────────────  ──────────────────────────────  │
//! │  save      POST /backup  {snapshot}    {filename}                      │
//! │  list      GET  /backups               [{filename, date}] newest first │
//! │  latest    GET  /backup/latest         snapshot | null                 │
//! │  get       GET  /backup/{filename}     snapshot                        │
//! │                                                                         │
//! │  Every response is wrapped: {success, data?, error?}                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `success: false` becomes [`SyncError::Remote`] regardless of the HTTP
//! status. A status error without a readable envelope becomes
//! [`SyncError::HttpStatus`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tally_core::{ApiResponse, BackupInfo, BackupSnapshot, SavedBackup};
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

/// Longest slice of a non-envelope body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

// =============================================================================
// Backup Client Port
// =============================================================================

/// Remote snapshot storage.
#[async_trait]
pub trait BackupClient: Send + Sync {
    /// Stores a snapshot and returns its assigned filename.
    async fn save(&self, snapshot: &BackupSnapshot) -> SyncResult<SavedBackup>;

    /// Lists retained snapshots, newest first.
    async fn list(&self) -> SyncResult<Vec<BackupInfo>>;

    /// The newest snapshot, or `None` when nothing has been saved yet.
    async fn latest(&self) -> SyncResult<Option<BackupSnapshot>>;

    /// The snapshot stored under `filename`.
    async fn get(&self, filename: &str) -> SyncResult<BackupSnapshot>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`BackupClient`] over the backup service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackupClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackupClient {
    /// Creates a client from sync configuration.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Self::with_base_url(config.backup_url(), config.request_timeout())
    }

    /// Creates a client for `base_url` (e.g. `http://127.0.0.1:3001/api`).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(HttpBackupClient { http, base_url })
    }

    /// Base URL requests are built on.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Reads the envelope and returns its `data`.
    async fn envelope(response: reqwest::Response) -> SyncResult<Option<Value>> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<Value>>(&body) {
            Ok(envelope) if envelope.success => Ok(envelope.data),
            Ok(envelope) => Err(SyncError::Remote(
                envelope
                    .error
                    .unwrap_or_else(|| format!("request failed with HTTP {}", status.as_u16())),
            )),
            Err(_) if !status.is_success() => Err(SyncError::HttpStatus {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            }),
            Err(e) => Err(SyncError::InvalidResponse(e.to_string())),
        }
    }
}

/// Decodes a response `data` field.
fn decode<T: DeserializeOwned>(data: Option<Value>, what: &str) -> SyncResult<T> {
    let value = data.ok_or_else(|| SyncError::InvalidResponse(format!("missing {what}")))?;
    serde_json::from_value(value).map_err(|e| SyncError::InvalidResponse(format!("{what}: {e}")))
}

/// Decodes a snapshot payload, checking the five-collection shape.
pub fn decode_snapshot(value: Value) -> SyncResult<BackupSnapshot> {
    serde_json::from_value(value).map_err(|e| SyncError::InvalidSnapshot(e.to_string()))
}

#[async_trait]
impl BackupClient for HttpBackupClient {
    async fn save(&self, snapshot: &BackupSnapshot) -> SyncResult<SavedBackup> {
        let response = self
            .http
            .post(self.url("backup"))
            .json(snapshot)
            .send()
            .await?;

        let saved: SavedBackup = decode(Self::envelope(response).await?, "saved backup")?;
        debug!(filename = %saved.filename, "Snapshot uploaded");
        Ok(saved)
    }

    async fn list(&self) -> SyncResult<Vec<BackupInfo>> {
        let response = self.http.get(self.url("backups")).send().await?;

        match Self::envelope(response).await? {
            Some(data) => decode(Some(data), "backup list"),
            None => Ok(Vec::new()),
        }
    }

    async fn latest(&self) -> SyncResult<Option<BackupSnapshot>> {
        let response = self.http.get(self.url("backup/latest")).send().await?;

        match Self::envelope(response).await? {
            Some(Value::Null) | None => Ok(None),
            Some(data) => decode_snapshot(data).map(Some),
        }
    }

    async fn get(&self, filename: &str) -> SyncResult<BackupSnapshot> {
        let response = self
            .http
            .get(self.url(&format!("backup/{filename}")))
            .send()
            .await?;

        match Self::envelope(response).await? {
            Some(Value::Null) | None => Err(SyncError::InvalidSnapshot(format!(
                "backup {filename} has no content"
            ))),
            Some(data) => decode_snapshot(data),
        }
    }
}
