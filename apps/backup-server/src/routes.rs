//! HTTP routes.
//!
//! | Method | Path                     | Answer                                  |
//! |--------|--------------------------|-----------------------------------------|
//! | POST   | `/api/backup`            | `{success, data: {filename}}`           |
//! | GET    | `/api/backups`           | `{success, data: [{filename, date}]}`   |
//! | GET    | `/api/backup/latest`     | newest snapshot, or no `data` when none |
//! | GET    | `/api/backup/{filename}` | that snapshot                           |
//! | GET    | `/health`                | `OK`                                    |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tally_core::{ApiResponse, BackupInfo, BackupSnapshot, SavedBackup};

use crate::error::BackupResult;
use crate::store::BackupStore;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BackupStore>,
}

/// Builds the router over `store`, rejecting bodies above `body_limit` bytes.
pub fn router(store: Arc<BackupStore>, body_limit: usize) -> Router {
    Router::new()
        .route("/api/backup", post(save_backup))
        .route("/api/backups", get(list_backups))
        .route("/api/backup/latest", get(latest_backup))
        .route("/api/backup/{filename}", get(get_backup))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState { store })
}

async fn save_backup(
    State(state): State<AppState>,
    payload: Result<Json<BackupSnapshot>, JsonRejection>,
) -> BackupResult<Json<ApiResponse<SavedBackup>>> {
    let Json(snapshot) = payload?;
    let saved = state.store.save(&snapshot).await?;
    Ok(Json(ApiResponse::ok(saved)))
}

async fn list_backups(
    State(state): State<AppState>,
) -> BackupResult<Json<ApiResponse<Vec<BackupInfo>>>> {
    Ok(Json(ApiResponse::ok(state.store.list().await?)))
}

async fn latest_backup(
    State(state): State<AppState>,
) -> BackupResult<Json<ApiResponse<BackupSnapshot>>> {
    Ok(Json(match state.store.latest().await? {
        Some(snapshot) => ApiResponse::ok(snapshot),
        None => ApiResponse::empty(),
    }))
}

async fn get_backup(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> BackupResult<Json<ApiResponse<BackupSnapshot>>> {
    Ok(Json(ApiResponse::ok(state.store.get(&filename).await?)))
}

async fn health() -> &'static str {
    "OK"
}
