use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::*;
use crate::vault::{Vault, VaultError};

// ============================================================
// Error Handling
// ============================================================

/// Wire shape of every gateway error: `{ "error": { "kind", "message" } }`.
/// `kind` is the stable string from [`VaultError::kind`]; clients switch
/// on it rather than on the human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Map a vault error onto an HTTP status and the error envelope.
///
/// Caller mistakes (missing files, bad names, illegal transitions) keep
/// their message; unexpected engine failures are logged in full and
/// reported generically.
fn vault_error(e: VaultError) -> ApiError {
    let status = match &e {
        VaultError::WorkingFileMissing { .. }
        | VaultError::VersionNotFound { .. }
        | VaultError::NotFound { .. } => StatusCode::NOT_FOUND,
        VaultError::InvalidFileName { .. } => StatusCode::BAD_REQUEST,
        VaultError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        VaultError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
        VaultError::CorruptMetadata { .. } | VaultError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("vault error: {e}");
        "internal vault error".to_string()
    } else {
        tracing::warn!("vault error: {e}");
        e.to_string()
    };

    (
        status,
        Json(ErrorBody {
            error: ErrorDetail {
                kind: e.kind(),
                message,
            },
        }),
    )
}

/// Query carried by read operations: which project root to look in.
#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub project_path: PathBuf,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn init_project(
    State(vault): State<Vault>,
    Json(input): Json<InitProjectInput>,
) -> Result<StatusCode, ApiError> {
    vault
        .init_project(&input.project_path)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(vault_error)
}

pub async fn list_parts(
    State(vault): State<Vault>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<PartSummary>>, ApiError> {
    vault
        .list_parts(&query.project_path)
        .map(Json)
        .map_err(vault_error)
}

// ============================================================
// Versions
// ============================================================

pub async fn create_version(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Json(input): Json<CreateVersionInput>,
) -> Result<(StatusCode, Json<VersionRecord>), ApiError> {
    vault
        .create_version(
            &input.project_path,
            &file_name,
            input.author.as_deref(),
            &input.change_note,
        )
        .map(|record| (StatusCode::CREATED, Json(record)))
        .map_err(vault_error)
}

pub async fn version_history(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<VersionRecord>>, ApiError> {
    vault
        .version_history(&query.project_path, &file_name)
        .map(Json)
        .map_err(vault_error)
}

pub async fn latest_version(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<LatestVersionResponse>, ApiError> {
    vault
        .latest_version(&query.project_path, &file_name)
        .map(|version| Json(LatestVersionResponse { version }))
        .map_err(vault_error)
}

// ============================================================
// Lifecycle transitions
// ============================================================

pub async fn freeze_version(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Json(input): Json<CreateVersionInput>,
) -> Result<Json<FreezeResponse>, ApiError> {
    vault
        .freeze(
            &input.project_path,
            &file_name,
            input.author.as_deref(),
            &input.change_note,
        )
        .map(|record| {
            Json(FreezeResponse {
                version: record.version,
            })
        })
        .map_err(vault_error)
}

pub async fn release_version(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Json(input): Json<VersionRefInput>,
) -> Result<StatusCode, ApiError> {
    vault
        .release(&input.project_path, &file_name, &input.version)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(vault_error)
}

pub async fn rework_version(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Json(input): Json<VersionRefInput>,
) -> Result<StatusCode, ApiError> {
    vault
        .rework(&input.project_path, &file_name, &input.version)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(vault_error)
}

// ============================================================
// State queries
// ============================================================

pub async fn part_state(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<PartStateResponse>, ApiError> {
    vault
        .part_state(&query.project_path, &file_name)
        .map(|state| Json(PartStateResponse { state }))
        .map_err(vault_error)
}

pub async fn part_summary(
    State(vault): State<Vault>,
    Path(file_name): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<PartSummary>, ApiError> {
    vault
        .part_summary(&query.project_path, &file_name)
        .map(Json)
        .map_err(vault_error)
}
