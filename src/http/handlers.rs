use super::state::AppState;
use crate::fallback;
use crate::registry::{RegistryObserver, UploadHandle, UploadRecord};
use crate::upload::artifact::content_type_for;
use crate::upload::{RecordingArtifact, UploadSession, UploadStrategy};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartUploadRequest {
    /// Finished recording, absolute or relative to the recordings directory
    pub path: PathBuf,

    /// Remote filename (default: the local file name)
    pub filename: Option<String>,

    /// Bearer token (default: the configured token)
    pub auth_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartUploadResponse {
    pub upload_id: UploadHandle,
    pub filename: String,
    pub size: u64,
    pub strategy: UploadStrategy,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// Resolve a requested recording path, refusing anything that does not
/// canonicalize to a file under `recordings_dir`
async fn resolve_recording(
    recordings_dir: &FsPath,
    requested: &FsPath,
) -> Result<PathBuf, axum::response::Response> {
    let root = tokio::fs::canonicalize(recordings_dir).await.map_err(|e| {
        error!("Recordings directory {} unavailable: {}", recordings_dir.display(), e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Recordings directory is unavailable".to_string(),
        )
    })?;

    let candidate = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        root.join(requested)
    };

    let resolved = tokio::fs::canonicalize(&candidate).await.map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Failed to read recording {}: {}", requested.display(), e),
        )
    })?;

    if !resolved.starts_with(&root) {
        warn!("Rejected recording outside {}: {}", root.display(), requested.display());
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Recording {} is outside the recordings directory", requested.display()),
        ));
    }

    Ok(resolved)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /uploads
/// Read a finished recording and upload it in the background
pub async fn start_upload(
    State(state): State<AppState>,
    Json(req): Json<StartUploadRequest>,
) -> impl IntoResponse {
    let auth_token = match req.auth_token.or_else(|| state.auth_token.clone()) {
        Some(token) if !token.trim().is_empty() => token,
        _ => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "No authentication token available. Please login first.".to_string(),
            )
        }
    };

    let recording = match resolve_recording(&state.recordings_dir, &req.path).await {
        Ok(recording) => recording,
        Err(response) => return response,
    };

    let data = match tokio::fs::read(&recording).await {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to read recording {}: {}", recording.display(), e);
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read recording {}: {}", req.path.display(), e),
            );
        }
    };

    let content_type = content_type_for(&req.path)
        .map(str::to_string)
        .unwrap_or_else(|| state.default_content_type.clone());
    let artifact = RecordingArtifact::new(data, content_type);

    let filename = req
        .filename
        .or_else(|| {
            req.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| fallback::default_filename(Utc::now()));

    let size = artifact.len();
    let handle = state.registry.begin(filename.clone(), size);
    let observer = Arc::new(RegistryObserver::new(Arc::clone(&state.registry), handle));

    let mut session = UploadSession::new(
        artifact,
        filename.clone(),
        auth_token,
        Arc::clone(&state.api),
        state.upload_config.clone(),
    )
    .with_id(handle.as_uuid())
    .with_observer(observer);
    let strategy = session.strategy();

    info!("Upload {} accepted: {} ({} bytes, {:?})", handle, filename, size, strategy);

    let fallback_dir = state.fallback_dir.clone();
    tokio::spawn(async move {
        if let Err(e) = session.run().await {
            warn!("Upload {} failed, saving locally: {}", session.id(), e);

            let id = session.id();
            let filename = session.filename().to_string();
            let artifact = session.artifact().clone();
            let saved = tokio::task::spawn_blocking(move || {
                fallback::save_locally(&fallback_dir, &filename, &artifact)
            })
            .await;

            match saved {
                Ok(Ok(path)) => info!("Upload {} saved to {}", id, path.display()),
                Ok(Err(save_err)) => error!("Local save failed for {}: {:#}", id, save_err),
                Err(join_err) => error!("Local save task for {} panicked: {}", id, join_err),
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(StartUploadResponse {
            upload_id: handle,
            filename,
            size,
            strategy,
            status: "uploading".to_string(),
        }),
    )
        .into_response()
}

/// GET /uploads
/// Retained upload records, oldest first
pub async fn list_uploads(State(state): State<AppState>) -> Json<Vec<UploadRecord>> {
    Json(state.registry.snapshot())
}

/// GET /uploads/:upload_id
/// Progress of one upload
pub async fn get_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.registry.get(UploadHandle::from_uuid(upload_id)) {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Upload {} not found", upload_id),
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
