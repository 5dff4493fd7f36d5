//! HTTP and WebSocket handlers.

use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use vidseq_core::{Error, SearchResponse};
use vidseq_media::{clip_download_name, extract_clip};

use crate::state::AppState;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Wrapper turning core errors into HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidRange { .. } | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::SourceUnavailable(_) => StatusCode::NOT_FOUND,
            Error::DimensionMismatch { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// =============================================================================
// UPLOAD
// =============================================================================

#[derive(Serialize)]
pub struct UploadResponse {
    pub task_id: Uuid,
}

/// `POST /api/upload`: store the uploaded video and start background
/// ingestion, returning the task id immediately.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Config(format!("bad multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = sanitize_filename(field.file_name().unwrap_or("upload.mp4"));
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Config(format!("failed to read upload: {}", e)))?;

        tokio::fs::create_dir_all(&state.video_dir).await.map_err(Error::Io)?;

        let task_id = state.tasks.create(None).await;
        let video_path = state.video_dir.join(format!("{}_{}", task_id, filename));
        tokio::fs::write(&video_path, &data).await.map_err(Error::Io)?;

        info!(
            task_id = %task_id,
            video_path = %video_path.display(),
            size = data.len(),
            "Video uploaded, starting ingestion"
        );

        let orchestrator = state.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator.run(task_id, video_path).await;
        });

        return Ok(Json(UploadResponse { task_id }));
    }

    Err(Error::Config("multipart body had no \"file\" field".to_string()).into())
}

/// Strip path components and control characters out of a client-supplied
/// filename.
fn sanitize_filename(name: &str) -> String {
    let base = FsPath::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.mp4".to_string());
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '/' && *c != '\\')
        .collect();
    if cleaned.is_empty() {
        "upload.mp4".to_string()
    } else {
        cleaned
    }
}

// =============================================================================
// PROGRESS (WEBSOCKET)
// =============================================================================

/// `GET /ws/:task_id`: stream progress events for one task.
pub async fn ws_progress(
    ws: WebSocketUpgrade,
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_progress_socket(socket, task_id, state))
}

async fn handle_progress_socket(socket: WebSocket, task_id: Uuid, state: AppState) {
    use futures::{SinkExt, StreamExt};

    let mut rx = state.progress.subscribe(task_id).await;
    info!(task_id = %task_id, "Progress observer connected");

    let (mut sender, mut receiver) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(task_id = %task_id, error = %e, "Unserializable progress event"),
            }
        }
        // Channel closed: terminal event delivered or observer replaced.
        let _ = sender.send(Message::Close(None)).await;
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    // Client went away (or the channel drained); drop the registry entry.
    state.progress.unsubscribe(task_id).await;
    info!(task_id = %task_id, "Progress observer disconnected");
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Optional task id correlating with a progress subscription.
    pub task_id: Option<Uuid>,
}

/// `POST /api/search`: embed the query, retrieve matches, and return
/// assembled sequences ranked by relevance.
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let task_id = request.task_id.unwrap_or_else(Uuid::new_v4);
    let sequences = state.pipeline.search(task_id, &request.query).await?;
    Ok(Json(SearchResponse {
        query: request.query,
        sequences,
    }))
}

// =============================================================================
// EXTRACT
// =============================================================================

#[derive(Deserialize)]
pub struct ExtractParams {
    pub video_path: String,
    pub time_start: f64,
    pub time_end: f64,
}

/// `GET /api/extract`: cut the requested range out of a source video and
/// stream it back as a downloadable MP4. The transient file is deleted
/// when the stream is dropped, on full consumption and early disconnect
/// alike.
pub async fn extract(
    State(state): State<AppState>,
    Query(params): Query<ExtractParams>,
) -> Result<Response, ApiError> {
    let video_path = resolve_video_path(&state.video_dir, &params.video_path)?;

    let clip = extract_clip(&video_path, params.time_start, params.time_end).await?;
    let stream = clip.into_stream().await?;

    let filename = clip_download_name(params.time_start, params.time_end);
    let response = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| Error::Internal(format!("failed to build response: {}", e)))?;

    Ok(response)
}

/// Confine a client-supplied video reference to the upload directory.
fn resolve_video_path(video_dir: &FsPath, requested: &str) -> Result<PathBuf, Error> {
    let requested = FsPath::new(requested);
    if requested
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return Err(Error::Config(format!(
            "video path must be relative to the upload directory: {}",
            requested.display()
        )));
    }

    // Accept both bare names and paths already prefixed with the dir.
    let stripped = requested.strip_prefix(video_dir).unwrap_or(requested);
    Ok(video_dir.join(stripped))
}

// =============================================================================
// HEALTH
// =============================================================================

/// `GET /api/health`: liveness plus provider reachability.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let provider_healthy = state.provider.health_check().await.unwrap_or(false);
    Json(serde_json::json!({
        "status": "ok",
        "provider_healthy": provider_healthy,
        "tracked_tasks": state.tasks.len().await,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename("dir/clip.mp4"), "clip.mp4");
    }

    #[test]
    fn sanitize_never_returns_empty() {
        assert_eq!(sanitize_filename(""), "upload.mp4");
        assert_eq!(sanitize_filename("///"), "upload.mp4");
    }

    #[test]
    fn resolve_rejects_parent_traversal() {
        let err = resolve_video_path(FsPath::new("videos"), "../secrets.mp4").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn resolve_rejects_absolute_paths() {
        let err = resolve_video_path(FsPath::new("videos"), "/etc/passwd").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn resolve_accepts_bare_and_prefixed_names() {
        let dir = FsPath::new("videos");
        assert_eq!(
            resolve_video_path(dir, "t1_clip.mp4").unwrap(),
            PathBuf::from("videos/t1_clip.mp4")
        );
        assert_eq!(
            resolve_video_path(dir, "videos/t1_clip.mp4").unwrap(),
            PathBuf::from("videos/t1_clip.mp4")
        );
    }

    #[test]
    fn api_error_status_mapping() {
        let resp = ApiError(Error::InvalidRange { start: 5.0, end: 1.0 }).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError(Error::SourceUnavailable("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError(Error::Index("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
