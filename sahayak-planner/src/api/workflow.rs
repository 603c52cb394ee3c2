//! Workflow API handlers
//!
//! Session lifecycle plus the inputs and triggers of the two-phase workflow.
//! Extraction and generation return 202 Accepted once the controller has
//! accepted the request; completion arrives over the session's SSE stream
//! (or by polling the snapshot).

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Language, LanguageOption, SourceImage, WorkflowConfiguration, WorkflowSnapshot},
    services::{Completion, PhaseController},
    AppState,
};

/// Multipart field carrying the syllabus image
const FILE_FIELD: &str = "file";

/// PUT /sessions/:session_id/text request
#[derive(Debug, Deserialize)]
pub struct EditTextRequest {
    pub extracted_text: String,
}

/// GET /languages
pub async fn list_languages() -> Json<Vec<LanguageOption>> {
    Json(Language::ALL.into_iter().map(LanguageOption::from).collect())
}

/// POST /sessions
///
/// Start a session with empty workflow state. Returns 201 with its snapshot.
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<WorkflowSnapshot>) {
    let controller = state.sessions.create().await;
    (StatusCode::CREATED, Json(controller.snapshot().await))
}

/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<WorkflowSnapshot>> {
    let controller = find_session(&state, session_id).await?;
    Ok(Json(controller.snapshot().await))
}

/// DELETE /sessions/:session_id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session not found: {}", session_id)))
    }
}

/// PUT /sessions/:session_id/config
pub async fn update_config(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(config): Json<WorkflowConfiguration>,
) -> ApiResult<Json<WorkflowSnapshot>> {
    let controller = find_session(&state, session_id).await?;
    tracing::debug!(session_id = %session_id, ?config, "Configuration updated");
    Ok(Json(controller.update_configuration(config).await))
}

/// POST /sessions/:session_id/image
///
/// Stage the image sent in the `file` multipart field, replacing any
/// previously staged image.
pub async fn upload_image(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<WorkflowSnapshot>> {
    let controller = find_session(&state, session_id).await?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        image = Some(SourceImage::new(file_name, content_type, bytes.to_vec()));
        break;
    }

    let image = image.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    if image.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }
    if !image.is_image() {
        return Err(ApiError::BadRequest(format!(
            "Uploaded file must be an image, got {}",
            image.content_type
        )));
    }
    if image.len() > state.max_image_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "Image is {} bytes, limit is {}",
            image.len(),
            state.max_image_bytes
        )));
    }

    tracing::info!(
        session_id = %session_id,
        file_name = %image.file_name,
        bytes = image.len(),
        "Image staged"
    );

    Ok(Json(controller.stage_image(image).await))
}

/// PUT /sessions/:session_id/text
///
/// Replace the extracted text with the user's correction.
pub async fn edit_text(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<EditTextRequest>,
) -> ApiResult<Json<WorkflowSnapshot>> {
    let controller = find_session(&state, session_id).await?;
    Ok(Json(controller.edit_extracted_text(request.extracted_text).await?))
}

/// POST /sessions/:session_id/extract
///
/// Begin extraction of the staged image. Returns 202 Accepted.
pub async fn start_extraction(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<WorkflowSnapshot>)> {
    let controller = find_session(&state, session_id).await?;
    let ticket = controller.begin_staged_extraction().await?;
    let snapshot = controller.snapshot().await;

    let app = state.clone();
    tokio::spawn(async move {
        let completion = controller.finish_extraction(ticket).await;
        record_outcome(&app, &controller, completion).await;
    });

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// POST /sessions/:session_id/generate
///
/// Begin generation from the stored configuration and text. Returns 202 Accepted.
pub async fn start_generation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<WorkflowSnapshot>)> {
    let controller = find_session(&state, session_id).await?;
    let ticket = controller.begin_current_generation().await?;
    let snapshot = controller.snapshot().await;

    let app = state.clone();
    tokio::spawn(async move {
        let completion = controller.finish_generation(ticket).await;
        record_outcome(&app, &controller, completion).await;
    });

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

async fn find_session(state: &AppState, session_id: Uuid) -> ApiResult<Arc<PhaseController>> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))
}

/// Keep the most recent workflow failure visible on /health
///
/// Uses the failure carried by the completion itself; the session state may
/// already belong to a newer request cycle.
async fn record_outcome(app: &AppState, controller: &PhaseController, completion: Completion) {
    if let Completion::Failed(message) = completion {
        app.record_error(format!("session {}: {}", controller.session_id(), message))
            .await;
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Build workflow routes
pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/languages", get(list_languages))
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", get(get_session).delete(delete_session))
        .route("/sessions/:session_id/config", put(update_config))
        .route("/sessions/:session_id/image", post(upload_image))
        .route("/sessions/:session_id/text", put(edit_text))
        .route("/sessions/:session_id/extract", post(start_extraction))
        .route("/sessions/:session_id/generate", post(start_generation))
        .route(
            "/sessions/:session_id/events",
            get(crate::api::session_event_stream),
        )
}
