//! Axum route handlers for the template review API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;
use crate::templates::model::{TemplateId, TemplateStatus};
use crate::templates::preview::preview_html;
use crate::templates::session::{RefreshOutcome, ReviewSnapshot, SaveOutcome, TemplateView};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub status: TemplateStatus,
    /// Only meaningful with `Rejected`; ignored otherwise.
    #[serde(default)]
    pub change_request: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub template: TemplateView,
    pub change_request_required: bool,
    pub changed_count: usize,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refresh: RefreshOutcome,
    pub snapshot: ReviewSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub save: SaveOutcome,
    pub message: String,
    pub changed_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub count: usize,
    pub templates: Vec<TemplateView>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub company: String,
    pub label: String,
    pub subject: String,
    pub html: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/templates
pub async fn handle_snapshot(State(state): State<AppState>) -> Json<ReviewSnapshot> {
    Json(state.review.snapshot().await)
}

/// POST /api/v1/templates/refresh
///
/// On failure the previously loaded templates stay in place.
pub async fn handle_refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let refresh = state.review.refresh().await?;
    Ok(Json(RefreshResponse {
        refresh,
        snapshot: state.review.snapshot().await,
    }))
}

/// GET /api/v1/templates/changes
pub async fn handle_changes(State(state): State<AppState>) -> Json<ChangesResponse> {
    let templates = state.review.changed().await;
    Json(ChangesResponse {
        count: templates.len(),
        templates,
    })
}

/// PATCH /api/v1/templates/:id
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let id = TemplateId::from(id);
    let outcome = state
        .review
        .edit(&id, request.status, request.change_request)
        .await?;

    Ok(Json(EditResponse {
        template: TemplateView::from(&outcome.template),
        change_request_required: outcome.change_request_required,
        changed_count: state.review.snapshot().await.changed_count,
    }))
}

/// GET /api/v1/templates/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PreviewResponse>, AppError> {
    let id = TemplateId::from(id);
    let template = state
        .review
        .template(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    Ok(Json(PreviewResponse {
        label: template.label(),
        html: preview_html(&template.content),
        company: template.company,
        subject: template.subject,
    }))
}

/// POST /api/v1/templates/save
///
/// Returns 409 while another save is in flight.
pub async fn handle_save(State(state): State<AppState>) -> Result<Json<SaveResponse>, AppError> {
    let save = state.review.save_changes().await?;
    let message = match &save {
        SaveOutcome::NothingToSave => "No changes to save".to_string(),
        SaveOutcome::Saved { submitted, .. } => {
            format!("{submitted} template(s) saved successfully!")
        }
    };

    Ok(Json(SaveResponse {
        save,
        message,
        changed_count: state.review.snapshot().await.changed_count,
    }))
}

/// POST /api/v1/templates/generate
///
/// Accepted once the engine has started generating; a re-fetch follows shortly.
pub async fn handle_generate(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.review.trigger_generation().await?;
    Ok(StatusCode::ACCEPTED)
}
