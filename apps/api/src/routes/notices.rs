use axum::{extract::State, Json};
use serde::Serialize;

use crate::notify::Notice;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
}

/// GET /api/v1/notices
/// Returns pending notices oldest first and clears them.
pub async fn handle_drain_notices(State(state): State<AppState>) -> Json<NoticesResponse> {
    Json(NoticesResponse {
        notices: state.notices.drain(),
    })
}
