use axum::{extract::State, Json};
use serde_json::Value;
use tracing::warn;

use crate::dashboard::{build_report, CampaignReport};
use crate::errors::AppError;
use crate::notify::{Notice, Notifier};
use crate::state::AppState;

/// GET /api/v1/dashboard
///
/// Pulls the contact rows from the dashboard webhook and aggregates them.
/// A payload that is not a list is reported as an empty campaign.
pub async fn handle_dashboard(
    State(state): State<AppState>,
) -> Result<Json<CampaignReport>, AppError> {
    let url = state.webhooks.endpoints().dashboard.clone();
    let payload: Value = match state.webhooks.post_empty(&url).await {
        Ok(response) => response.json()?,
        Err(e) => {
            state.notices.notify(
                Notice::error("Connection failed", "Could not load campaign data.")
                    .with_detail(e.to_string()),
            );
            return Err(e.into());
        }
    };

    let rows = match payload {
        Value::Array(rows) => rows,
        other => {
            warn!("Dashboard webhook returned a non-array payload: {other}");
            Vec::new()
        }
    };

    Ok(Json(build_report(&rows)))
}
