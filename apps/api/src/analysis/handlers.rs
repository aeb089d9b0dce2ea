use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::analysis::{industries_from, AnalysisRequest};
use crate::errors::AppError;
use crate::notify::{Notice, Notifier};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    /// The generated analysis, usually an HTML document, passed through verbatim.
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct IndustriesResponse {
    pub industries: Vec<String>,
}

/// POST /api/v1/analysis
pub async fn handle_generate_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    request.validate()?;

    let url = state.webhooks.endpoints().analysis.clone();
    match state.webhooks.post_json(&url, &request.to_payload()).await {
        Ok(response) => {
            state.notices.notify(Notice::success(
                "Analysis generated successfully",
                "Your analysis is ready",
            ));
            Ok(Json(AnalysisResponse {
                result: response.body,
            }))
        }
        Err(e) => {
            state.notices.notify(
                Notice::error("Error generating analysis", "Please try again later")
                    .with_detail(e.to_string()),
            );
            Err(e.into())
        }
    }
}

/// GET /api/v1/analysis/industries
pub async fn handle_list_industries(
    State(state): State<AppState>,
) -> Result<Json<IndustriesResponse>, AppError> {
    let url = state.webhooks.endpoints().analysis.clone();
    let response = state.webhooks.post_empty(&url).await.map_err(|e| {
        state.notices.notify(
            Notice::error("Error", "Failed to load industries. Please try again.")
                .with_detail(e.to_string()),
        );
        e
    })?;

    let payload: Value = response.json()?;
    let industries = industries_from(&payload);
    state.notices.notify(Notice::success(
        "Industries loaded successfully",
        format!("{} industries available for analysis", industries.len()),
    ));
    Ok(Json(IndustriesResponse { industries }))
}
