use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::leads::{
    contacts_from, lead_company_from, Contact, LeadCompany, ScrapeRequest, SendEmailsRequest,
};
use crate::notify::{Notice, Notifier};
use crate::state::AppState;
use crate::templates::flatten::normalize_company_name;
use crate::webhook_client::WebhookError;

#[derive(Debug, Serialize)]
pub struct CompaniesResponse {
    pub companies: Vec<LeadCompany>,
}

#[derive(Debug, Serialize)]
pub struct ContactsResponse {
    pub company: String,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub accepted: bool,
    /// Whatever JSON the engine acknowledged with, if any.
    pub engine_response: Option<Value>,
}

fn decode_error(url: &str, e: serde_json::Error) -> AppError {
    AppError::Webhook(WebhookError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// GET /api/v1/leads/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
) -> Result<Json<CompaniesResponse>, AppError> {
    let url = state.webhooks.endpoints().leads.clone();
    let response = state
        .webhooks
        .post_json(&url, &json!({ "action": "get_companies" }))
        .await
        .map_err(|e| {
            state.notices.notify(
                Notice::error("Error", "Failed to load companies. Please try again later.")
                    .with_detail(e.to_string()),
            );
            e
        })?;

    let payload: Value = response.json()?;
    let companies: Vec<LeadCompany> = payload
        .as_array()
        .map(|rows| rows.iter().map(lead_company_from).collect())
        .unwrap_or_default();

    Ok(Json(CompaniesResponse { companies }))
}

/// GET /api/v1/leads/companies/:name/contacts
pub async fn handle_company_contacts(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ContactsResponse>, AppError> {
    let company = normalize_company_name(&name);
    if company.is_empty() {
        return Err(AppError::Validation("company name cannot be empty".to_string()));
    }

    let url = state.webhooks.endpoints().leads.clone();
    let response = state
        .webhooks
        .post_json(
            &url,
            &json!({ "action": "company_click", "company_name": company }),
        )
        .await
        .map_err(|e| {
            state.notices.notify(
                Notice::error("Error", "Failed to load contact details. Please try again later.")
                    .with_detail(e.to_string()),
            );
            e
        })?;

    let payload: Value = response.json()?;
    let contacts = contacts_from(payload).map_err(|e| decode_error(&url, e))?;

    Ok(Json(ContactsResponse { company, contacts }))
}

/// POST /api/v1/leads/scrape
pub async fn handle_scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<TriggerResponse>, AppError> {
    let payload = request.to_payload(&Utc::now().to_rfc3339())?;
    let company = payload["company"].as_str().unwrap_or_default().to_string();

    let url = state.webhooks.endpoints().scrape.clone();
    match state.webhooks.post_json(&url, &payload).await {
        Ok(response) => {
            state.notices.notify(Notice::success(
                "Success",
                format!("Successfully started scraping for {company}"),
            ));
            Ok(Json(TriggerResponse {
                accepted: true,
                engine_response: response.json_lenient(),
            }))
        }
        Err(e) => {
            state.notices.notify(
                Notice::error("Error", "Failed to start scraping. Please try again.")
                    .with_detail(e.to_string()),
            );
            Err(e.into())
        }
    }
}

/// POST /api/v1/leads/send-emails
pub async fn handle_send_emails(
    State(state): State<AppState>,
    Json(request): Json<SendEmailsRequest>,
) -> Result<Json<TriggerResponse>, AppError> {
    let company = request.company.trim().to_string();
    if company.is_empty() {
        return Err(AppError::Validation("company cannot be empty".to_string()));
    }

    let url = state.webhooks.endpoints().send_emails.clone();
    match state
        .webhooks
        .post_json(&url, &json!({ "name": company }))
        .await
    {
        Ok(response) => {
            state.notices.notify(Notice::success(
                "Success",
                format!("Email sent successfully to {company}"),
            ));
            Ok(Json(TriggerResponse {
                accepted: true,
                engine_response: response.json_lenient(),
            }))
        }
        Err(e) => {
            state.notices.notify(
                Notice::error("Error", format!("Failed to send email to {company}"))
                    .with_detail(e.to_string()),
            );
            Err(e.into())
        }
    }
}
