pub mod health;
pub mod notices;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::dashboard::handlers as dashboard;
use crate::leads::handlers as leads;
use crate::state::AppState;
use crate::templates::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Template review
        .route("/api/v1/templates", get(templates::handle_snapshot))
        .route("/api/v1/templates/refresh", post(templates::handle_refresh))
        .route("/api/v1/templates/changes", get(templates::handle_changes))
        .route("/api/v1/templates/save", post(templates::handle_save))
        .route("/api/v1/templates/generate", post(templates::handle_generate))
        .route("/api/v1/templates/:id", patch(templates::handle_edit))
        .route(
            "/api/v1/templates/:id/preview",
            get(templates::handle_preview),
        )
        // Campaign dashboard
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard))
        // Analysis
        .route("/api/v1/analysis", post(analysis::handle_generate_analysis))
        .route(
            "/api/v1/analysis/industries",
            get(analysis::handle_list_industries),
        )
        // Leads
        .route("/api/v1/leads/companies", get(leads::handle_list_companies))
        .route(
            "/api/v1/leads/companies/:name/contacts",
            get(leads::handle_company_contacts),
        )
        .route("/api/v1/leads/scrape", post(leads::handle_scrape))
        .route("/api/v1/leads/send-emails", post(leads::handle_send_emails))
        // Notices
        .route("/api/v1/notices", get(notices::handle_drain_notices))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::notify::NoticeBoard;
    use crate::templates::model::SavePayload;
    use crate::templates::session::{ReviewSession, TemplateBackend};
    use crate::webhook_client::{WebhookClient, WebhookError};

    #[derive(Default)]
    struct StubBackend {
        saved: Mutex<Vec<Vec<SavePayload>>>,
    }

    #[async_trait]
    impl TemplateBackend for StubBackend {
        async fn fetch_templates(&self) -> Result<Value, WebhookError> {
            Ok(json!([{
                "row_number": 3,
                "Company": "1. Acme",
                "Email Templet 1": "<html><body><p>Hi</p></body></html>",
                "Subject 1": "Intro",
                "Status 1": "Pending",
                "Email Templet 2": "<p>Follow up</p>",
                "Subject 2": "Checking in",
                "Status 2": "approved"
            }]))
        }

        async fn save_templates(&self, batch: &[SavePayload]) -> Result<(), WebhookError> {
            self.saved.lock().await.push(batch.to_vec());
            Ok(())
        }

        async fn trigger_generation(&self) -> Result<(), WebhookError> {
            Ok(())
        }
    }

    fn test_state(backend: Arc<StubBackend>) -> AppState {
        // Nothing listens on port 9; direct webhook routes fail fast.
        let config = Config::with_base_url("http://127.0.0.1:9");
        let notices = Arc::new(NoticeBoard::new());
        let review = Arc::new(ReviewSession::new(
            backend,
            notices.clone(),
            Duration::from_millis(10),
        ));
        AppState {
            webhooks: WebhookClient::new(&config).unwrap(),
            review,
            notices,
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(Arc::default()));
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_review_flow_over_http() {
        let backend = Arc::new(StubBackend::default());
        let app = build_router(test_state(backend.clone()));

        let (status, body) = send(&app, "POST", "/api/v1/templates/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["refresh"]["outcome"], "loaded");
        assert_eq!(body["snapshot"]["total"], 2);
        assert_eq!(body["snapshot"]["companies"][0]["company"], "Acme");

        let (status, body) = send(
            &app,
            "PATCH",
            "/api/v1/templates/3-1",
            Some(json!({ "status": "Rejected", "change_request": "  Shorter please " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["template"]["change_request"], "Shorter please");
        assert_eq!(body["changed_count"], 1);

        let (_, body) = send(&app, "GET", "/api/v1/templates/changes", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["templates"][0]["id"], "3-1");

        let (status, body) = send(&app, "POST", "/api/v1/templates/save", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["save"]["outcome"], "saved");
        assert_eq!(body["save"]["submitted"], 1);
        assert_eq!(body["changed_count"], 0);

        let saved = backend.saved.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0][0].company_name, "Acme");
        assert_eq!(saved[0][0].change_request, "Shorter please");
        drop(saved);

        let (_, body) = send(&app, "POST", "/api/v1/templates/save", None).await;
        assert_eq!(body["save"]["outcome"], "nothing_to_save");
        assert_eq!(backend.saved.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_preview_strips_document_shell() {
        let app = build_router(test_state(Arc::default()));
        send(&app, "POST", "/api/v1/templates/refresh", None).await;

        let (status, body) = send(&app, "GET", "/api/v1/templates/3-1/preview", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["html"], "<p>Hi</p>");
        assert_eq!(body["label"], "Welcome Email");
    }

    #[tokio::test]
    async fn test_unknown_template_is_not_found() {
        let app = build_router(test_state(Arc::default()));
        let (status, body) = send(
            &app,
            "PATCH",
            "/api/v1/templates/99-1",
            Some(json!({ "status": "Approved" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, "GET", "/api/v1/templates/99-1/preview", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_is_accepted() {
        let app = build_router(test_state(Arc::default()));
        let (status, _) = send(&app, "POST", "/api/v1/templates/generate", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_notices_are_drained() {
        let app = build_router(test_state(Arc::default()));
        send(&app, "POST", "/api/v1/templates/refresh", None).await;
        send(
            &app,
            "PATCH",
            "/api/v1/templates/3-2",
            Some(json!({ "status": "Pending" })),
        )
        .await;

        let (_, body) = send(&app, "GET", "/api/v1/notices", None).await;
        assert_eq!(body["notices"][0]["title"], "Template Updated");

        let (_, body) = send(&app, "GET", "/api/v1/notices", None).await;
        assert_eq!(body["notices"], json!([]));
    }

    #[tokio::test]
    async fn test_scrape_validation_runs_before_webhook() {
        let app = build_router(test_state(Arc::default()));
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/leads/scrape",
            Some(json!({ "company": "Acme", "roles": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_bad_gateway() {
        let app = build_router(test_state(Arc::default()));
        let (status, body) = send(&app, "GET", "/api/v1/dashboard", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_UNREACHABLE");
    }
}
