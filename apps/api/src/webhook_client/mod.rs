/// Webhook Client: the single point of entry for all calls to the automation engine.
///
/// ARCHITECTURAL RULE: No other module may issue HTTP requests to the engine directly.
/// Template, analysis, lead and dashboard services all go through this module.
use std::time::Duration;

use reqwest::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, Endpoints};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: could not connect to {url}: {message}")]
    Network { url: String, message: String },

    #[error("cross-origin request from {origin} was not accepted by {url}")]
    CrossOrigin { url: String, origin: String },

    #[error("HTTP error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("response from {url} was not valid JSON: {message}")]
    Decode { url: String, message: String },
}

/// Raw outcome of a successful (2xx) webhook call.
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    /// Parses the body as JSON, failing with `Decode` when it is not.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_str(&self.body).map_err(|e| WebhookError::Decode {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }

    /// Parses the body as JSON, returning `None` when it is empty or malformed.
    /// Used by trigger endpoints whose success is carried by the status alone.
    pub fn json_lenient(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }
}

/// Shared client for the automation engine's webhooks.
/// Cheap to clone; holds a pooled `reqwest::Client` and the resolved endpoint URLs.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    endpoints: Endpoints,
    origin: Option<String>,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(config.webhook_timeout).build()?,
            endpoints: config.endpoints(),
            origin: config.dashboard_origin.clone(),
            timeout: config.webhook_timeout,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// POSTs a JSON body and returns the response if it is a 2xx.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<WebhookResponse, WebhookError> {
        let request = self
            .client
            .post(url)
            .header("accept", "application/json")
            .json(body);
        self.send(url, request).await
    }

    /// POSTs without a body. Some engine workflows only respond to a bare trigger.
    pub async fn post_empty(&self, url: &str) -> Result<WebhookResponse, WebhookError> {
        let request = self.client.post(url).header("accept", "application/json");
        self.send(url, request).await
    }

    async fn send(
        &self,
        url: &str,
        mut request: reqwest::RequestBuilder,
    ) -> Result<WebhookResponse, WebhookError> {
        if let Some(origin) = &self.origin {
            request = request.header(ORIGIN, origin.as_str());
        }

        let response = request.send().await.map_err(|e| {
            let error = self.classify(url, e);
            warn!("Webhook call to {url} failed: {error}");
            error
        })?;

        let status = response.status();

        if let Some(origin) = &self.origin {
            let allowed = response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN);
            if !origin_allowed(allowed, origin) {
                warn!("Webhook {url} did not allow origin {origin} (status {status})");
                return Err(WebhookError::CrossOrigin {
                    url: url.to_string(),
                    origin: origin.clone(),
                });
            }
        }

        let body = response.text().await.map_err(|e| self.classify(url, e))?;

        if !status.is_success() {
            warn!("Webhook {url} returned {status}: {body}");
            return Err(WebhookError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Webhook {url} returned {status} ({} bytes)", body.len());

        Ok(WebhookResponse {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> WebhookError {
        if error.is_timeout() {
            WebhookError::Timeout(self.timeout)
        } else {
            WebhookError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

fn origin_allowed(header: Option<&HeaderValue>, origin: &str) -> bool {
    match header.and_then(|v| v.to_str().ok()).map(str::trim) {
        Some("*") => true,
        Some(value) => value.eq_ignore_ascii_case(origin),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Spawns a throwaway engine on an ephemeral port and returns its base URL.
    async fn spawn_engine(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: &str, timeout: Duration, origin: Option<&str>) -> WebhookClient {
        let mut config = Config::with_base_url(base_url);
        config.webhook_timeout = timeout;
        config.dashboard_origin = origin.map(str::to_string);
        WebhookClient::new(&config).expect("client builds")
    }

    #[tokio::test]
    async fn test_post_json_returns_body_on_success() {
        let app = Router::new().route(
            "/echo",
            post(|Json(body): Json<Value>| async move { Json(json!({ "received": body })) }),
        );
        let base = spawn_engine(app).await;
        let client = client_for(&base, Duration::from_secs(5), None);

        let response = client
            .post_json(&format!("{base}/echo"), &json!({ "action": "generate" }))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let value: Value = response.json().unwrap();
        assert_eq!(value["received"]["action"], "generate");
    }

    #[tokio::test]
    async fn test_http_error_captures_status_and_body() {
        let app = Router::new().route(
            "/fail",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "workflow crashed") }),
        );
        let base = spawn_engine(app).await;
        let client = client_for(&base, Duration::from_secs(5), None);

        let err = client
            .post_json(&format!("{base}/fail"), &json!({}))
            .await
            .unwrap_err();

        match err {
            WebhookError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "workflow crashed");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_tolerated_leniently() {
        let app = Router::new().route("/save", post(|| async { "Workflow was started" }));
        let base = spawn_engine(app).await;
        let client = client_for(&base, Duration::from_secs(5), None);

        let response = client
            .post_json(&format!("{base}/save"), &json!([]))
            .await
            .unwrap();

        assert!(response.json_lenient().is_none());
        assert!(matches!(
            response.json::<Value>(),
            Err(WebhookError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_network_error() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = format!("http://{addr}");
        let client = client_for(&base, Duration::from_secs(5), None);
        let err = client.post_empty(&format!("{base}/x")).await.unwrap_err();

        assert!(matches!(err, WebhookError::Network { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_slow_engine_is_timeout() {
        let app = Router::new().route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        );
        let base = spawn_engine(app).await;
        let client = client_for(&base, Duration::from_millis(200), None);

        let err = client
            .post_json(&format!("{base}/slow"), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_allow_origin_is_cross_origin_error() {
        let app = Router::new().route("/get", post(|| async { Json(json!([])) }));
        let base = spawn_engine(app).await;
        let client = client_for(
            &base,
            Duration::from_secs(5),
            Some("https://dashboard.example.com"),
        );

        let err = client
            .post_json(&format!("{base}/get"), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::CrossOrigin { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_wildcard_allow_origin_passes() {
        let app = Router::new().route(
            "/get",
            post(|| async {
                ([("access-control-allow-origin", "*")], Json(json!([]))).into_response()
            }),
        );
        let base = spawn_engine(app).await;
        let client = client_for(
            &base,
            Duration::from_secs(5),
            Some("https://dashboard.example.com"),
        );

        let response = client
            .post_json(&format!("{base}/get"), &json!({}))
            .await
            .unwrap();
        assert_eq!(response.body, "[]");
    }

    #[test]
    fn test_origin_allowed_matches_exact_origin() {
        let value = HeaderValue::from_static("https://dashboard.example.com");
        assert!(origin_allowed(Some(&value), "https://dashboard.example.com"));
        assert!(!origin_allowed(Some(&value), "https://other.example.com"));
        assert!(!origin_allowed(None, "https://dashboard.example.com"));
    }
}
