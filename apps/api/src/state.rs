use std::sync::Arc;

use crate::notify::NoticeBoard;
use crate::templates::ReviewSession;
use crate::webhook_client::WebhookClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Used directly by the dashboard, analysis and leads handlers.
    pub webhooks: WebhookClient,
    /// The single template review session; its backend is usually `webhooks`.
    pub review: Arc<ReviewSession>,
    /// Drained by GET /api/v1/notices.
    pub notices: Arc<NoticeBoard>,
}
