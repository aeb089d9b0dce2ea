mod analysis;
mod config;
mod dashboard;
mod errors;
mod leads;
mod notify;
mod routes;
mod state;
mod templates;
mod webhook_client;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::notify::NoticeBoard;
use crate::routes::build_router;
use crate::state::AppState;
use crate::templates::ReviewSession;
use crate::webhook_client::WebhookClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sales agent API v{}", env!("CARGO_PKG_VERSION"));

    // Webhook client shared by every engine call
    let webhooks = WebhookClient::new(&config).context("Failed to build webhook client")?;
    info!(
        "Webhook client initialized (base: {}, timeout: {:?})",
        config.webhook_base_url, config.webhook_timeout
    );

    let notices = Arc::new(NoticeBoard::new());
    let review = Arc::new(ReviewSession::new(
        Arc::new(webhooks.clone()),
        notices.clone(),
        config.regenerate_delay,
    ));

    // Initial template load; the server starts regardless of the outcome
    let initial = review.clone();
    tokio::spawn(async move {
        if let Err(e) = initial.refresh().await {
            warn!("Initial template fetch failed: {e}");
        }
    });

    let state = AppState {
        webhooks,
        review,
        notices,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
