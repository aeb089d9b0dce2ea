use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_GET_TEMPLATES_PATH: &str = "get-email-templets";
const DEFAULT_SAVE_TEMPLATES_PATH: &str = "45626219-5341-4b7d-a524-1aeeaa70c204";
const DEFAULT_GENERATE_TEMPLATES_PATH: &str = "generate-templet";
const DEFAULT_ANALYSIS_PATH: &str = "analysis";
const DEFAULT_LEADS_PATH: &str = "leads";
const DEFAULT_SCRAPE_PATH: &str = "scrap";
const DEFAULT_SEND_EMAILS_PATH: &str = "Send-Emails";
const DEFAULT_DASHBOARD_PATH: &str = "dashboard";

/// Application configuration loaded from environment variables.
/// Fails at startup if `WEBHOOK_BASE_URL` is missing or a numeric value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_base_url: String,
    pub get_templates_path: String,
    pub save_templates_path: String,
    pub generate_templates_path: String,
    pub analysis_path: String,
    pub leads_path: String,
    pub scrape_path: String,
    pub send_emails_path: String,
    pub dashboard_path: String,
    /// Origin the dashboard is served from. When set, webhook calls carry it
    /// and responses that do not allow it are rejected as cross-origin.
    pub dashboard_origin: Option<String>,
    pub webhook_timeout: Duration,
    pub regenerate_delay: Duration,
    pub port: u16,
    pub rust_log: String,
}

/// Fully-resolved webhook URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub get_templates: String,
    pub save_templates: String,
    pub generate_templates: String,
    pub analysis: String,
    pub leads: String,
    pub scrape: String,
    pub send_emails: String,
    pub dashboard: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            webhook_base_url: require_env("WEBHOOK_BASE_URL")?,
            get_templates_path: env_or("GET_TEMPLATES_PATH", DEFAULT_GET_TEMPLATES_PATH),
            save_templates_path: env_or("SAVE_TEMPLATES_PATH", DEFAULT_SAVE_TEMPLATES_PATH),
            generate_templates_path: env_or(
                "GENERATE_TEMPLATES_PATH",
                DEFAULT_GENERATE_TEMPLATES_PATH,
            ),
            analysis_path: env_or("ANALYSIS_PATH", DEFAULT_ANALYSIS_PATH),
            leads_path: env_or("LEADS_PATH", DEFAULT_LEADS_PATH),
            scrape_path: env_or("SCRAPE_PATH", DEFAULT_SCRAPE_PATH),
            send_emails_path: env_or("SEND_EMAILS_PATH", DEFAULT_SEND_EMAILS_PATH),
            dashboard_path: env_or("DASHBOARD_PATH", DEFAULT_DASHBOARD_PATH),
            dashboard_origin: std::env::var("DASHBOARD_ORIGIN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            webhook_timeout: Duration::from_secs(
                env_or("WEBHOOK_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("WEBHOOK_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            regenerate_delay: Duration::from_millis(
                env_or("REGENERATE_DELAY_MS", "2000")
                    .parse::<u64>()
                    .context("REGENERATE_DELAY_MS must be a whole number of milliseconds")?,
            ),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// A configuration pointing every webhook at `base_url`, with defaults elsewhere.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Config {
            webhook_base_url: base_url.into(),
            get_templates_path: DEFAULT_GET_TEMPLATES_PATH.to_string(),
            save_templates_path: DEFAULT_SAVE_TEMPLATES_PATH.to_string(),
            generate_templates_path: DEFAULT_GENERATE_TEMPLATES_PATH.to_string(),
            analysis_path: DEFAULT_ANALYSIS_PATH.to_string(),
            leads_path: DEFAULT_LEADS_PATH.to_string(),
            scrape_path: DEFAULT_SCRAPE_PATH.to_string(),
            send_emails_path: DEFAULT_SEND_EMAILS_PATH.to_string(),
            dashboard_path: DEFAULT_DASHBOARD_PATH.to_string(),
            dashboard_origin: None,
            webhook_timeout: Duration::from_secs(30),
            regenerate_delay: Duration::from_millis(2000),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        let url = |path: &str| join_url(&self.webhook_base_url, path);
        Endpoints {
            get_templates: url(&self.get_templates_path),
            save_templates: url(&self.save_templates_path),
            generate_templates: url(&self.generate_templates_path),
            analysis: url(&self.analysis_path),
            leads: url(&self.leads_path),
            scrape: url(&self.scrape_path),
            send_emails: url(&self.send_emails_path),
            dashboard: url(&self.dashboard_path),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
