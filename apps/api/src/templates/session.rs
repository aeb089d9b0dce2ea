//! Review session: fetches, tracks and selectively persists template approvals.
//!
//! The session owns the single `TemplateBoard`. The board lock is never held
//! across a webhook call, so edits keep landing while a fetch or save is in
//! flight. Completion handlers re-acquire the lock and apply only what they
//! are entitled to:
//! - a fetch applies only if no newer fetch has already been applied;
//! - a save advances only the baselines of the templates it submitted, to the
//!   status it submitted, and only if the set was not replaced meanwhile.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::notify::{Notice, Notifier};
use crate::templates::flatten::{decode_records, flatten_records};
use crate::templates::model::{SavePayload, Template, TemplateId, TemplateStatus};
use crate::templates::preview::{truncate_subject, SUBJECT_PREVIEW_CHARS};
use crate::templates::tracker::{EditOutcome, TemplateBoard};
use crate::webhook_client::WebhookError;

/// The remote side of the workflow. Implemented by `WebhookClient`; faked in tests.
#[async_trait]
pub trait TemplateBackend: Send + Sync {
    /// Returns the raw get-templates payload, whatever its shape.
    async fn fetch_templates(&self) -> Result<Value, WebhookError>;

    async fn save_templates(&self, batch: &[SavePayload]) -> Result<(), WebhookError>;

    async fn trigger_generation(&self) -> Result<(), WebhookError>;
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("template {0} not found")]
    UnknownTemplate(TemplateId),

    #[error("a save is already in progress")]
    SaveInFlight,

    #[error("template generation is already in progress")]
    GenerationInFlight,

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Loaded { count: usize },
    /// The engine answered with something other than a list; the set is now empty.
    NotAList,
    /// A newer refresh was applied while this one was in flight; its response was dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    NothingToSave,
    Saved { submitted: usize, advanced: usize },
}

/// Row shape served to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateView {
    pub id: TemplateId,
    pub company: String,
    pub slot_index: u8,
    pub label: String,
    pub subject: String,
    pub subject_preview: String,
    pub status: TemplateStatus,
    pub original_status: TemplateStatus,
    pub change_request: String,
    pub dirty: bool,
}

impl From<&Template> for TemplateView {
    fn from(t: &Template) -> Self {
        TemplateView {
            id: t.id.clone(),
            company: t.company.clone(),
            slot_index: t.slot_index,
            label: t.label(),
            subject: t.subject.clone(),
            subject_preview: truncate_subject(&t.subject, SUBJECT_PREVIEW_CHARS),
            status: t.status,
            original_status: t.original_status,
            change_request: t.change_request.clone(),
            dirty: t.is_dirty(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyView {
    pub company: String,
    pub templates: Vec<TemplateView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSnapshot {
    pub companies: Vec<CompanyView>,
    pub total: usize,
    pub changed_count: usize,
    pub saving: bool,
    pub generating: bool,
}

/// Clears an in-flight flag when dropped, including on early return.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReviewSession {
    backend: Arc<dyn TemplateBackend>,
    notifier: Arc<dyn Notifier>,
    board: Mutex<TemplateBoard>,
    latest_fetch: AtomicU64,
    /// Token of the fetch whose response is currently on the board.
    applied_fetch: AtomicU64,
    saving: AtomicBool,
    generating: AtomicBool,
    regenerate_delay: Duration,
}

impl ReviewSession {
    pub fn new(
        backend: Arc<dyn TemplateBackend>,
        notifier: Arc<dyn Notifier>,
        regenerate_delay: Duration,
    ) -> Self {
        Self {
            backend,
            notifier,
            board: Mutex::new(TemplateBoard::new()),
            latest_fetch: AtomicU64::new(0),
            applied_fetch: AtomicU64::new(0),
            saving: AtomicBool::new(false),
            generating: AtomicBool::new(false),
            regenerate_delay,
        }
    }

    /// Fetches and replaces the template set.
    ///
    /// On failure the current set is left as is, so in-progress edits survive
    /// a failed refresh. A response older than the one already applied is dropped;
    /// a newer refresh that fails does not make an older one stale.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ReviewError> {
        let token = self.latest_fetch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("Fetching email templates (request {token})");

        let payload = match self.backend.fetch_templates().await {
            Ok(payload) => payload,
            Err(e) => {
                self.notifier.notify(
                    Notice::error("Error", "Failed to fetch templates. Please try again.")
                        .with_detail(e.to_string()),
                );
                return Err(e.into());
            }
        };

        let decoded = decode_records(&payload);
        let templates = decoded.as_deref().map(flatten_records).unwrap_or_default();

        let mut board = self.board.lock().await;
        // The board lock serializes every read and write of `applied_fetch`.
        if self.applied_fetch.load(Ordering::Acquire) > token {
            debug!("Discarding stale template response (request {token})");
            return Ok(RefreshOutcome::Superseded);
        }
        self.applied_fetch.store(token, Ordering::Release);

        let count = templates.len();
        board.replace(templates);
        drop(board);

        match decoded {
            Some(records) => {
                info!(
                    "Loaded {count} templates from {} company records",
                    records.len()
                );
                Ok(RefreshOutcome::Loaded { count })
            }
            None => {
                warn!("Expected an array of templates but received: {payload}");
                self.notifier.notify(Notice::warning(
                    "No Templates",
                    "The template service returned an unexpected response.",
                ));
                Ok(RefreshOutcome::NotAList)
            }
        }
    }

    pub async fn edit(
        &self,
        id: &TemplateId,
        status: TemplateStatus,
        change_request: Option<String>,
    ) -> Result<EditOutcome, ReviewError> {
        let outcome = self
            .board
            .lock()
            .await
            .edit(id, status, change_request)
            .ok_or_else(|| ReviewError::UnknownTemplate(id.clone()))?;

        self.notifier.notify(Notice::info(
            "Template Updated",
            format!("Status changed to {status}"),
        ));
        Ok(outcome)
    }

    /// Submits every dirty template in one batch, then advances their baselines.
    ///
    /// Rejects re-entrant calls while a save is in flight. An empty changed set
    /// is a successful no-op that issues no request.
    pub async fn save_changes(&self) -> Result<SaveOutcome, ReviewError> {
        let _in_flight = InFlight::acquire(&self.saving).ok_or(ReviewError::SaveInFlight)?;

        let (generation, submitted, batch) = {
            let board = self.board.lock().await;
            let changed = board.changed_set();
            let submitted: Vec<(TemplateId, TemplateStatus)> =
                changed.iter().map(|t| (t.id.clone(), t.status)).collect();
            let batch: Vec<SavePayload> = changed.into_iter().map(SavePayload::from).collect();
            (board.generation(), submitted, batch)
        };

        if batch.is_empty() {
            self.notifier.notify(Notice::info(
                "No Changes",
                "No template changes were detected",
            ));
            return Ok(SaveOutcome::NothingToSave);
        }

        info!("Saving {} changed templates", batch.len());

        if let Err(e) = self.backend.save_templates(&batch).await {
            self.notifier.notify(save_failure_notice(&e));
            return Err(e.into());
        }

        let advanced = self
            .board
            .lock()
            .await
            .advance_baseline(generation, &submitted);

        self.notifier.notify(Notice::success(
            "Success",
            format!(
                "{} template(s) have been saved successfully",
                submitted.len()
            ),
        ));

        Ok(SaveOutcome::Saved {
            submitted: submitted.len(),
            advanced,
        })
    }

    /// Asks the engine to generate templates, then re-fetches after the configured delay.
    pub async fn trigger_generation(self: &Arc<Self>) -> Result<(), ReviewError> {
        let _in_flight =
            InFlight::acquire(&self.generating).ok_or(ReviewError::GenerationInFlight)?;

        if let Err(e) = self.backend.trigger_generation().await {
            self.notifier.notify(
                Notice::error("Error", "Failed to generate template. Please try again.")
                    .with_detail(e.to_string()),
            );
            return Err(e.into());
        }

        self.notifier.notify(Notice::success(
            "Success",
            "Template generation started successfully",
        ));

        let session = Arc::clone(self);
        let delay = self.regenerate_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = session.refresh().await {
                warn!("Re-fetch after generation failed: {e}");
            }
        });

        Ok(())
    }

    pub async fn template(&self, id: &TemplateId) -> Option<Template> {
        self.board.lock().await.get(id).cloned()
    }

    pub async fn changed(&self) -> Vec<TemplateView> {
        let board = self.board.lock().await;
        board
            .changed_set()
            .into_iter()
            .map(TemplateView::from)
            .collect()
    }

    pub async fn snapshot(&self) -> ReviewSnapshot {
        let board = self.board.lock().await;
        let companies = board
            .grouped()
            .into_iter()
            .map(|group| CompanyView {
                company: group.company.to_string(),
                templates: group.templates.into_iter().map(TemplateView::from).collect(),
            })
            .collect();

        ReviewSnapshot {
            companies,
            total: board.templates().len(),
            changed_count: board.changed_count(),
            saving: self.saving.load(Ordering::Acquire),
            generating: self.generating.load(Ordering::Acquire),
        }
    }
}

fn save_failure_notice(error: &WebhookError) -> Notice {
    let message = match error {
        WebhookError::Network { .. } => {
            "Network error: Could not connect to the server. Please check your internet connection."
                .to_string()
        }
        WebhookError::CrossOrigin { .. } => {
            "CORS error: The server is not configured to accept requests from this domain."
                .to_string()
        }
        WebhookError::Timeout(after) => {
            format!("Timeout: the server did not respond within {after:?}.")
        }
        WebhookError::Http { status, .. } => format!("HTTP error! status: {status}"),
        WebhookError::Decode { .. } => "Failed to save templates".to_string(),
    };
    Notice::error("Save Failed", message).with_detail(error.to_string())
}
