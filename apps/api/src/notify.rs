//! Notifier: the capability every service uses to report user-facing outcomes.
//!
//! Services hold an `Arc<dyn Notifier>` rather than reaching for a global, so the
//! review workflow can be exercised in tests with a recording notifier.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How many notices the board retains before evicting the oldest.
pub const NOTICE_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient, human-readable outcome shown to the user as a toast.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
    /// Underlying diagnostic detail (status codes, response bodies), when available.
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            message: message.into(),
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, message)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Production notifier: logs every notice and keeps the most recent ones
/// in memory until the dashboard drains them.
#[derive(Default)]
pub struct NoticeBoard {
    notices: Mutex<VecDeque<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all pending notices, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        let mut notices = self
            .notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        notices.drain(..).collect()
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, notice: Notice) {
        let detail = notice.detail.as_deref().unwrap_or("");
        match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => {
                info!("[notice] {}: {} {}", notice.title, notice.message, detail)
            }
            NoticeLevel::Warning => {
                warn!("[notice] {}: {} {}", notice.title, notice.message, detail)
            }
            NoticeLevel::Error => {
                error!("[notice] {}: {} {}", notice.title, notice.message, detail)
            }
        }

        let mut notices = self
            .notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if notices.len() == NOTICE_CAPACITY {
            notices.pop_front();
        }
        notices.push_back(notice);
    }
}
