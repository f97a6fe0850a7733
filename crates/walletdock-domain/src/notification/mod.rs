use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, ErrorSeverity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible message: the toast, modal or info line of a UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub content: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            content: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title)
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

impl From<&DomainError> for Notice {
    fn from(err: &DomainError) -> Self {
        let level = match err.severity() {
            ErrorSeverity::Info => NoticeLevel::Info,
            ErrorSeverity::Warning => NoticeLevel::Warning,
            ErrorSeverity::Error | ErrorSeverity::Critical => NoticeLevel::Error,
        };
        Self::new(level, err.to_string())
    }
}

/// Notification sink (Strategy pattern)
///
/// Kept synchronous: showing a notice never waits on I/O the caller cares about.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
