use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmColor {
    Primary,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub title: String,
    pub body: String,
    pub confirm_label: String,
    pub confirm_color: ConfirmColor,
}

impl Prompt {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        confirm_label: impl Into<String>,
        confirm_color: ConfirmColor,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            confirm_label: confirm_label.into(),
            confirm_color,
        }
    }
}

#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &Prompt) -> bool;
}

/// Confirmation decided before the call, e.g. from a request header.
#[derive(Debug, Clone, Copy)]
pub struct PreConfirmed(pub bool);

#[async_trait]
impl Confirmation for PreConfirmed {
    async fn confirm(&self, prompt: &Prompt) -> bool {
        debug!(title = %prompt.title, confirmed = self.0, "confirmation prompt");
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notice: Notice);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(title = %notice.title, "{}", notice.message),
            NoticeLevel::Error => warn!(title = %notice.title, "{}", notice.message),
        }
    }
}
