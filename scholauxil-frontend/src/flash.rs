//! One-shot dashboard notices ("flash" messages) kept in the session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const FLASH_KEY: &str = "flash";

/// How long a notice stays visible without being dismissed.
pub const FLASH_TTL_SECONDS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashKind {
    pub fn css_class(self) -> &'static str {
        match self {
            FlashKind::Success => "alert-success",
            FlashKind::Info => "alert-info",
            FlashKind::Warning => "alert-warning",
            FlashKind::Error => "alert-danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub message: String,
    pub kind: FlashKind,
    pub created_at: DateTime<Utc>,
}

impl FlashMessage {
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::seconds(FLASH_TTL_SECONDS)
    }
}

pub async fn push(session: &Session, flash: FlashMessage) {
    if let Err(e) = session.insert(FLASH_KEY, &flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// The pending notice, if it is still fresh. Expired notices are dropped.
pub async fn current(session: &Session) -> Option<FlashMessage> {
    let flash: FlashMessage = match session.get(FLASH_KEY).await {
        Ok(flash) => flash?,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash message");
            return None;
        }
    };

    if flash.is_expired_at(Utc::now()) {
        dismiss(session).await;
        return None;
    }
    Some(flash)
}

pub async fn dismiss(session: &Session) {
    if let Err(e) = session.remove::<FlashMessage>(FLASH_KEY).await {
        tracing::warn!(error = %e, "Failed to clear flash message");
    }
}
