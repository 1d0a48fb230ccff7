//! Dictation seams. The browser owns the microphone and the recognizer; the
//! server only tracks whether capture is on and what permission was reported.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MICROPHONE_DENIED_MESSAGE: &str = "Microphone access denied.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Prompt,
    Denied,
}

impl PermissionState {
    pub fn allows_capture(self) -> bool {
        matches!(self, PermissionState::Granted | PermissionState::Prompt)
    }
}

#[async_trait]
pub trait MicrophonePermissions: Send + Sync {
    async fn query(&self) -> anyhow::Result<PermissionState>;
}

/// Permission state as reported by the page alongside the toggle request.
#[derive(Debug, Clone, Copy)]
pub struct ReportedPermission(pub Option<PermissionState>);

#[async_trait]
impl MicrophonePermissions for ReportedPermission {
    async fn query(&self) -> anyhow::Result<PermissionState> {
        self.0
            .ok_or_else(|| anyhow::anyhow!("browser did not report a microphone permission"))
    }
}

pub trait SpeechCapture: Send {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Capture driven by the page: the returned `recording` flag tells the page
/// whether to keep its recognizer running.
#[derive(Debug, Default)]
pub struct PageCapture;

impl SpeechCapture for PageCapture {
    fn start(&mut self) {
        tracing::debug!("Dictation started");
    }

    fn stop(&mut self) {
        tracing::debug!("Dictation stopped");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingChange {
    Started,
    Stopped,
}

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Microphone access denied.")]
    Denied,

    #[error("microphone permission query failed: {0}")]
    PermissionQuery(anyhow::Error),
}
