//! Plagiarism checker form: length validation, one scoring request per
//! submission, verbatim report display.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_CHARS: usize = 100;
pub const MAX_CHARS: usize = 120_000;
pub const FALLBACK_ERROR: &str = "Something went wrong";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlagiarismValidation {
    #[error("Please enter text to check for plagiarism.")]
    Empty,

    #[error("Text too short. Minimum 100 characters required (current: {0}).")]
    TooShort(usize),

    #[error("Text too long. Maximum 120,000 characters allowed (current: {0}).")]
    TooLong(usize),
}

/// Length is counted in characters of the trimmed text.
pub fn validate(text: &str) -> Result<(), PlagiarismValidation> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PlagiarismValidation::Empty);
    }

    let count = trimmed.chars().count();
    if count < MIN_CHARS {
        return Err(PlagiarismValidation::TooShort(count));
    }
    if count > MAX_CHARS {
        return Err(PlagiarismValidation::TooLong(count));
    }

    Ok(())
}

/// Scoring service output. Its shape belongs to the service and is shown as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlagiarismReport(pub serde_json::Value);

impl PlagiarismReport {
    /// A body that is not JSON is kept as a plain string report.
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Self(value),
            Err(_) => Self(serde_json::Value::String(body)),
        }
    }

    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

/// Error body of a rejected check: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct PlagiarismErrorBody {
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum PlagiarismError {
    #[error("scoring service rejected the text ({status})")]
    Rejected { status: u16, message: Option<String> },

    #[error("scoring service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable scoring response: {0}")]
    Decode(String),
}

impl PlagiarismError {
    /// Text shown to the user: the service's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            PlagiarismError::Rejected {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            _ => FALLBACK_ERROR.to_string(),
        }
    }
}

#[async_trait]
pub trait PlagiarismBackend: Send + Sync {
    async fn check_plagiarism(&self, text: &str) -> Result<PlagiarismReport, PlagiarismError>;
}

/// A validated submission waiting for its response.
#[derive(Debug, Clone)]
pub struct PlagiarismTicket {
    pub seq: u64,
    pub text: String,
}

#[derive(Debug, Default, Clone)]
pub struct PlagiarismForm {
    pub text: String,
    pub loading: bool,
    pub result: Option<PlagiarismReport>,
    pub error: Option<String>,
    latest_seq: u64,
}

impl PlagiarismForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and open a new submission. The raw text (not the trimmed one)
    /// is what gets sent.
    pub fn begin_check(&mut self, text: &str) -> Result<PlagiarismTicket, PlagiarismValidation> {
        self.text = text.to_string();

        if let Err(invalid) = validate(text) {
            self.error = Some(invalid.to_string());
            return Err(invalid);
        }

        self.latest_seq += 1;
        self.error = None;
        self.result = None;
        self.loading = true;

        Ok(PlagiarismTicket {
            seq: self.latest_seq,
            text: text.to_string(),
        })
    }

    /// Apply the outcome of submission `seq`. Returns `false` when a newer
    /// submission has superseded it and the outcome was dropped.
    pub fn finish_check(
        &mut self,
        seq: u64,
        outcome: Result<PlagiarismReport, PlagiarismError>,
    ) -> bool {
        if seq != self.latest_seq {
            tracing::debug!(seq, latest = self.latest_seq, "Dropping stale plagiarism result");
            return false;
        }

        match outcome {
            Ok(report) => self.result = Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Plagiarism check failed");
                self.error = Some(e.user_message());
            }
        }
        self.loading = false;
        true
    }

    pub async fn check(&mut self, backend: &dyn PlagiarismBackend, text: &str) {
        let Ok(ticket) = self.begin_check(text) else {
            return;
        };
        let outcome = backend.check_plagiarism(&ticket.text).await;
        self.finish_check(ticket.seq, outcome);
    }
}
