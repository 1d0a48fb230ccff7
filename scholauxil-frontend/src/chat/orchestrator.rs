//! State of the research-assistant chat widget.
//!
//! Phases: `Idle → Composing → Submitting → {Answered | Failed}`; `close()`
//! returns to `Idle` from anywhere. Every submission gets a sequence number
//! and only the outcome of the latest one is applied, so a slow earlier
//! request can never overwrite a newer answer.

use async_trait::async_trait;
use thiserror::Error;

use super::attachment::{AttachmentError, DocumentAttachment, ImageAttachment, UploadedFile};
use super::completion::ChatCompletion;
use super::sanitize::{sanitize, SanitizedHtml};
use super::speech::{MicrophonePermissions, RecordingChange, RecordingError, SpeechCapture};

pub const EMPTY_SUBMISSION_MESSAGE: &str = "Please enter a question or upload a file.";
pub const NO_RESPONSE_MESSAGE: &str = "No response received.";
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred.";

pub const PROMPT_SUGGESTIONS: [&str; 9] = [
    "🔍 Summarize a research paper",
    "📄 Extract key insights",
    "📊 Summarize results",
    "📑 Summarize methodology",
    "🌟 Discover trending topics",
    "🧠 Generate research hypotheses",
    "📚 Review related literature",
    "🔬 Explain key concepts",
    "📈 Analyze dataset trends",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Composing,
    Submitting,
    Answered,
    Failed,
}

/// Payload of one submission. Becomes the multipart body
/// `question`, `file?`, `image?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub question: String,
    pub document: Option<UploadedFile>,
    pub image: Option<UploadedFile>,
}

impl ChatRequest {
    pub fn is_sendable(&self) -> bool {
        !self.question.trim().is_empty() || self.document.is_some() || self.image.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat endpoint returned {0}")]
    Status(u16),

    #[error("unreadable chat response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask(&self, request: ChatRequest) -> Result<ChatCompletion, ChatError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Please enter a question or upload a file.")]
pub struct EmptySubmission;

#[derive(Debug, Clone)]
pub struct Submission {
    pub seq: u64,
    pub request: ChatRequest,
}

#[derive(Debug, Clone)]
pub struct ChatOrchestrator {
    question: String,
    response: Option<SanitizedHtml>,
    validation_message: Option<String>,
    loading: bool,
    recording: bool,
    document: Option<DocumentAttachment>,
    image: Option<ImageAttachment>,
    phase: ChatPhase,
    latest_seq: u64,
}

impl Default for ChatOrchestrator {
    fn default() -> Self {
        Self {
            question: String::new(),
            response: None,
            validation_message: None,
            loading: false,
            recording: false,
            document: None,
            image: None,
            phase: ChatPhase::Idle,
            latest_seq: 0,
        }
    }
}

impl ChatOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn response(&self) -> Option<&SanitizedHtml> {
        self.response.as_ref()
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn document(&self) -> Option<&DocumentAttachment> {
        self.document.as_ref()
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    fn touch(&mut self) {
        if self.phase == ChatPhase::Idle {
            self.phase = ChatPhase::Composing;
        }
    }

    /// Typed input or a clicked prompt suggestion.
    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
        self.touch();
    }

    /// Interim dictation result. Replaces the question (the recognizer sends
    /// the whole utterance so far); ignored when not recording.
    pub fn append_speech_input(&mut self, partial_transcript: &str) {
        if !self.recording || partial_transcript.is_empty() {
            return;
        }
        self.question = partial_transcript.to_string();
        self.touch();
    }

    pub async fn toggle_recording(
        &mut self,
        permissions: &dyn MicrophonePermissions,
        capture: &mut dyn SpeechCapture,
    ) -> Result<RecordingChange, RecordingError> {
        let state = permissions.query().await.map_err(|e| {
            tracing::error!(error = %e, "Microphone permission error");
            RecordingError::PermissionQuery(e)
        })?;

        if !state.allows_capture() {
            return Err(RecordingError::Denied);
        }

        if self.recording {
            capture.stop();
            self.recording = false;
            Ok(RecordingChange::Stopped)
        } else {
            capture.start();
            self.recording = true;
            Ok(RecordingChange::Started)
        }
    }

    pub fn attach_document(&mut self, file: UploadedFile) -> Result<(), AttachmentError> {
        let document = DocumentAttachment::accept(file)?;
        tracing::debug!(file_name = %document.file_name(), "Document attached");
        self.document = Some(document);
        self.touch();
        Ok(())
    }

    /// Stores the image once its preview has been encoded.
    pub async fn attach_image(&mut self, file: UploadedFile) -> Result<(), AttachmentError> {
        let image = ImageAttachment::read(file).await?;
        self.image = Some(image);
        self.touch();
        Ok(())
    }

    pub fn remove_document(&mut self) {
        self.document = None;
    }

    pub fn remove_image(&mut self) {
        self.image = None;
    }

    /// Validate and open a submission for `question`.
    pub fn begin_submit(&mut self, question: &str) -> Result<Submission, EmptySubmission> {
        self.question = question.to_string();

        let request = ChatRequest {
            question: question.to_string(),
            document: self.document.as_ref().map(|d| d.file.clone()),
            image: self.image.as_ref().map(|i| i.file.clone()),
        };

        if !request.is_sendable() {
            self.validation_message = Some(EMPTY_SUBMISSION_MESSAGE.to_string());
            return Err(EmptySubmission);
        }

        self.latest_seq += 1;
        self.loading = true;
        self.validation_message = None;
        self.response = None;
        self.phase = ChatPhase::Submitting;

        Ok(Submission {
            seq: self.latest_seq,
            request,
        })
    }

    /// Apply the outcome of submission `seq`. Returns `false` when the
    /// outcome is stale (superseded or closed) and was dropped.
    pub fn finish_submit(&mut self, seq: u64, outcome: Result<ChatCompletion, ChatError>) -> bool {
        if seq != self.latest_seq || self.phase != ChatPhase::Submitting {
            tracing::debug!(seq, latest = self.latest_seq, "Dropping stale chat response");
            return false;
        }

        match outcome {
            Ok(completion) => match completion.first_answer() {
                Some(answer) => {
                    self.response = Some(sanitize(answer));
                    self.phase = ChatPhase::Answered;
                }
                None => {
                    self.validation_message = Some(NO_RESPONSE_MESSAGE.to_string());
                    self.phase = ChatPhase::Failed;
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Chat API error");
                self.validation_message = Some(GENERIC_ERROR_MESSAGE.to_string());
                self.phase = ChatPhase::Failed;
            }
        }
        self.loading = false;
        true
    }

    pub async fn submit(&mut self, backend: &dyn ChatBackend, question: &str) {
        let Ok(submission) = self.begin_submit(question) else {
            return;
        };
        let outcome = backend.ask(submission.request).await;
        self.finish_submit(submission.seq, outcome);
    }

    /// Back to `Idle`, discarding text, answer, messages and both attachments.
    /// Submissions still in flight are invalidated.
    pub fn close(&mut self) {
        let next_seq = self.latest_seq + 1;
        *self = Self {
            recording: self.recording,
            latest_seq: next_seq,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::speech::{PermissionState, ReportedPermission};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedBackend {
        requests: Mutex<Vec<ChatRequest>>,
        reply: Option<serde_json::Value>,
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn ask(&self, request: ChatRequest) -> Result<ChatCompletion, ChatError> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Some(body) => serde_json::from_value(body.clone())
                    .map_err(|e| ChatError::Decode(e.to_string())),
                None => Err(ChatError::Status(502)),
            }
        }
    }

    #[derive(Default)]
    struct CountingCapture {
        starts: usize,
        stops: usize,
    }

    impl SpeechCapture for CountingCapture {
        fn start(&mut self) {
            self.starts += 1;
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn pdf() -> UploadedFile {
        UploadedFile::new("paper.pdf", "application/pdf", &b"%PDF-1.7"[..])
    }

    fn png() -> UploadedFile {
        UploadedFile::new("figure.png", "image/png", &b"\x89PNG"[..])
    }

    #[tokio::test]
    async fn empty_submission_is_rejected_before_any_call() {
        let backend = ScriptedBackend::default();
        let mut chat = ChatOrchestrator::new();

        chat.submit(&backend, "   ").await;

        assert!(backend.requests.lock().unwrap().is_empty());
        assert_eq!(chat.validation_message(), Some(EMPTY_SUBMISSION_MESSAGE));
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn answer_is_sanitized() {
        let backend = ScriptedBackend {
            reply: Some(serde_json::json!({
                "choices": [{"message": {"content": "<b>x</b><script>alert(1)</script>"}}]
            })),
            ..Default::default()
        };
        let mut chat = ChatOrchestrator::new();

        chat.submit(&backend, "What is x?").await;

        assert_eq!(chat.response().map(SanitizedHtml::as_str), Some("<b>x</b>"));
        assert_eq!(chat.phase(), ChatPhase::Answered);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn empty_choices_are_not_an_error() {
        let backend = ScriptedBackend {
            reply: Some(serde_json::json!({"choices": []})),
            ..Default::default()
        };
        let mut chat = ChatOrchestrator::new();

        chat.submit(&backend, "Anything?").await;

        assert_eq!(chat.validation_message(), Some(NO_RESPONSE_MESSAGE));
        assert!(chat.response().is_none());
    }

    #[tokio::test]
    async fn transport_failure_shows_generic_message() {
        let backend = ScriptedBackend::default();
        let mut chat = ChatOrchestrator::new();

        chat.submit(&backend, "Anything?").await;

        assert_eq!(chat.validation_message(), Some(GENERIC_ERROR_MESSAGE));
        assert_eq!(chat.phase(), ChatPhase::Failed);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn document_alone_is_enough_to_submit() {
        let backend = ScriptedBackend {
            reply: Some(serde_json::json!({"choices": [{"message": {"content": "summary"}}]})),
            ..Default::default()
        };
        let mut chat = ChatOrchestrator::new();
        chat.attach_document(pdf()).unwrap();

        chat.submit(&backend, "").await;

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].question, "");
        assert_eq!(
            requests[0].document.as_ref().map(|f| f.file_name.as_str()),
            Some("paper.pdf")
        );
        assert!(requests[0].image.is_none());
    }

    #[tokio::test]
    async fn attachments_replace_and_remove_independently() {
        let mut chat = ChatOrchestrator::new();
        chat.attach_document(pdf()).unwrap();
        chat.attach_document(UploadedFile::new("notes.txt", "text/plain", &b"hi"[..]))
            .unwrap();
        chat.attach_image(png()).await.unwrap();

        assert_eq!(chat.document().unwrap().file_name(), "notes.txt");

        chat.remove_document();
        assert!(chat.document().is_none());
        assert!(chat.image().is_some());

        chat.remove_image();
        assert!(chat.image().is_none());
    }

    #[tokio::test]
    async fn close_resets_everything() {
        let mut chat = ChatOrchestrator::new();
        chat.set_question("draft");
        chat.attach_document(pdf()).unwrap();
        chat.attach_image(png()).await.unwrap();
        let submission = chat.begin_submit("draft").unwrap();

        chat.close();

        assert_eq!(chat.question(), "");
        assert!(chat.response().is_none());
        assert!(chat.validation_message().is_none());
        assert!(chat.document().is_none());
        assert!(chat.image().is_none());
        assert!(!chat.is_loading());
        assert_eq!(chat.phase(), ChatPhase::Idle);

        let late = Ok(serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "too late"}}]
        }))
        .unwrap());
        assert!(!chat.finish_submit(submission.seq, late));
        assert!(chat.response().is_none());
    }

    #[test]
    fn newer_submission_wins() {
        let mut chat = ChatOrchestrator::new();
        let first = chat.begin_submit("first").unwrap();
        let second = chat.begin_submit("second").unwrap();

        assert!(!chat.finish_submit(first.seq, Err(ChatError::Status(500))));
        assert!(chat.is_loading());
        assert!(chat.validation_message().is_none());

        let answer = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "second answer"}}]
        }))
        .unwrap();
        assert!(chat.finish_submit(second.seq, Ok(answer)));
        assert_eq!(
            chat.response().map(SanitizedHtml::as_str),
            Some("second answer")
        );
    }

    #[tokio::test]
    async fn dictation_replaces_question_only_while_recording() {
        let mut chat = ChatOrchestrator::new();
        let mut capture = CountingCapture::default();
        let granted = ReportedPermission(Some(PermissionState::Granted));

        chat.append_speech_input("ignored");
        assert_eq!(chat.question(), "");

        let change = chat.toggle_recording(&granted, &mut capture).await.unwrap();
        assert_eq!(change, RecordingChange::Started);

        chat.append_speech_input("what is");
        chat.append_speech_input("what is entropy");
        assert_eq!(chat.question(), "what is entropy");

        let change = chat.toggle_recording(&granted, &mut capture).await.unwrap();
        assert_eq!(change, RecordingChange::Stopped);
        assert_eq!((capture.starts, capture.stops), (1, 1));
    }

    #[tokio::test]
    async fn denied_microphone_changes_nothing() {
        let mut chat = ChatOrchestrator::new();
        let mut capture = CountingCapture::default();
        let denied = ReportedPermission(Some(PermissionState::Denied));

        let err = chat.toggle_recording(&denied, &mut capture).await.unwrap_err();

        assert!(matches!(err, RecordingError::Denied));
        assert_eq!(err.to_string(), "Microphone access denied.");
        assert!(!chat.is_recording());
        assert_eq!(capture.starts, 0);
    }

    #[tokio::test]
    async fn prompt_permission_still_allows_capture() {
        let mut chat = ChatOrchestrator::new();
        let mut capture = CountingCapture::default();
        let prompt = ReportedPermission(Some(PermissionState::Prompt));

        chat.toggle_recording(&prompt, &mut capture).await.unwrap();
        assert!(chat.is_recording());
    }
}
