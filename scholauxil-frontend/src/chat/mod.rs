pub mod attachment;
pub mod completion;
pub mod orchestrator;
pub mod sanitize;
pub mod speech;

pub use attachment::{
    AttachmentError, DocumentAttachment, ImageAttachment, UploadedFile, DOCUMENT_ACCEPT,
    IMAGE_ACCEPT,
};
pub use completion::ChatCompletion;
pub use orchestrator::{
    ChatBackend, ChatError, ChatOrchestrator, ChatPhase, ChatRequest, EmptySubmission,
    Submission, NO_RESPONSE_MESSAGE, PROMPT_SUGGESTIONS,
};
pub use sanitize::{sanitize, SanitizedHtml};
pub use speech::{
    MicrophonePermissions, PageCapture, PermissionState, RecordingChange, RecordingError,
    ReportedPermission, SpeechCapture, MICROPHONE_DENIED_MESSAGE,
};
