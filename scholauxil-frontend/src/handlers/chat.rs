use askama::Template;
use axum::{
    extract::{Multipart, State},
    response::Html,
    Extension, Form,
};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::middleware::RequestId;

use crate::chat::{
    ChatBackend, ChatOrchestrator, PageCapture, PermissionState, RecordingError,
    ReportedPermission, UploadedFile, DOCUMENT_ACCEPT, IMAGE_ACCEPT, MICROPHONE_DENIED_MESSAGE,
    PROMPT_SUGGESTIONS,
};
use crate::error::{render, FrontendError};
use crate::models::AuthUser;
use crate::services::chat_client::ChatClient;
use crate::AppState;

#[derive(Template)]
#[template(path = "fragments/chat.html")]
pub struct ChatFragment {
    pub question: String,
    pub response_html: Option<String>,
    pub validation_message: Option<String>,
    pub microphone_error: Option<String>,
    pub recording: bool,
    pub document_name: Option<String>,
    pub document_icon: &'static str,
    pub image_preview: Option<String>,
    pub suggestions: &'static [&'static str],
    pub document_accept: &'static str,
    pub image_accept: &'static str,
}

impl ChatFragment {
    pub fn from_state(chat: &ChatOrchestrator) -> Self {
        Self {
            question: chat.question().to_string(),
            response_html: chat
                .response()
                .filter(|_| !chat.is_loading())
                .map(|html| html.as_str().to_string()),
            validation_message: chat.validation_message().map(str::to_string),
            microphone_error: None,
            recording: chat.is_recording(),
            document_name: chat.document().map(|d| d.file_name().to_string()),
            document_icon: chat.document().map(|d| d.icon()).unwrap_or_default(),
            image_preview: chat.image().map(|i| i.preview.clone()),
            suggestions: &PROMPT_SUGGESTIONS,
            document_accept: DOCUMENT_ACCEPT,
            image_accept: IMAGE_ACCEPT,
        }
    }
}

/// Apply `update` to the user's chat and re-render the widget.
async fn with_chat(
    state: &AppState,
    user: &AuthUser,
    update: impl FnOnce(&mut ChatOrchestrator),
) -> Result<Html<String>, FrontendError> {
    let dashboard = state.workspaces.get_or_create(&user.user_id);
    let mut dashboard = dashboard.lock().await;
    update(&mut dashboard.chat);
    render(&ChatFragment::from_state(&dashboard.chat))
}

#[derive(Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub question: String,
}

/// Typed text or a clicked prompt suggestion.
pub async fn set_question(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<QuestionForm>,
) -> Result<Html<String>, FrontendError> {
    with_chat(&state, &user, |chat| chat.set_question(form.question)).await
}

#[derive(Deserialize)]
pub struct TranscriptForm {
    #[serde(default)]
    pub transcript: String,
}

pub async fn speech_transcript(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<TranscriptForm>,
) -> Result<Html<String>, FrontendError> {
    with_chat(&state, &user, |chat| chat.append_speech_input(&form.transcript)).await
}

#[derive(Deserialize)]
pub struct RecordingForm {
    /// Result of the page's `navigator.permissions.query({name: "microphone"})`.
    pub permission: Option<PermissionState>,
}

pub async fn toggle_recording(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<RecordingForm>,
) -> Result<Html<String>, FrontendError> {
    let dashboard = state.workspaces.get_or_create(&user.user_id);
    let mut dashboard = dashboard.lock().await;

    let permissions = ReportedPermission(form.permission);
    let mut capture = PageCapture;
    let microphone_error = match dashboard
        .chat
        .toggle_recording(&permissions, &mut capture)
        .await
    {
        Ok(change) => {
            tracing::debug!(?change, "Recording toggled");
            None
        }
        Err(RecordingError::Denied) => Some(MICROPHONE_DENIED_MESSAGE.to_string()),
        // Already logged; the widget stays as it was.
        Err(RecordingError::PermissionQuery(_)) => None,
    };

    render(&ChatFragment {
        microphone_error,
        ..ChatFragment::from_state(&dashboard.chat)
    })
}

/// Fields of a chat form post. Browsers send empty file inputs as parts with
/// no file name; those are ignored.
#[derive(Default)]
struct ChatUpload {
    question: Option<String>,
    document: Option<UploadedFile>,
    image: Option<UploadedFile>,
}

impl ChatUpload {
    async fn read(mut multipart: Multipart) -> Result<Self, FrontendError> {
        let mut upload = ChatUpload::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "question" => upload.question = Some(field.text().await?),
                "file" | "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() {
                        continue;
                    }
                    let file = UploadedFile::new(file_name, content_type, bytes);
                    if name == "file" {
                        upload.document = Some(file);
                    } else {
                        upload.image = Some(file);
                    }
                }
                other => tracing::debug!(field = other, "Ignoring unknown chat field"),
            }
        }

        Ok(upload)
    }
}

pub async fn attach_document(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Html<String>, FrontendError> {
    let upload = ChatUpload::read(multipart).await?;
    let dashboard = state.workspaces.get_or_create(&user.user_id);
    let mut dashboard = dashboard.lock().await;
    if let Some(file) = upload.document {
        dashboard.chat.attach_document(file)?;
    }
    render(&ChatFragment::from_state(&dashboard.chat))
}

pub async fn remove_document(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Html<String>, FrontendError> {
    with_chat(&state, &user, ChatOrchestrator::remove_document).await
}

pub async fn attach_image(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Html<String>, FrontendError> {
    let upload = ChatUpload::read(multipart).await?;
    let dashboard = state.workspaces.get_or_create(&user.user_id);
    let mut dashboard = dashboard.lock().await;
    if let Some(file) = upload.image {
        dashboard.chat.attach_image(file).await?;
    }
    render(&ChatFragment::from_state(&dashboard.chat))
}

pub async fn remove_image(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Html<String>, FrontendError> {
    with_chat(&state, &user, ChatOrchestrator::remove_image).await
}

/// Ask the research assistant. Files in the post replace the stored
/// attachments; the upstream call runs without holding the dashboard lock
/// and always reaches `finish_submit`.
pub async fn submit(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Html<String>, FrontendError> {
    let upload = ChatUpload::read(multipart).await?;
    let dashboard = state.workspaces.get_or_create(&user.user_id);

    let submission = {
        let mut dashboard = dashboard.lock().await;
        if let Some(file) = upload.document {
            dashboard.chat.attach_document(file)?;
        }
        if let Some(file) = upload.image {
            dashboard.chat.attach_image(file).await?;
        }

        let question = upload
            .question
            .unwrap_or_else(|| dashboard.chat.question().to_string());
        match dashboard.chat.begin_submit(&question) {
            Ok(submission) => submission,
            Err(_) => return render(&ChatFragment::from_state(&dashboard.chat)),
        }
    };

    let backend = ChatClient::new(
        state
            .chat_api
            .for_session(&user.session)
            .with_request_id(Some(request_id.as_str())),
    );
    // Detached so the submission still settles if the client goes away.
    let settled = tokio::spawn(async move {
        let outcome = backend.ask(submission.request).await;
        let mut dashboard = dashboard.lock().await;
        dashboard.chat.finish_submit(submission.seq, outcome);
        ChatFragment::from_state(&dashboard.chat)
    })
    .await
    .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

    render(&settled)
}

pub async fn close(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Html<String>, FrontendError> {
    with_chat(&state, &user, ChatOrchestrator::close).await
}
