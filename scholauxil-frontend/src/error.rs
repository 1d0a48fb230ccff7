use askama::Template;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use service_core::error::AppError;
use thiserror::Error;

use crate::chat::AttachmentError;

/// Inline error shown inside the HTMX target.
#[derive(Template)]
#[template(path = "fragments/error.html")]
pub struct ErrorFragment<'a> {
    pub message: &'a str,
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("session store failure: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    App(#[from] AppError),
}

fn fragment(status: StatusCode, message: &str) -> Response {
    match (ErrorFragment { message }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => status.into_response(),
    }
}

impl IntoResponse for FrontendError {
    fn into_response(self) -> Response {
        match self {
            FrontendError::App(err) => err.into_response(),
            FrontendError::Attachment(err) => {
                fragment(StatusCode::UNSUPPORTED_MEDIA_TYPE, &err.to_string())
            }
            FrontendError::Multipart(err) => {
                tracing::warn!(error = %err, "Rejected upload");
                fragment(err.status(), "The upload could not be read.")
            }
            FrontendError::Session(_) | FrontendError::Template(_) => {
                tracing::error!(error = %self, "Request failed");
                fragment(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        }
    }
}

/// Render a template into an HTML response body.
pub fn render(template: &impl Template) -> Result<Html<String>, FrontendError> {
    Ok(Html(template.render()?))
}
