use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use thiserror::Error;

/// `accept` attribute of the document picker.
pub const DOCUMENT_ACCEPT: &str = ".pdf,.doc,.docx,.txt,.xlsx,.xls";
pub const IMAGE_ACCEPT: &str = "image/*";

const DOCUMENT_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "txt", "xlsx", "xls"];
const DEFAULT_ICON: &str = "/static/images/icons/default.png";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("not an image: {0}")]
    NotAnImage(String),

    #[error("failed to build image preview: {0}")]
    Preview(String),
}

/// A file as received from the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAttachment {
    pub file: UploadedFile,
}

impl DocumentAttachment {
    pub fn accept(file: UploadedFile) -> Result<Self, AttachmentError> {
        match file.extension() {
            Some(ext) if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) => Ok(Self { file }),
            _ => Err(AttachmentError::UnsupportedDocument(file.file_name)),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file.file_name
    }

    pub fn icon(&self) -> &'static str {
        document_icon(&self.file.file_name)
    }
}

/// Icon shown next to an attached document, by extension.
pub fn document_icon(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "/static/images/icons/pdf.png",
        Some("doc") | Some("docx") => "/static/images/icons/docx.png",
        Some("txt") => "/static/images/icons/txt.png",
        Some("xlsx") | Some("xls") => "/static/images/icons/excel.png",
        _ => DEFAULT_ICON,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file: UploadedFile,
    /// `data:` URL for the inline preview.
    pub preview: String,
}

impl ImageAttachment {
    /// Encode the preview off the async executor; the attachment only exists
    /// once encoding has finished.
    pub async fn read(file: UploadedFile) -> Result<Self, AttachmentError> {
        if !file.content_type.starts_with("image/") {
            return Err(AttachmentError::NotAnImage(file.content_type));
        }

        let content_type = file.content_type.clone();
        let bytes = file.bytes.clone();
        let preview = tokio::task::spawn_blocking(move || data_url(&content_type, &bytes))
            .await
            .map_err(|e| AttachmentError::Preview(e.to_string()))?;

        Ok(Self { file, preview })
    }
}

pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type,
        general_purpose::STANDARD.encode(bytes)
    )
}
