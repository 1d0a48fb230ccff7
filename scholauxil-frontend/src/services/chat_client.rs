use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::chat::{ChatBackend, ChatCompletion, ChatError, ChatRequest, UploadedFile};
use crate::services::api_client::ApiClient;
use crate::services::metrics::record_upstream;

const SERVICE: &str = "chat";

pub struct ChatClient {
    api: ApiClient,
}

impl ChatClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

fn file_part(file: UploadedFile) -> Result<Part, ChatError> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.file_name)
        .mime_str(&file.content_type)
        .map_err(ChatError::Transport)
}

/// Multipart body `question`, `file?`, `image?`.
fn multipart_body(request: ChatRequest) -> Result<Form, ChatError> {
    let mut form = Form::new().text("question", request.question);
    if let Some(document) = request.document {
        form = form.part("file", file_part(document)?);
    }
    if let Some(image) = request.image {
        form = form.part("image", file_part(image)?);
    }
    Ok(form)
}

#[async_trait]
impl ChatBackend for ChatClient {
    #[tracing::instrument(skip_all, fields(
        has_file = request.document.is_some(),
        has_image = request.image.is_some(),
    ))]
    async fn ask(&self, request: ChatRequest) -> Result<ChatCompletion, ChatError> {
        let form = multipart_body(request)?;

        let response = self
            .api
            .post("/chat")
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                record_upstream(SERVICE, "error");
                ChatError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            record_upstream(SERVICE, "rejected");
            return Err(ChatError::Status(status.as_u16()));
        }

        let body = response.json::<serde_json::Value>().await.map_err(|e| {
            record_upstream(SERVICE, "error");
            ChatError::Decode(e.to_string())
        })?;
        record_upstream(SERVICE, "ok");
        Ok(ChatCompletion::from_value(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatOrchestrator, NO_RESPONSE_MESSAGE};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_multipart_with_document_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_string_contains(r#"name="question""#))
            .and(body_string_contains(r#"name="file"; filename="paper.pdf""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "<p>Summary</p>"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(ApiClient::new(format!("{}/api", server.uri())));
        let completion = client
            .ask(ChatRequest {
                question: String::new(),
                document: Some(UploadedFile::new(
                    "paper.pdf",
                    "application/pdf",
                    &b"%PDF-1.7"[..],
                )),
                image: None,
            })
            .await
            .unwrap();

        assert_eq!(completion.first_answer(), Some("<p>Summary</p>"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ChatClient::new(ApiClient::new(format!("{}/api", server.uri())));
        let err = client
            .ask(ChatRequest {
                question: "hello".to_string(),
                document: None,
                image: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Status(500)));
    }

    #[tokio::test]
    async fn null_choices_read_as_no_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": null})),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(ApiClient::new(format!("{}/api", server.uri())));
        let mut chat = ChatOrchestrator::new();
        chat.submit(&client, "hello").await;

        assert_eq!(chat.validation_message(), Some(NO_RESPONSE_MESSAGE));
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = ChatClient::new(ApiClient::new(format!("{}/api", server.uri())));
        let err = client
            .ask(ChatRequest {
                question: "hello".to_string(),
                document: None,
                image: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Decode(_)));
    }
}
