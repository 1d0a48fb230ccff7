use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use service_core::observability::TracedClientExt;

use crate::config::PlagiarismSettings;
use crate::plagiarism::{PlagiarismBackend, PlagiarismError, PlagiarismErrorBody, PlagiarismReport};
use crate::services::metrics::record_upstream;

const SERVICE: &str = "plagiarism";

#[derive(Serialize)]
struct CheckRequest<'a> {
    text: &'a str,
}

pub struct PlagiarismClient {
    client: Client,
    settings: PlagiarismSettings,
}

impl PlagiarismClient {
    pub fn new(settings: PlagiarismSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl PlagiarismBackend for PlagiarismClient {
    #[tracing::instrument(skip_all, fields(chars = text.chars().count()))]
    async fn check_plagiarism(&self, text: &str) -> Result<PlagiarismReport, PlagiarismError> {
        let url = format!("{}/check-plagiarism", self.settings.base_url);

        let response = self
            .client
            .traced_post(&url)
            .json(&CheckRequest { text })
            .send()
            .await
            .map_err(|e| {
                record_upstream(SERVICE, "error");
                PlagiarismError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            record_upstream(SERVICE, "rejected");
            let message = response
                .json::<PlagiarismErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error);
            return Err(PlagiarismError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| {
            record_upstream(SERVICE, "error");
            PlagiarismError::Decode(e.to_string())
        })?;
        record_upstream(SERVICE, "ok");
        Ok(PlagiarismReport::from_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PlagiarismClient {
        PlagiarismClient::new(PlagiarismSettings {
            base_url: format!("{}/api", server.uri()),
        })
    }

    #[tokio::test]
    async fn report_is_returned_verbatim() {
        let server = MockServer::start().await;
        let report = serde_json::json!({"score": 0.12, "matches": [{"source": "wiki"}]});
        Mock::given(method("POST"))
            .and(path("/api/check-plagiarism"))
            .and(body_json(serde_json::json!({"text": "  some text  "})))
            .respond_with(ResponseTemplate::new(200).set_body_json(report.clone()))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .check_plagiarism("  some text  ")
            .await
            .unwrap();

        assert_eq!(result, PlagiarismReport(report));
    }

    #[tokio::test]
    async fn plain_text_report_is_kept_as_a_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check-plagiarism"))
            .respond_with(ResponseTemplate::new(200).set_body_string("No matches found"))
            .mount(&server)
            .await;

        let result = client_for(&server).check_plagiarism("text").await.unwrap();

        assert_eq!(
            result,
            PlagiarismReport(serde_json::Value::String("No matches found".to_string()))
        );
        assert_eq!(result.pretty(), "\"No matches found\"");
    }

    #[tokio::test]
    async fn server_error_text_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check-plagiarism"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"error": "Quota exceeded"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .check_plagiarism("text")
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Quota exceeded");
    }

    #[tokio::test]
    async fn error_without_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check-plagiarism"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .check_plagiarism("text")
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Something went wrong");
    }
}
