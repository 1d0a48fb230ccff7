use reqwest::Client;
use service_core::observability::{TracedClientExt, TracedRequest};

use crate::session::SessionContext;

/// Client for the research-assistant API.
///
/// `for_session` returns a copy that sends the user's ID token as
/// `Authorization: Bearer` on every request; the connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    id_token: Option<String>,
    request_id: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            id_token: None,
            request_id: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn for_session(&self, session: &SessionContext) -> Self {
        Self {
            id_token: Some(session.id_token().to_string()),
            ..self.clone()
        }
    }

    /// Forward the inbound request id on every call made through this copy.
    pub fn with_request_id(self, request_id: Option<&str>) -> Self {
        Self {
            request_id: request_id.map(str::to_string),
            ..self
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn post(&self, path: &str) -> TracedRequest {
        let request = self
            .client
            .traced_post(&self.url(path))
            .request_id(self.request_id.as_deref());

        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn session_copy_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ping"))
            .and(header("authorization", "Bearer id-token"))
            .and(header("x-request-id", "req-7"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(format!("{}/api/", server.uri()));
        let session = SessionContext::new("uid", "a@b.c", "id-token", "refresh", i64::MAX);

        let response = api
            .for_session(&session)
            .with_request_id(Some("req-7"))
            .post("/ping")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 204);
    }
}
