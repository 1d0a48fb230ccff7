#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use scholauxil_frontend::config::{
    BackendSettings, IdentitySettings, PlagiarismSettings, ServerSettings, Settings,
};
use scholauxil_frontend::startup::build_router;
use scholauxil_frontend::AppState;
use secrecy::Secret;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// ID token for uid_123 / ada@example.com expiring in 2030.
pub const FRESH_ID_TOKEN: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1aWRfMTIzIiwidXNlcl9pZCI6InVpZF8xMjMiLCJlbWFpbCI6ImFkYUBleGFtcGxlLmNvbSIsImV4cCI6MTkwMDAwMDAwMCwiaWF0IjoxODAwMDAwMDAwfQ.signature";

/// Same user, token expired long ago.
pub const EXPIRED_ID_TOKEN: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1aWRfMTIzIiwiZW1haWwiOiJhZGFAZXhhbXBsZS5jb20iLCJleHAiOjEwMDAsImlhdCI6OTAwfQ.signature";

pub const MULTIPART_BOUNDARY: &str = "scholauxil-test-boundary";

pub fn settings_for(upstream: &MockServer) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            landing_path: "/".to_string(),
            secure_cookies: false,
            session_inactivity_hours: 1,
            max_upload_bytes: 1024 * 1024,
            static_dir: "static".to_string(),
        },
        identity: IdentitySettings {
            api_key: Secret::new("web-key".to_string()),
            base_url: format!("{}/v1", upstream.uri()),
            token_url: format!("{}/securetoken", upstream.uri()),
        },
        backend: BackendSettings {
            api_base_url: format!("{}/api", upstream.uri()),
        },
        plagiarism: PlagiarismSettings {
            base_url: format!("{}/plagiarism", upstream.uri()),
        },
        navigation: Default::default(),
        telemetry: Default::default(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upstream: MockServer,
    pub cookie: Option<String>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let upstream = MockServer::start().await;
        let state = AppState::new(settings_for(&upstream));
        let router = build_router(state.clone());
        Self {
            router,
            state,
            upstream,
            cookie: None,
        }
    }

    /// Send `request` with the current session cookie and keep any new one.
    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("HX-Request", "true")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Multipart post; each part is `(name, file name, content type, data)`.
    pub async fn post_multipart(
        &mut self,
        uri: &str,
        parts: &[(&str, Option<&str>, &str, &[u8])],
    ) -> Response<Body> {
        let mut body = Vec::new();
        for (name, file_name, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("HX-Request", "true")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Mock a successful Identity Toolkit sign-in and log in through `/login`.
    pub async fn sign_in_with(&mut self, id_token: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "localId": "uid_123",
                "email": "ada@example.com",
                "idToken": id_token,
                "refreshToken": "refresh-1",
                "expiresIn": "3600"
            })))
            .mount(&self.upstream)
            .await;

        let response = self
            .post_form("/login", "email=ada%40example.com&password=hunter22")
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["HX-Redirect"], "/dashboard");
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
