mod common;

use axum::http::StatusCode;
use common::{body_text, TestApp};

#[tokio::test]
async fn health_check_works() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/login").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn metrics_are_exposed() {
    scholauxil_frontend::services::metrics::init_metrics().unwrap();
    let mut app = TestApp::spawn().await;

    app.get("/health").await;
    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("http_requests_total"));
}
