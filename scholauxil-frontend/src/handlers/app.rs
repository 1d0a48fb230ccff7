use askama::Template;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::session::SessionContext;

#[derive(Template)]
#[template(path = "index.html")]
pub struct LandingTemplate {}

/// Landing page; visitors who are already signed in go straight to the dashboard.
pub async fn landing(session: Session) -> Response {
    match SessionContext::load(&session).await {
        Ok(Some(_)) => Redirect::to("/dashboard").into_response(),
        _ => LandingTemplate {}.into_response(),
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
