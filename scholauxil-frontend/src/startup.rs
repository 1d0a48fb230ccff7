use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use service_core::observability::REQUEST_ID_HEADER;
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, landing},
    auth::{
        forgot_password_handler, forgot_password_page, login_handler, login_page, logout_handler,
    },
    chat, dashboard, plagiarism,
};
use crate::middleware::{metrics_middleware, session_guard};
use crate::AppState;

/// Routes that need a signed-in user.
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::dashboard_page))
        .route("/dashboard/view/:view", post(dashboard::select_view))
        .route("/dashboard/collapse", post(dashboard::collapse))
        .route("/dashboard/viewport", post(dashboard::viewport))
        .route("/dashboard/flash", delete(dashboard::dismiss_flash))
        .route("/dashboard/plagiarism", post(plagiarism::check))
        .route("/dashboard/chat", post(chat::submit))
        .route("/dashboard/chat/question", post(chat::set_question))
        .route("/dashboard/chat/transcript", post(chat::speech_transcript))
        .route("/dashboard/chat/recording", post(chat::toggle_recording))
        .route("/dashboard/chat/document", post(chat::attach_document))
        .route("/dashboard/chat/document/remove", post(chat::remove_document))
        .route("/dashboard/chat/image", post(chat::attach_image))
        .route("/dashboard/chat/image/remove", post(chat::remove_image))
        .route("/dashboard/chat/close", post(chat::close))
        .route("/logout", post(logout_handler))
        .route_layer(from_fn_with_state(state.clone(), session_guard))
}

pub fn build_router(state: AppState) -> Router {
    let server = state.settings.server.clone();

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            server.session_inactivity_hours,
        )));

    let mut public = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route("/login", get(login_page).post(login_handler))
        .route(
            "/forgot-password",
            get(forgot_password_page).post(forgot_password_handler),
        );
    if server.landing_path != "/login" {
        public = public.route(&server.landing_path, get(landing));
    }

    Router::new()
        .merge(public)
        .merge(protected_routes(&state))
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
