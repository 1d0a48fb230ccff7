use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::error::{render, ErrorFragment, FrontendError};
use crate::flash::{self, FlashKind, FlashMessage};
use crate::middleware::redirect_to;
use crate::models::AuthUser;
use crate::recovery::CredentialRecoveryForm;
use crate::session::SessionContext;
use crate::utils::jwt::decode_id_token_claims;
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {}

#[derive(Template)]
#[template(path = "forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub form_html: String,
}

#[derive(Template)]
#[template(path = "fragments/recovery.html")]
pub struct RecoveryFragment {
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl RecoveryFragment {
    pub fn from_form(form: &CredentialRecoveryForm) -> Self {
        Self {
            email: form.email.clone(),
            error: form.error.clone(),
            success: form.success.clone(),
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub email: String,
}

fn login_error(message: &str) -> Response {
    match (ErrorFragment { message }).render() {
        Ok(html) => (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response(),
        Err(_) => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    }
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {}
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, FrontendError> {
    if payload.validate().is_err() {
        return Ok(login_error("Please enter a valid email and password"));
    }

    let tokens = match state.identity.sign_in(&payload.email, &payload.password).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in rejected");
            return Ok(login_error("Invalid email or password"));
        }
    };

    // Prefer the token's own expiry; fall back to the advertised lifetime.
    let expires_at = match decode_id_token_claims(&tokens.id_token) {
        Ok(claims) => claims.exp,
        Err(e) => {
            tracing::debug!(error = %e, "ID token claims unreadable");
            Utc::now().timestamp() + tokens.expires_in
        }
    };

    let context = SessionContext::new(
        tokens.user_id,
        tokens.email.unwrap_or(payload.email),
        tokens.id_token,
        tokens.refresh_token,
        expires_at,
    );

    session.cycle_id().await?;
    context.store(&session).await?;
    flash::push(
        &session,
        FlashMessage::new(FlashKind::Success, "Signed in successfully."),
    )
    .await;

    tracing::info!(user_id = %context.user_id, "User signed in");

    Ok(redirect_to(&headers, "/dashboard"))
}

/// Sign out: forget the dashboard state and the session, then leave for the
/// landing page.
pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    user: AuthUser,
) -> Result<Response, FrontendError> {
    let dashboard = state.workspaces.get_or_create(&user.user_id);
    let navigation = dashboard.lock().await.navigation.clone();
    navigation.logout(|| state.workspaces.remove(&user.user_id));

    session.flush().await?;
    tracing::info!(user_id = %user.user_id, "User signed out");

    Ok(redirect_to(&headers, &state.settings.server.landing_path))
}

pub async fn forgot_password_page() -> Result<Html<String>, FrontendError> {
    let form_html = RecoveryFragment::from_form(&CredentialRecoveryForm::new()).render()?;
    render(&ForgotPasswordTemplate { form_html })
}

pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Form(payload): Form<ResetRequest>,
) -> Result<Html<String>, FrontendError> {
    let mut form = CredentialRecoveryForm::new();
    form.request_reset(state.identity.as_ref(), &payload.email)
        .await;
    render(&RecoveryFragment::from_form(&form))
}
