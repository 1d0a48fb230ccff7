use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tower_sessions::Session;

use crate::session::{AuthState, GuardView, Navigator, SessionContext, SessionGuard};
use crate::subscription::Notifier;
use crate::AppState;

/// Work out where the session stands, refreshing an expired ID token on the way.
async fn resolve_auth_state(state: &AppState, session: &Session) -> AuthState {
    let context = match SessionContext::load(session).await {
        Ok(Some(context)) => context,
        Ok(None) => return AuthState::SignedOut,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read session");
            return AuthState::Unresolved;
        }
    };

    let now = Utc::now().timestamp();
    if !context.needs_refresh(now) {
        return AuthState::SignedIn(context);
    }

    match state.identity.refresh(context.refresh_token()).await {
        Ok(tokens) => {
            let refreshed =
                context.with_tokens(tokens.id_token, tokens.refresh_token, now + tokens.expires_in);
            if let Err(e) = refreshed.store(session).await {
                tracing::error!(error = %e, "Failed to store refreshed session");
                return AuthState::Unresolved;
            }
            tracing::debug!(user_id = %refreshed.user_id, "ID token refreshed");
            AuthState::SignedIn(refreshed)
        }
        Err(e) => {
            tracing::warn!(user_id = %context.user_id, error = %e, "Token refresh failed, signing out");
            if let Err(e) = session.flush().await {
                tracing::error!(error = %e, "Failed to clear session");
            }
            state.workspaces.remove(&context.user_id);
            AuthState::SignedOut
        }
    }
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Full-page navigations get a 303; HTMX swaps get `HX-Redirect` so the
/// whole page moves instead of the target element.
pub fn redirect_to(headers: &HeaderMap, path: &str) -> Response {
    if is_htmx(headers) {
        match HeaderValue::from_str(path) {
            Ok(value) => {
                let mut response = StatusCode::OK.into_response();
                response.headers_mut().insert("HX-Redirect", value);
                response
            }
            Err(_) => Redirect::to("/").into_response(),
        }
    } else {
        Redirect::to(path).into_response()
    }
}

/// Remembers where the guard asked to go during one request.
#[derive(Default)]
struct PendingRedirect(Mutex<Option<String>>);

impl PendingRedirect {
    fn take(&self) -> Option<String> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl Navigator for PendingRedirect {
    fn navigate(&self, path: &str) {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(path.to_string());
    }
}

/// Guards the dashboard routes. Signed-in requests continue with the
/// [`SessionContext`] as an extension; signed-out ones are sent to the
/// landing page; an unreadable session renders nothing.
///
/// Each request mounts a guard on its own auth-state feed, publishes the
/// resolved state once, and unmounts before the handler runs.
pub async fn session_guard(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_state = resolve_auth_state(&state, &session).await;

    let (redirect, view) = {
        let feed: Notifier<AuthState> = Notifier::new();
        let navigator = Arc::new(PendingRedirect::default());
        let mounted = SessionGuard::mount(
            state.settings.server.landing_path.as_str(),
            &feed,
            navigator.clone(),
        );
        feed.notify(&auth_state);
        let view = mounted.view();
        mounted.unmount();
        (navigator.take(), view)
    };

    if let Some(path) = redirect {
        return redirect_to(request.headers(), &path);
    }

    match view {
        GuardView::Children(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        GuardView::Placeholder => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
