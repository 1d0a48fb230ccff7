use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key holding the serialized [`SessionContext`].
pub const SESSION_CONTEXT_KEY: &str = "session_context";

/// Tokens are refreshed this many seconds before the provider would reject them.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// The signed-in user as seen by this front-end.
///
/// Handlers receive it explicitly (request extension or extractor); there is no
/// process-wide "current user".
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub email: String,
    id_token: String,
    refresh_token: String,
    /// Unix seconds after which `id_token` is no longer accepted.
    pub expires_at: i64,
}

impl SessionContext {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            id_token: id_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn needs_refresh(&self, now: i64) -> bool {
        now >= self.expires_at - EXPIRY_SKEW_SECONDS
    }

    pub fn is_expired(&self) -> bool {
        self.needs_refresh(Utc::now().timestamp())
    }

    /// Swap in freshly issued tokens, keeping the user identity.
    pub fn with_tokens(mut self, id_token: String, refresh_token: String, expires_at: i64) -> Self {
        self.id_token = id_token;
        self.refresh_token = refresh_token;
        self.expires_at = expires_at;
        self
    }

    pub async fn load(session: &Session) -> Result<Option<Self>, tower_sessions::session::Error> {
        session.get(SESSION_CONTEXT_KEY).await
    }

    pub async fn store(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(SESSION_CONTEXT_KEY, self).await
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
