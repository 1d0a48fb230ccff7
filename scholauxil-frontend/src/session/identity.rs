use async_trait::async_trait;
use thiserror::Error;

/// Tokens issued by the identity provider after sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub user_id: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Lifetime of `id_token` in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an error code such as `EMAIL_NOT_FOUND`.
    #[error("identity provider rejected the request ({status}): {code}")]
    Rejected { status: u16, code: String },

    #[error("unexpected identity provider response: {0}")]
    Decode(String),
}

/// The external identity service. Sign-in, token issuance and password reset
/// all live there; this crate only calls it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedTokens, IdentityError>;

    async fn send_password_reset_email(&self, email: &str) -> Result<(), IdentityError>;

    async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, IdentityError>;
}
