use crate::session::IdentityProvider;

pub const RESET_SENT_MESSAGE: &str = "Password reset email sent! Please check your inbox.";
pub const RESET_FAILED_MESSAGE: &str = "Error";

/// Forgot-password form. The identity provider decides whether the address is
/// valid; nothing is checked locally.
#[derive(Debug, Default, Clone)]
pub struct CredentialRecoveryForm {
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl CredentialRecoveryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn request_reset(&mut self, provider: &dyn IdentityProvider, email: &str) {
        self.email = email.to_string();
        self.error = None;
        self.success = None;

        match provider.send_password_reset_email(email).await {
            Ok(()) => {
                tracing::info!("Password reset email requested");
                self.success = Some(RESET_SENT_MESSAGE.to_string());
            }
            Err(e) => {
                // Provider codes like EMAIL_NOT_FOUND stay in the log.
                tracing::warn!(error = %e, "Password reset request failed");
                self.error = Some(RESET_FAILED_MESSAGE.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{IdentityError, IssuedTokens};
    use async_trait::async_trait;

    struct StubProvider {
        accept: bool,
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn sign_in(&self, _: &str, _: &str) -> Result<IssuedTokens, IdentityError> {
            unimplemented!("not used by the recovery form")
        }

        async fn send_password_reset_email(&self, _email: &str) -> Result<(), IdentityError> {
            if self.accept {
                Ok(())
            } else {
                Err(IdentityError::Rejected {
                    status: 400,
                    code: "EMAIL_NOT_FOUND".to_string(),
                })
            }
        }

        async fn refresh(&self, _: &str) -> Result<IssuedTokens, IdentityError> {
            unimplemented!("not used by the recovery form")
        }
    }

    #[tokio::test]
    async fn success_sets_message_and_clears_error() {
        let mut form = CredentialRecoveryForm {
            error: Some("old".to_string()),
            ..Default::default()
        };
        form.request_reset(&StubProvider { accept: true }, "ada@example.com")
            .await;

        assert_eq!(form.success.as_deref(), Some(RESET_SENT_MESSAGE));
        assert_eq!(form.error, None);
    }

    #[tokio::test]
    async fn failure_is_generic() {
        let mut form = CredentialRecoveryForm::new();
        form.request_reset(&StubProvider { accept: false }, "nobody@example.com")
            .await;

        assert_eq!(form.error.as_deref(), Some("Error"));
        assert_eq!(form.success, None);
        assert!(!form.error.unwrap().contains("EMAIL_NOT_FOUND"));
    }
}
