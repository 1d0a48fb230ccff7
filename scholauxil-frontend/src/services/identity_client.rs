//! Firebase Identity Toolkit REST client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::observability::{TracedClientExt, TracedRequest};

use crate::config::IdentitySettings;
use crate::services::metrics::record_upstream;
use crate::session::{IdentityError, IdentityProvider, IssuedTokens};

const SERVICE: &str = "identity";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

/// The Secure Token service answers in snake_case, unlike the Toolkit.
#[derive(Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn parse_expires_in(raw: &str) -> Result<i64, IdentityError> {
    raw.parse()
        .map_err(|_| IdentityError::Decode(format!("invalid expiresIn '{}'", raw)))
}

pub struct IdentityClient {
    client: Client,
    settings: IdentitySettings,
}

impl IdentityClient {
    pub fn new(settings: IdentitySettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn toolkit_url(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.settings.base_url, method)
    }

    /// Turn a provider response into `T`, or into `Rejected` with the
    /// provider's error code (`EMAIL_NOT_FOUND`, `INVALID_PASSWORD`, ...).
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IdentityError> {
        let status = response.status();

        if !status.is_success() {
            let code = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| "UNKNOWN".to_string());
            record_upstream(SERVICE, "rejected");
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                code,
            });
        }

        let body = response.json::<T>().await.map_err(|e| {
            record_upstream(SERVICE, "error");
            IdentityError::Decode(e.to_string())
        })?;
        record_upstream(SERVICE, "ok");
        Ok(body)
    }

    async fn send(&self, request: TracedRequest) -> Result<reqwest::Response, IdentityError> {
        request
            .query(&[("key", self.settings.api_key.expose_secret().as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Identity provider request failed");
                record_upstream(SERVICE, "error");
                IdentityError::Transport(e)
            })
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedTokens, IdentityError> {
        let request = self
            .client
            .traced_post(&self.toolkit_url("signInWithPassword"))
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            });

        let body: SignInResponse = Self::read(self.send(request).await?).await?;

        Ok(IssuedTokens {
            user_id: body.local_id,
            email: body.email,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_in: parse_expires_in(&body.expires_in)?,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn send_password_reset_email(&self, email: &str) -> Result<(), IdentityError> {
        let request = self
            .client
            .traced_post(&self.toolkit_url("sendOobCode"))
            .json(&OobCodeRequest {
                request_type: "PASSWORD_RESET",
                email,
            });

        let _: serde_json::Value = Self::read(self.send(request).await?).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, IdentityError> {
        let request = self
            .client
            .traced_post(&format!("{}/token", self.settings.token_url))
            .form(&RefreshRequest {
                grant_type: "refresh_token",
                refresh_token,
            });

        let body: RefreshResponse = Self::read(self.send(request).await?).await?;

        Ok(IssuedTokens {
            user_id: body.user_id,
            email: None,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_in: parse_expires_in(&body.expires_in)?,
        })
    }
}
