use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::session::SessionContext;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    pub email: String,
}

impl UserProfile {
    pub fn name(&self) -> String {
        self.email.split('@').next().unwrap_or("User").to_string()
    }

    pub fn initials(&self) -> String {
        let initials: String = self.name().chars().take(2).collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials.to_uppercase()
        }
    }
}

/// Signed-in user, as admitted by the session guard.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub session: SessionContext,
}

impl AuthUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present behind `session_guard`.
        let session = parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;

        Ok(AuthUser {
            user_id: session.user_id.clone(),
            email: session.email.clone(),
            session,
        })
    }
}
