use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

/// Claims of a Firebase ID token that the dashboard reads.
#[derive(Debug, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Decode ID-token claims without verifying the signature.
///
/// The token was just issued to this server by the identity provider over
/// TLS; only the expiry and the user identity are read from it.
pub fn decode_id_token_claims(token: &str) -> Result<IdTokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: IdTokenClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_id_token_claims() {
        // Payload: {"sub":"uid_123","user_id":"uid_123","email":"ada@example.com","exp":1900000000,"iat":1800000000}
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1aWRfMTIzIiwidXNlcl9pZCI6InVpZF8xMjMiLCJlbWFpbCI6ImFkYUBleGFtcGxlLmNvbSIsImV4cCI6MTkwMDAwMDAwMCwiaWF0IjoxODAwMDAwMDAwfQ.signature";

        let claims = decode_id_token_claims(token).unwrap();
        assert_eq!(claims.sub, "uid_123");
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.exp, 1_900_000_000);
        assert_eq!(claims.iat, 1_800_000_000);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(decode_id_token_claims("not-a-jwt").is_err());
        assert!(decode_id_token_claims("a.!!!.c").is_err());
    }
}
