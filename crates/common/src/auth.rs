//! Access and refresh token issuance.
//!
//! Viewer identity is carried as a short-lived access JWT plus a
//! long-lived refresh JWT. The refresh token is also persisted on the
//! user record so it can be revoked by overwriting it.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::{AppError, AppResult};

/// JWT claims for both token kinds.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id.
    pub sub: String,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued-at (unix seconds).
    pub iat: i64,
}

/// Signs and verifies access/refresh token pairs.
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    access_ttl_secs: i64,
    refresh_secret: String,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    /// Create a token issuer from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_secret: config.refresh_token_secret.clone(),
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    /// Issue a short-lived access token for a user.
    pub fn issue_access_token(&self, user_id: &str) -> AppResult<String> {
        Self::sign(user_id, &self.access_secret, self.access_ttl_secs)
    }

    /// Issue a long-lived refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: &str) -> AppResult<String> {
        Self::sign(user_id, &self.refresh_secret, self.refresh_ttl_secs)
    }

    /// Verify an access token and return the user id it names.
    pub fn verify_access_token(&self, token: &str) -> AppResult<String> {
        Self::verify(token, &self.access_secret)
    }

    /// Verify a refresh token and return the user id it names.
    pub fn verify_refresh_token(&self, token: &str) -> AppResult<String> {
        Self::verify(token, &self.refresh_secret)
    }

    fn sign(user_id: &str, secret: &str, ttl_secs: i64) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            exp: now + ttl_secs,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    fn verify(token: &str, secret: &str) -> AppResult<String> {
        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_issuer() -> TokenIssuer {
        TokenIssuer::new(&AuthConfig {
            access_token_secret: "access-secret".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_secret: "refresh-secret".to_string(),
            refresh_token_ttl_secs: 2_592_000,
        })
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = test_issuer();
        let token = issuer.issue_access_token("user1").unwrap();
        let sub = issuer.verify_access_token(&token).unwrap();
        assert_eq!(sub, "user1");
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let issuer = test_issuer();
        let token = issuer.issue_refresh_token("user1").unwrap();
        let sub = issuer.verify_refresh_token(&token).unwrap();
        assert_eq!(sub, "user1");
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let issuer = test_issuer();
        let refresh = issuer.issue_refresh_token("user1").unwrap();

        match issuer.verify_access_token(&refresh) {
            Err(AppError::Unauthorized) => {}
            _ => panic!("Expected Unauthorized"),
        }
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = test_issuer();
        assert!(issuer.verify_access_token("not-a-jwt").is_err());
    }
}
