//! Token signing state shared by the extractors and the login handler.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use localeyes_core::auth::{calculate_expiry, is_admin, AuthError as CoreError, Claims};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Shared state for authentication.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
}

impl AuthState {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = Arc::new(EncodingKey::from_secret(config.secret.as_bytes()));
        let decoding_key = Arc::new(DecodingKey::from_secret(config.secret.as_bytes()));
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues a signed HS256 token for a user.
    pub fn issue_token(&self, username: &str, user_id: &str) -> Result<String, AuthError> {
        let exp = calculate_expiry(Utc::now(), self.config.token_ttl).timestamp();
        let claims = Claims::new(username, user_id, exp);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::from(CoreError::Encoding(e.to_string())))
    }

    /// Verifies signature and expiry, returning the typed claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::from(CoreError::TokenExpired),
                _ => AuthError::from(CoreError::InvalidToken(e.to_string())),
            })
    }

    /// Whether the claims belong to the configured administrator.
    pub fn is_admin(&self, claims: &Claims) -> bool {
        is_admin(claims, &self.config.admin_username)
    }

    /// Whether `username` names the configured administrator account.
    pub fn is_admin_username(&self, username: &str) -> bool {
        username == self.config.admin_username
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn state() -> AuthState {
        AuthState::new(AuthConfig::new("test-secret", "root"))
    }

    #[test]
    fn issued_token_verifies() {
        let state = state();
        let token = state.issue_token("alice", "u1").unwrap();
        let claims = state.verify_token(&token).unwrap();

        assert_eq!(claims.username(), "alice");
        assert_eq!(claims.user_id(), "u1");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = AuthState::new(AuthConfig::new("other-secret", "root"));
        let token = other.issue_token("alice", "u1").unwrap();

        assert!(matches!(
            state().verify_token(&token),
            Err(AuthError::Core(CoreError::InvalidToken(_)))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AuthConfig::new("test-secret", "root").with_token_ttl(-Duration::hours(2));
        let expired = AuthState::new(config);
        let token = expired.issue_token("alice", "u1").unwrap();

        assert!(matches!(
            state().verify_token(&token),
            Err(AuthError::Core(CoreError::TokenExpired))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            state().verify_token("not.a.token"),
            Err(AuthError::Core(CoreError::InvalidToken(_)))
        ));
    }

    #[test]
    fn admin_is_the_configured_username() {
        let state = state();
        assert!(state.is_admin(&Claims::new("root", "u0", 0)));
        assert!(!state.is_admin(&Claims::new("alice", "u1", 0)));
        assert!(state.is_admin_username("root"));
        assert!(!state.is_admin_username("admin"));
    }
}
