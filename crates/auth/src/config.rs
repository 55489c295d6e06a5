use chrono::Duration;
use localeyes_core::auth::TOKEN_TTL;

/// Token signing configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens.
    pub secret: String,
    /// Username whose tokens grant access to the admin routes.
    pub admin_username: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, admin_username: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            admin_username: admin_username.into(),
            token_ttl: TOKEN_TTL,
        }
    }

    /// Override the token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("admin_username", &self.admin_username)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}
