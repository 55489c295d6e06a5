use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing authentication token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("not an admin")]
    NotAdmin,

    #[error("failed to encode token: {0}")]
    Encoding(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}
