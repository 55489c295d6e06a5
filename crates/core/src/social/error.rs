use thiserror::Error;

/// Errors raised while validating user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("password must be longer than 5 characters and contain a digit and one of @#$%^*")]
    WeakPassword,
    #[error("invalid post type: {0}")]
    InvalidCategory(String),
    #[error("invalid tag: {0}")]
    InvalidTag(String),
    #[error("living_since values must be finite and not negative")]
    InvalidLivingSince,
}
