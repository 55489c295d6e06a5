use thiserror::Error;

use localeyes_core::auth::AuthError;
use localeyes_core::social::ValidationError;
use localeyes_core::storage::RepositoryError;

use crate::mailer::MailError;

/// Errors returned by the service layer.
///
/// Messages are shown to clients as-is.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("email already in use")]
    EmailTaken,
    #[error("username already in use")]
    UsernameTaken,
    #[error("username is reserved")]
    ReservedUsername,
    #[error("email is reserved")]
    ReservedEmail,
    #[error("invalid account credentials")]
    InvalidCredentials,
    #[error("inactive user")]
    Inactive,
    #[error("no user exist")]
    UserNotFound,
    #[error("No User")]
    UnknownEmail,
    #[error("wrong otp")]
    WrongOtp,
    #[error("cannot update another user's profile")]
    Forbidden,
    #[error("no post exist with this id")]
    PostNotFound,
    #[error("no post of yours exist with this id")]
    NotYourPost,
    #[error("like status changed by another request, try again")]
    LikeChanged,
    #[error("no question exist with this id")]
    QuestionNotFound,
    #[error("no question of yours exist with this id")]
    NotYourQuestion,
    #[error("no answer exist with this id")]
    AnswerNotFound,
    #[error("no answer of yours exist with this id")]
    NotYourAnswer,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Token(#[from] localeyes_auth::AuthError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl ServiceError {
    /// Maps a repository failure of a post operation: absence and ownership
    /// failures become their own variants, the rest is passed through.
    pub(crate) fn post(error: RepositoryError) -> Self {
        Self::entity(error, Self::PostNotFound, Self::NotYourPost)
    }

    pub(crate) fn question(error: RepositoryError) -> Self {
        Self::entity(error, Self::QuestionNotFound, Self::NotYourQuestion)
    }

    pub(crate) fn answer(error: RepositoryError) -> Self {
        Self::entity(error, Self::AnswerNotFound, Self::NotYourAnswer)
    }

    pub(crate) fn user(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { .. } => Self::UserNotFound,
            other => Self::Repository(other),
        }
    }

    fn entity(error: RepositoryError, not_found: Self, not_owner: Self) -> Self {
        match error {
            RepositoryError::NotFound { .. } => not_found,
            RepositoryError::ConditionFailed(_) => not_owner,
            other => Self::Repository(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_error_mapping() {
        let not_found = RepositoryError::NotFound {
            entity_type: "Post",
            id: "p1".to_string(),
        };
        assert!(matches!(ServiceError::post(not_found), ServiceError::PostNotFound));
        assert!(matches!(
            ServiceError::post(RepositoryError::ConditionFailed("k".to_string())),
            ServiceError::NotYourPost
        ));
        assert!(matches!(
            ServiceError::post(RepositoryError::QueryFailed("down".to_string())),
            ServiceError::Repository(_)
        ));
    }

    #[test]
    fn test_messages() {
        assert_eq!(ServiceError::Inactive.to_string(), "inactive user");
        assert_eq!(
            ServiceError::InvalidCredentials.to_string(),
            "invalid account credentials"
        );
        assert_eq!(
            ServiceError::NotYourQuestion.to_string(),
            "no question of yours exist with this id"
        );
    }
}
