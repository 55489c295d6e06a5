//! Pure functions for mapping repository errors to HTTP and envelope codes.

use super::RepositoryError;
use crate::response::ResponseCode;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists`, `ConditionFailed`, cancelled transactions with a failed
///   condition -> 400 (Bad Request)
/// - everything else -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use localeyes_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "Post",
///     id: "abc".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } | RepositoryError::ConditionFailed(_) => 400,
        RepositoryError::TransactionCancelled { failed } if !failed.is_empty() => 400,
        RepositoryError::TransactionCancelled { .. }
        | RepositoryError::ConnectionFailed(_)
        | RepositoryError::QueryFailed(_)
        | RepositoryError::Serialization(_)
        | RepositoryError::InvalidData(_) => 500,
    }
}

/// Maps a [`RepositoryError`] to the envelope code.
pub fn repository_error_to_response_code(error: &RepositoryError) -> ResponseCode {
    if repository_error_to_status_code(error) == 500 {
        ResponseCode::DbError
    } else {
        ResponseCode::InvalidRequest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let error = RepositoryError::NotFound {
            entity_type: "Question",
            id: "q-123".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 404);
        assert_eq!(
            repository_error_to_response_code(&error),
            ResponseCode::InvalidRequest
        );
    }

    #[test]
    fn test_already_exists_maps_to_400() {
        let error = RepositoryError::AlreadyExists {
            entity_type: "User",
            id: "bob".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 400);
    }

    #[test]
    fn test_condition_failures_map_to_400() {
        let error = RepositoryError::ConditionFailed("k".to_string());
        assert_eq!(repository_error_to_status_code(&error), 400);

        let error = RepositoryError::TransactionCancelled { failed: vec![0] };
        assert_eq!(repository_error_to_status_code(&error), 400);
    }

    #[test]
    fn test_cancelled_without_condition_failure_maps_to_500() {
        let error = RepositoryError::TransactionCancelled { failed: vec![] };
        assert_eq!(repository_error_to_status_code(&error), 500);
        assert_eq!(
            repository_error_to_response_code(&error),
            ResponseCode::DbError
        );
    }

    #[test]
    fn test_store_failures_map_to_500() {
        for error in [
            RepositoryError::ConnectionFailed("timeout".to_string()),
            RepositoryError::QueryFailed("throttled".to_string()),
            RepositoryError::Serialization("bad json".to_string()),
            RepositoryError::InvalidData("missing sk".to_string()),
        ] {
            assert_eq!(repository_error_to_status_code(&error), 500);
            assert_eq!(
                repository_error_to_response_code(&error),
                ResponseCode::DbError
            );
        }
    }
}
