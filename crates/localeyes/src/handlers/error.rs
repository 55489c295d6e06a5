use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use localeyes_core::auth::AuthError as CoreAuthError;
use localeyes_core::response::{AlertContext, Envelope, ResponseCode};
use localeyes_core::storage::{
    repository_error_to_response_code, repository_error_to_status_code,
};

use crate::services::ServiceError;

/// Error returned by handlers, rendered as the response envelope.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    InvalidJson(JsonRejection),
    InvalidQuery(QueryRejection),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::InvalidJson(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        Self::InvalidQuery(err)
    }
}

const INTERNAL: (StatusCode, ResponseCode) =
    (StatusCode::INTERNAL_SERVER_ERROR, ResponseCode::DbError);
const BAD_REQUEST: (StatusCode, ResponseCode) =
    (StatusCode::BAD_REQUEST, ResponseCode::InvalidRequest);
const NOT_FOUND: (StatusCode, ResponseCode) = (StatusCode::NOT_FOUND, ResponseCode::InvalidRequest);
const UNAUTHORIZED: (StatusCode, ResponseCode) =
    (StatusCode::UNAUTHORIZED, ResponseCode::AuthError);

impl ApiError {
    /// HTTP status, envelope code and client-facing message.
    fn parts(&self) -> (StatusCode, ResponseCode, String) {
        let err = match self {
            ApiError::InvalidJson(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    ResponseCode::InvalidRequest,
                    "Invalid JSON body".to_string(),
                )
            }
            ApiError::InvalidQuery(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    ResponseCode::InvalidRequest,
                    "Invalid query string".to_string(),
                )
            }
            ApiError::Service(err) => err,
        };

        let (status, code) = match err {
            ServiceError::Validation(_)
            | ServiceError::EmailTaken
            | ServiceError::UsernameTaken
            | ServiceError::ReservedUsername
            | ServiceError::ReservedEmail
            | ServiceError::WrongOtp
            | ServiceError::NotYourPost
            | ServiceError::NotYourQuestion
            | ServiceError::NotYourAnswer => BAD_REQUEST,
            ServiceError::UserNotFound
            | ServiceError::UnknownEmail
            | ServiceError::PostNotFound
            | ServiceError::QuestionNotFound
            | ServiceError::AnswerNotFound => NOT_FOUND,
            ServiceError::InvalidCredentials | ServiceError::Inactive => UNAUTHORIZED,
            ServiceError::Forbidden => (StatusCode::FORBIDDEN, ResponseCode::AuthError),
            ServiceError::LikeChanged => (StatusCode::CONFLICT, ResponseCode::InvalidRequest),
            ServiceError::Repository(e) => (
                StatusCode::from_u16(repository_error_to_status_code(e))
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                repository_error_to_response_code(e),
            ),
            ServiceError::Auth(CoreAuthError::Encoding(_) | CoreAuthError::PasswordHash(_)) => {
                INTERNAL
            }
            ServiceError::Auth(_) => UNAUTHORIZED,
            ServiceError::Token(e) => {
                let (status, _) = e.status_and_message();
                if status.is_server_error() {
                    INTERNAL
                } else {
                    (status, ResponseCode::AuthError)
                }
            }
            ServiceError::Mail(_) => INTERNAL,
        };

        let message = match err {
            ServiceError::Validation(e) => format!("Invalid Input: {e}"),
            ServiceError::Token(e) => e.status_and_message().1.to_string(),
            _ if status.is_server_error() => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, code, message)
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Service(err) => err.to_string(),
            ApiError::InvalidJson(err) => err.body_text(),
            ApiError::InvalidQuery(err) => err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        match &self {
            ApiError::Service(err) if status.is_server_error() => {
                tracing::error!(error = %err, "Request failed");
            }
            ApiError::Service(err) => {
                tracing::warn!(status = %status, error = %err, "Request rejected")
            }
            ApiError::InvalidJson(err) => tracing::warn!(error = %err, "Invalid JSON body"),
            ApiError::InvalidQuery(err) => tracing::warn!(error = %err, "Invalid query string"),
        }

        // Alerts carry the underlying error; the client only sees `message`.
        let alert = AlertContext::for_code(code, self.detail());
        let mut response = (status, Json(Envelope::error(code, message))).into_response();
        if let Some(alert) = alert {
            response.extensions_mut().insert(alert);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;
    use http_body_util::BodyExt;
    use localeyes_core::social::ValidationError;
    use localeyes_core::storage::RepositoryError;

    async fn render_api(err: ApiError) -> (StatusCode, serde_json::Value, Option<AlertContext>) {
        let response = err.into_response();
        let status = response.status();
        let alert = response.extensions().get::<AlertContext>().cloned();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap(), alert)
    }

    async fn render(err: ServiceError) -> (StatusCode, serde_json::Value, bool) {
        let (status, json, alert) = render_api(err.into()).await;
        (status, json, alert.is_some())
    }

    #[tokio::test]
    async fn test_client_errors() {
        let (status, json, alerted) =
            render(ValidationError::MissingField("title").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 4400);
        assert_eq!(
            json["message"],
            "Invalid Input: required field 'title' is missing"
        );
        assert!(!alerted);

        let (status, json, _) = render(ServiceError::PostNotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "no post exist with this id");

        let (status, _, _) = render(ServiceError::NotYourPost).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json, alerted) = render(ServiceError::LikeChanged).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], 4400);
        assert_eq!(
            json["message"],
            "like status changed by another request, try again"
        );
        assert!(!alerted);
    }

    #[tokio::test]
    async fn test_auth_errors() {
        let (status, json, _) = render(ServiceError::Inactive).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], 3300);
        assert_eq!(json["message"], "inactive user");

        let (status, json, _) = render(ServiceError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], 3300);
    }

    #[tokio::test]
    async fn test_store_failures_are_alerted() {
        let (status, json, alerted) =
            render(RepositoryError::ConnectionFailed("timeout".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], 5500);
        assert_eq!(json["message"], "Internal server error");
        assert!(json["data"].is_null());
        assert!(alerted);
    }

    #[tokio::test]
    async fn test_alert_carries_underlying_error() {
        let (_, json, alert) = render_api(
            ServiceError::from(RepositoryError::ConnectionFailed("timeout".to_string())).into(),
        )
        .await;
        let alert = alert.unwrap();

        assert_eq!(json["message"], "Internal server error");
        assert_eq!(alert.code, ResponseCode::DbError);
        assert_ne!(alert.message, "Internal server error");
        assert!(alert.message.contains("timeout"), "{}", alert.message);
    }

    #[derive(Debug, serde::Deserialize)]
    struct Paging {
        #[allow(dead_code)]
        limit: u32,
    }

    #[tokio::test]
    async fn test_query_rejection_uses_envelope() {
        let uri: Uri = "/posts?limit=lots".parse().unwrap();
        let rejection = Query::<Paging>::try_from_uri(&uri).unwrap_err();

        let (status, json, alert) = render_api(rejection.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 4400);
        assert_eq!(json["message"], "Invalid query string");
        assert!(alert.is_none());
    }

    #[tokio::test]
    async fn test_repository_not_found_passes_through() {
        let (status, json, alerted) = render(
            RepositoryError::NotFound {
                entity_type: "Question",
                id: "q1".to_string(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], 4400);
        assert!(!alerted);
    }
}
