use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use localeyes_core::response::{AlertContext, Envelope, ResponseCode};
use thiserror::Error;

/// Auth errors for the localeyes_auth crate.
///
/// This wraps the core `AuthError` and adds the admin check, which needs
/// configuration the core does not have.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (missing or invalid token, hashing)
    #[error(transparent)]
    Core(#[from] localeyes_core::auth::AuthError),

    /// Token is valid but does not belong to the administrator
    #[error("not an admin")]
    NotAdmin,
}

impl AuthError {
    /// HTTP status and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        use localeyes_core::auth::AuthError as CoreError;

        match self {
            AuthError::Core(CoreError::MissingToken) => {
                (StatusCode::UNAUTHORIZED, "Missing authentication token")
            }
            AuthError::Core(CoreError::InvalidToken(_) | CoreError::TokenExpired) => {
                (StatusCode::UNAUTHORIZED, "Invalid token")
            }
            AuthError::Core(CoreError::NotAdmin) | AuthError::NotAdmin => {
                (StatusCode::UNAUTHORIZED, "Not an admin")
            }
            AuthError::Core(CoreError::Encoding(_) | CoreError::PasswordHash(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let code = if status.is_server_error() {
            tracing::error!(error = %self, "Auth error");
            ResponseCode::DbError
        } else {
            tracing::warn!(error = %self, "Request rejected");
            ResponseCode::AuthError
        };

        let alert = AlertContext::for_code(code, self.to_string());
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
    use http_body_util::BodyExt;
    use localeyes_core::auth::AuthError as CoreError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_token_renders_auth_envelope() {
        let response = AuthError::Core(CoreError::MissingToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["code"], 3300);
        assert_eq!(json["message"], "Missing authentication token");
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_invalid() {
        let response = AuthError::Core(CoreError::TokenExpired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid token");
    }

    #[tokio::test]
    async fn not_admin_is_unauthorized() {
        let response = AuthError::NotAdmin.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.extensions().get::<AlertContext>().is_none());
        assert_eq!(body_json(response).await["message"], "Not an admin");
    }

    #[tokio::test]
    async fn signing_failure_is_alerted() {
        let response =
            AuthError::Core(CoreError::Encoding("bad key".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<AlertContext>().is_some());
        assert_eq!(body_json(response).await["code"], 5500);
    }
}
