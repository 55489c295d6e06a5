//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use localeyes_core::auth::{AuthError as CoreError, Claims};

use crate::{AuthError, AuthState};

/// Extractor for an authenticated caller. Rejects with 401 when the bearer
/// token is missing, malformed, badly signed or expired.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        self.0.user_id()
    }

    pub fn username(&self) -> &str {
        self.0.username()
    }
}

/// Extractor for the administrator. Rejects like [`AuthUser`], and also
/// when the token belongs to anyone else.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(CoreError::MissingToken)?;

    let value = header
        .to_str()
        .map_err(|_| CoreError::InvalidToken("authorization header is not ASCII".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CoreError::MissingToken.into())
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = auth_state.verify_token(token)?;

        Ok(AuthUser(claims))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = auth_state.verify_token(token)?;

        if !auth_state.is_admin(&claims) {
            tracing::warn!(username = %claims.sub, "Non-admin attempted an admin route");
            return Err(AuthError::NotAdmin);
        }

        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthConfig;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> (Router, AuthState) {
        let state = AuthState::new(AuthConfig::new("test-secret", "root"));
        let router = Router::new()
            .route("/me", get(|AuthUser(claims): AuthUser| async move { claims.sub }))
            .route("/admin", get(|AdminUser(claims): AdminUser| async move { claims.sub }))
            .with_state(state.clone());
        (router, state)
    }

    fn request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let (app, _) = app();
        let response = app.oneshot(request("/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_is_accepted() {
        let (app, state) = app();
        let token = state.issue_token("alice", "u1").unwrap();
        let response = app.oneshot(request("/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let (app, state) = app();
        let token = state.issue_token("alice", "u1").unwrap();
        let request = Request::builder()
            .uri("/me")
            .header(AUTHORIZATION, format!("Basic {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_route_requires_admin_username() {
        let (app, state) = app();

        let user_token = state.issue_token("alice", "u1").unwrap();
        let response = app
            .clone()
            .oneshot(request("/admin", Some(&user_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let admin_token = state.issue_token("root", "u0").unwrap();
        let response = app
            .oneshot(request("/admin", Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
