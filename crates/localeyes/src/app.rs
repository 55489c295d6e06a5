use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    alerts::publish_alerts,
    handlers::{admin, answers, health::health, posts, questions, users},
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let admin_routes = Router::new()
        .route("/users/all", get(admin::list_users))
        .route("/user/{user_id}", delete(admin::delete_user))
        .route("/user/{user_id}/reactivate", post(admin::reactivate_user))
        .route("/user/{user_id}/post/{post_id}", delete(admin::delete_post))
        .route(
            "/post/{post_id}/user/{user_id}/question/{ques_id}",
            delete(admin::delete_question),
        )
        .route(
            "/question/{ques_id}/user/{user_id}/answer/{answer_id}",
            delete(admin::delete_answer),
        );

    Router::new()
        .route("/health", get(health))
        // Accounts
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/otp", post(users::send_otp))
        .route("/password/reset", post(users::reset_password))
        .route("/user/profile", get(users::profile))
        .route("/user/deactivate", post(users::deactivate))
        .route("/user/notifications", get(users::notifications))
        .route("/user/{user_id}", get(users::get_user).put(users::update_user))
        // Posts
        .route("/user/post", post(posts::create_post))
        .route("/posts/all", get(posts::list_posts))
        .route("/user/posts/all", get(posts::list_own_posts))
        .route(
            "/user/post/{post_id}",
            get(posts::like_status)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/post/{post_id}/like", post(posts::like_post))
        // Questions and answers
        .route("/post/{post_id}/question", post(questions::create_question))
        .route("/post/{post_id}/questions/all", get(questions::list_questions))
        .route(
            "/post/{post_id}/question/{ques_id}",
            delete(questions::delete_question),
        )
        .route("/question/{ques_id}/answer", post(answers::add_answer))
        .route("/question/{ques_id}/answers/all", get(answers::list_answers))
        .route(
            "/question/{ques_id}/answer/{answer_id}",
            delete(answers::delete_answer),
        )
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.alerts.clone(),
            publish_alerts,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use localeyes_auth::{AuthConfig, AuthState};
    use localeyes_core::storage;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::alerts::testing::RecordingPublisher;
    use crate::mailer::testing::RecordingMailer;

    fn test_state() -> AppState {
        AppState::in_memory(
            AuthConfig::new("test-secret", "admin"),
            Arc::new(RecordingMailer::default()),
        )
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(body) => {
                request = request.header("Content-Type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn signup_body(username: &str) -> Value {
        json!({
            "username": username,
            "password": "secret@1",
            "city": "Kochi",
            "living_since": {"days": 0, "months": 0, "years": 3},
            "email": format!("{username}@example.com"),
        })
    }

    /// Signs a user up and logs in, returning `(user_id, token)`.
    async fn register(app: &Router, username: &str) -> (String, String) {
        let (status, json) = send(app, "POST", "/signup", None, Some(signup_body(username))).await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = json["data"]["id"].as_str().unwrap().to_string();

        let (status, json) = send(
            app,
            "POST",
            "/login",
            None,
            Some(json!({"username": username, "password": "secret@1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (user_id, json["data"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_app(test_state());
        let (status, json) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["code"], 200);
    }

    #[tokio::test]
    async fn test_signup_login_and_profile() {
        let app = create_app(test_state());
        let (user_id, token) = register(&app, "meera").await;

        let (status, json) = send(&app, "GET", "/user/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "User viewed successfully");
        assert_eq!(json["data"]["id"], user_id.as_str());
        assert_eq!(json["data"]["tag"], "resident");
        assert!(json["data"].get("password").is_none());

        let (status, json) = send(&app, "POST", "/signup", None, Some(signup_body("meera"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 4400);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let app = create_app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/signup")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 4400);
        assert_eq!(json["message"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = create_app(test_state());
        let (status, json) = send(&app, "GET", "/posts/all", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], 3300);

        let (status, _) = send(&app, "GET", "/user/profile", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let app = create_app(test_state());
        let (_, token) = register(&app, "ravi").await;

        let (status, _) = send(&app, "POST", "/user/deactivate", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"username": "ravi", "password": "secret@1"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "inactive user");
    }

    #[tokio::test]
    async fn test_cannot_update_another_profile() {
        let app = create_app(test_state());
        let (alice_id, _) = register(&app, "alice").await;
        let (_, bob_token) = register(&app, "bob").await;

        let (status, json) = send(
            &app,
            "PUT",
            &format!("/user/{alice_id}"),
            Some(&bob_token),
            Some(json!({
                "password": "h4ck@ed",
                "city": "Nowhere",
                "living_since": {"years": 1},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], 3300);
    }

    #[tokio::test]
    async fn test_post_lifecycle() {
        let app = create_app(test_state());
        let (author_id, author) = register(&app, "author").await;
        let (_, fan) = register(&app, "fan").await;

        let (status, json) = send(
            &app,
            "POST",
            "/user/post",
            Some(&author),
            Some(json!({"title": "Dosa corner", "content": "Crispy", "type": "FOOD"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let post = json["data"].clone();
        let post_id = post["post_id"].as_str().unwrap().to_string();

        let (status, json) = send(&app, "GET", "/posts/all?filter=FOOD", Some(&fan), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        let (_, json) = send(&app, "GET", "/user/notifications", Some(&fan), None).await;
        assert_eq!(json["data"][0]["post_id"], post_id.as_str());

        let like = json!({
            "user_id": author_id,
            "type": "FOOD",
            "created_at": post["created_at"],
        });
        let uri = format!("/post/{post_id}/like");
        let (_, json) = send(&app, "POST", &uri, Some(&fan), Some(like.clone())).await;
        assert_eq!(json["data"], "LIKED");
        let (_, json) = send(&app, "GET", &format!("/user/post/{post_id}"), Some(&fan), None).await;
        assert_eq!(json["data"], "LIKED");
        let (_, json) = send(&app, "POST", &uri, Some(&fan), Some(like)).await;
        assert_eq!(json["data"], "NOT_LIKED");

        let locator = json!({"type": "FOOD", "created_at": post["created_at"]});
        let uri = format!("/user/post/{post_id}");
        let (status, json) = send(&app, "DELETE", &uri, Some(&fan), Some(locator.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "no post of yours exist with this id");

        let (status, _) = send(&app, "DELETE", &uri, Some(&author), Some(locator)).await;
        assert_eq!(status, StatusCode::OK);
        let (_, json) = send(&app, "GET", "/user/posts/all", Some(&author), None).await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_questions_and_answers() {
        let app = create_app(test_state());
        let (_, token) = register(&app, "asker").await;

        let (status, json) = send(
            &app,
            "POST",
            "/post/p1/question",
            Some(&token),
            Some(json!({"text": "Is it crowded?"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let question_id = json["data"]["question_id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/question/{question_id}/answer"),
            Some(&token),
            Some(json!({"answer": "Only on weekends"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/question/{question_id}/answers/all");
        let (_, json) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(json["data"][0]["answer"], "Only on weekends");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/post/p1/question/{question_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = send(&app, "GET", "/post/p1/questions/all", Some(&token), None).await;
        assert!(json["data"].as_array().unwrap().is_empty());
        let (_, json) = send(&app, "GET", &uri, Some(&token), None).await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin() {
        let state = test_state();
        let admin_token = state.auth.issue_token("admin", "admin-id").unwrap();
        let app = create_app(state);
        let (user_id, token) = register(&app, "nisha").await;

        let uri = format!("/admin/user/{user_id}");
        let (status, json) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Not an admin");

        let (status, json) = send(&app, "GET", "/admin/users/all", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["username"], "nisha");

        let (status, _) = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_configured_admin_name_cannot_sign_up() {
        let state = AppState::in_memory(
            AuthConfig::new("test-secret", "root"),
            Arc::new(RecordingMailer::default()),
        );
        let admin_token = state.auth.issue_token("root", "root-id").unwrap();
        let app = create_app(state);

        let (status, json) = send(&app, "POST", "/signup", None, Some(signup_body("root"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "username is reserved");

        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"username": "root", "password": "secret@1"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        register(&app, "nisha").await;
        let (_, json) = send(&app, "GET", "/admin/users/all", Some(&admin_token), None).await;
        let names: Vec<&str> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|u| u["username"].as_str())
            .collect();
        assert_eq!(names, vec!["nisha"]);
    }

    /// Store whose every call fails as if the table were unreachable.
    struct OfflineStore;

    fn offline<T>() -> storage::Result<T> {
        Err(storage::RepositoryError::ConnectionFailed(
            "dispatch failure: table offline".to_string(),
        ))
    }

    #[async_trait::async_trait]
    impl storage::TableStore for OfflineStore {
        async fn get(&self, _: &storage::ItemKey) -> storage::Result<Option<storage::Item>> {
            offline()
        }

        async fn put(
            &self,
            _: storage::Item,
            _: Option<storage::Condition>,
        ) -> storage::Result<()> {
            offline()
        }

        async fn delete(
            &self,
            _: &storage::ItemKey,
            _: Option<storage::Condition>,
        ) -> storage::Result<Option<storage::Item>> {
            offline()
        }

        async fn update(
            &self,
            _: &storage::ItemKey,
            _: Vec<storage::UpdateAction>,
            _: Option<storage::Condition>,
        ) -> storage::Result<storage::Item> {
            offline()
        }

        async fn query(&self, _: storage::Query) -> storage::Result<storage::QueryPage> {
            offline()
        }

        async fn batch_write(&self, _: Vec<storage::WriteRequest>) -> storage::Result<()> {
            offline()
        }

        async fn transact_write(
            &self,
            _: Vec<storage::TransactWriteItem>,
        ) -> storage::Result<()> {
            offline()
        }
    }

    #[tokio::test]
    async fn test_store_outage_alerts_with_cause() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = create_app(AppState::build(
            Arc::new(OfflineStore),
            AuthState::new(AuthConfig::new("test-secret", "admin")),
            Arc::new(RecordingMailer::default()),
            publisher.clone(),
        ));

        let (status, json) = send(&app, "POST", "/signup", None, Some(signup_body("kiran"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], 5500);
        assert_eq!(json["message"], "Internal server error");

        let mut alerts = Vec::new();
        for _ in 0..50 {
            alerts = publisher.alerts.lock().unwrap().clone();
            if !alerts.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].error_code, "5500");
        assert_eq!(alerts[0].status_code, "500");
        assert!(
            alerts[0].message.contains("table offline"),
            "{}",
            alerts[0].message
        );
    }

    #[tokio::test]
    async fn test_malformed_query_is_rejected() {
        let state = test_state();
        let admin_token = state.auth.issue_token("admin", "admin-id").unwrap();
        let app = create_app(state);
        let (_, token) = register(&app, "meera").await;

        let (status, json) = send(
            &app,
            "GET",
            "/admin/users/all?limit=1&limit=2",
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 4400);
        assert_eq!(json["message"], "Invalid query string");

        let uri = "/posts/all?filter=FOOD&filter=STAY";
        let (status, json) = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 4400);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = create_app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/posts/all")
                    .header("Origin", "https://localeyes.app")
                    .header("Access-Control-Request-Method", "GET")
                    .header("Access-Control-Request-Headers", "authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
