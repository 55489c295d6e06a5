//! Moderation handlers under `/admin`. Every route requires the
//! administrator's token.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use localeyes_auth::AdminUser;
use localeyes_core::social::{DeletePostRequest, ListUsersQuery, UserProfile};

use super::{done, ok, ApiResult};
use crate::state::AppState;

/// GET /admin/users/all?limit=&offset=&search=
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let users: Vec<UserProfile> = state
        .admin
        .list_users(&query)
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();
    Ok(ok("Successfully got all users", users))
}

/// DELETE /admin/user/{user_id}
pub async fn delete_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.admin.delete_user(&user_id).await?;
    Ok(done("Successfully deleted user"))
}

/// POST /admin/user/{user_id}/reactivate
pub async fn reactivate_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.admin.reactivate_user(&user_id).await?;
    Ok(done("Successfully re-activated user"))
}

/// DELETE /admin/user/{user_id}/post/{post_id}
pub async fn delete_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path((user_id, post_id)): Path<(String, String)>,
    payload: Result<Json<DeletePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    state.admin.delete_post(&user_id, &post_id, request).await?;
    Ok(done("Successfully deleted post"))
}

/// DELETE /admin/post/{post_id}/user/{user_id}/question/{ques_id}
pub async fn delete_question(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path((post_id, user_id, question_id)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    state
        .admin
        .delete_question(&post_id, &question_id, &user_id)
        .await?;
    Ok(done("Successfully deleted question"))
}

/// DELETE /admin/question/{ques_id}/user/{user_id}/answer/{answer_id}
pub async fn delete_answer(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path((question_id, user_id, answer_id)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    state
        .admin
        .delete_answer(&question_id, &answer_id, &user_id)
        .await?;
    Ok(done("Successfully deleted answer"))
}
