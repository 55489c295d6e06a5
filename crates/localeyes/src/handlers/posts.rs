use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use localeyes_auth::AuthUser;
use localeyes_core::social::{
    CreatePostRequest, DeletePostRequest, LikePostRequest, ListPostsQuery, Post, PostView,
    UpdatePostRequest,
};

use super::{created, done, ok, ApiResult};
use crate::state::AppState;

fn views(posts: Vec<Post>) -> Vec<PostView> {
    posts.into_iter().map(PostView::from).collect()
}

/// POST /user/post
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let post = state.posts.create(user.user_id(), request).await?;
    Ok(created("Post created successfully", PostView::from(post)))
}

/// GET /posts/all?filter=&search=&limit=&offset=
pub async fn list_posts(
    _user: AuthUser,
    State(state): State<AppState>,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let posts = state.posts.list(&query).await?;
    Ok(ok("Success", views(posts)))
}

/// GET /user/posts/all
pub async fn list_own_posts(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let posts = state.posts.list_own(user.user_id()).await?;
    Ok(ok("Success", views(posts)))
}

/// PUT /user/post/{post_id}
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    state
        .posts
        .update(user.user_id(), &post_id, request)
        .await?;
    Ok(done("Post updated successfully"))
}

/// DELETE /user/post/{post_id}
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    payload: Result<Json<DeletePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    state
        .posts
        .delete(user.user_id(), &post_id, request)
        .await?;
    Ok(done("Post deleted successfully"))
}

/// POST /post/{post_id}/like - toggles the caller's like.
pub async fn like_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    payload: Result<Json<LikePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let status = state
        .posts
        .toggle_like(user.user_id(), &post_id, request)
        .await?;
    Ok(ok("Post liked successfully", status))
}

/// GET /user/post/{post_id}
pub async fn like_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let status = state.posts.like_status(user.user_id(), &post_id).await?;
    Ok(ok("Successfully viewed the like status", status))
}
