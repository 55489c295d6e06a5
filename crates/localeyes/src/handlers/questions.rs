use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use localeyes_auth::AuthUser;
use localeyes_core::social::{CreateQuestionRequest, QuestionView};

use super::{created, done, ok, ApiResult};
use crate::state::AppState;

/// POST /post/{post_id}/question
pub async fn create_question(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let question = state.posts.ask(user.user_id(), &post_id, request).await?;
    Ok(created("Question Created", QuestionView::from(question)))
}

/// GET /post/{post_id}/questions/all
pub async fn list_questions(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let questions: Vec<QuestionView> = state
        .posts
        .questions(&post_id)
        .await?
        .into_iter()
        .map(QuestionView::from)
        .collect();
    Ok(ok("Successfully retrieved all questions", questions))
}

/// DELETE /post/{post_id}/question/{ques_id}
pub async fn delete_question(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, question_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    state
        .posts
        .delete_question(user.user_id(), &post_id, &question_id)
        .await?;
    Ok(done("Question Deleted"))
}
