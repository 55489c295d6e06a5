use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use localeyes_auth::AuthUser;
use localeyes_core::social::{AnswerView, CreateAnswerRequest};

use super::{created, done, ok, ApiResult};
use crate::state::AppState;

/// POST /question/{ques_id}/answer
pub async fn add_answer(
    user: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    payload: Result<Json<CreateAnswerRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let answer = state
        .posts
        .answer(user.user_id(), &question_id, request)
        .await?;
    Ok(created("Answer Added", AnswerView::from(answer)))
}

/// GET /question/{ques_id}/answers/all
pub async fn list_answers(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let answers: Vec<AnswerView> = state
        .posts
        .answers(&question_id)
        .await?
        .into_iter()
        .map(AnswerView::from)
        .collect();
    Ok(ok("Successfully retrieved all answers", answers))
}

/// DELETE /question/{ques_id}/answer/{answer_id}
pub async fn delete_answer(
    user: AuthUser,
    State(state): State<AppState>,
    Path((question_id, answer_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    state
        .posts
        .delete_answer(user.user_id(), &question_id, &answer_id)
        .await?;
    Ok(done("Answer Deleted"))
}
