//! Account handlers: signup, login, password recovery and the caller's
//! own profile.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use localeyes_auth::AuthUser;
use localeyes_core::social::{
    LoginRequest, OtpRequest, PostView, ResetPasswordRequest, SignupRequest,
    UpdateProfileRequest, UserProfile,
};

use super::{created, done, ok, ApiResult};
use crate::state::AppState;

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let user = state.accounts.signup(request).await?;
    Ok(created("User created successfully", UserProfile::from(user)))
}

/// POST /login - answers with a bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let token = state.accounts.login(request).await?;
    Ok(ok("User logged in successfully", token))
}

/// POST /otp - mails a password reset code.
pub async fn send_otp(
    State(state): State<AppState>,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    state.accounts.send_otp(request).await?;
    Ok(done("Success"))
}

/// POST /password/reset
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    state.accounts.reset_password(request).await?;
    Ok(done("Success"))
}

/// GET /user/profile
pub async fn profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.accounts.profile(user.user_id()).await?;
    Ok(ok("User viewed successfully", UserProfile::from(profile)))
}

/// POST /user/deactivate
pub async fn deactivate(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    state.accounts.deactivate(user.user_id()).await?;
    Ok(done("User Deactivated successfully"))
}

/// GET /user/notifications - recent posts of other users.
pub async fn notifications(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let notifications = state.accounts.notifications(user.user_id()).await?;
    let posts: Vec<PostView> = notifications.into_iter().map(PostView::from).collect();
    Ok(ok("Success", posts))
}

/// GET /user/{user_id}
pub async fn get_user(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = state.accounts.get_user(&user_id).await?;
    Ok(ok("Success", UserProfile::from(user)))
}

/// PUT /user/{user_id} - only the owner may update a profile.
pub async fn update_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let updated = state
        .accounts
        .update_profile(user.user_id(), &user_id, request)
        .await?;
    Ok(ok("Success", UserProfile::from(updated)))
}
