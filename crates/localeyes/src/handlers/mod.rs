//! HTTP handlers.
//!
//! Every handler answers with the `{message, code, data}` envelope. Bodies
//! are taken as `Result<Json<T>, JsonRejection>` so malformed JSON is
//! rendered as an envelope too.

pub mod admin;
pub mod answers;
pub mod error;
pub mod health;
pub mod posts;
pub mod questions;
pub mod users;

use axum::{http::StatusCode, Json};
use localeyes_core::response::Envelope;

pub use error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// 200 response carrying `data`.
pub(crate) fn ok<T>(message: &str, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::success(message, data)))
}

/// 201 response carrying `data`.
pub(crate) fn created<T>(message: &str, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::success(message, data)))
}

/// 200 response without a payload.
pub(crate) fn done(message: &str) -> (StatusCode, Json<Envelope<()>>) {
    (StatusCode::OK, Json(Envelope::ok(message)))
}
