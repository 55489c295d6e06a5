use axum::Json;
use localeyes_core::response::Envelope;

/// GET /health - Liveness check, answers as soon as the server accepts
/// connections.
#[axum::debug_handler]
pub async fn health() -> Json<Envelope<()>> {
    Json(Envelope::ok("OK"))
}
