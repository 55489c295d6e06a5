//! Bearer token authentication for localeyes.
//!
//! This crate provides:
//! - HS256 token issuance and verification
//! - Axum extractors for authenticated users and the administrator

mod config;
mod error;
mod extractors;
mod state;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{AdminUser, AuthUser};
pub use state::AuthState;
