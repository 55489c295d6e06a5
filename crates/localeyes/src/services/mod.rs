//! Business operations behind the HTTP handlers.
//!
//! Services validate requests, apply the rules from
//! `localeyes_core::social` and translate repository failures into
//! [`ServiceError`]s the handlers can render.

mod accounts;
mod admin;
mod error;
mod posts;

pub use accounts::AccountService;
pub use admin::AdminService;
pub use error::{Result, ServiceError};
pub use posts::PostService;
