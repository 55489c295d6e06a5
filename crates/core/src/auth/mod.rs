mod error;
mod functions;
mod password;
mod types;

pub use error::AuthError;
pub use functions::{calculate_expiry, generate_otp, is_admin, OTP_LENGTH, OTP_TTL, TOKEN_TTL};
pub use password::{hash_password, verify_password};
pub use types::Claims;

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
