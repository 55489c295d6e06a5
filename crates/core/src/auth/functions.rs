use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::Claims;

/// Lifetime of a bearer token.
pub const TOKEN_TTL: Duration = Duration::hours(1);
/// Lifetime of a password reset code.
pub const OTP_TTL: Duration = Duration::minutes(10);
/// Number of decimal digits in a password reset code.
pub const OTP_LENGTH: usize = 6;

/// Generate a numeric one-time password from the thread-local CSPRNG.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Calculate an expiry instant from creation time and TTL.
pub fn calculate_expiry(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    created_at + ttl
}

/// The admin is the account whose username matches the configured one.
pub fn is_admin(claims: &Claims, admin_username: &str) -> bool {
    !admin_username.is_empty() && claims.sub == admin_username
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_otp_produces_six_digits() {
        for _ in 0..32 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_LENGTH);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn calculate_expiry_adds_ttl_to_created_at() {
        let created = Utc::now();
        assert_eq!(
            calculate_expiry(created, OTP_TTL),
            created + Duration::minutes(10)
        );
        assert_eq!(
            calculate_expiry(created, TOKEN_TTL),
            created + Duration::hours(1)
        );
    }

    #[test]
    fn is_admin_compares_subject() {
        let claims = Claims::new("root", "u1", 0);
        assert!(is_admin(&claims, "root"));
        assert!(!is_admin(&claims, "admin"));
        assert!(!is_admin(&Claims::new("", "u1", 0), ""));
    }
}
