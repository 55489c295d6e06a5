//! Business rules for users, posts and pagination.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use uuid::Uuid;

use super::{LivingSince, Tag, ValidationError};

/// Usernames nobody can register.
pub const RESERVED_USERNAMES: [&str; 2] = ["admin", "Admin"];
/// Support mailbox of the service; never registrable.
pub const RESERVED_EMAIL: &str = "localeyes22@gmail.com";
/// Page size used when listing users without an explicit limit.
pub const DEFAULT_USER_PAGE_SIZE: usize = 10;

const PASSWORD_SPECIAL_CHARS: &[char] = &['@', '#', '$', '%', '^', '*'];
const SHORT_ID_LEN: usize = 8;

/// Converts a living-since duration into years, rounded to two decimals.
pub fn dwelling_years(living_since: &LivingSince) -> f64 {
    let years = living_since.days / 365.0 + living_since.months / 12.0 + living_since.years;
    round_to_cents(years)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// More than one year in the city makes a resident.
pub fn derive_tag(years: f64) -> Tag {
    if years > 1.0 {
        Tag::Resident
    } else {
        Tag::Newbie
    }
}

/// Validates a living-since duration.
pub fn validate_living_since(living_since: &LivingSince) -> Result<(), ValidationError> {
    let parts = [living_since.days, living_since.months, living_since.years];
    if parts.iter().all(|p| p.is_finite() && *p >= 0.0) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLivingSince)
    }
}

/// Password policy: longer than five characters, at least one of
/// `@#$%^*` and at least one ASCII digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.len() > 5;
    let has_special = password.contains(PASSWORD_SPECIAL_CHARS);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_special && has_digit {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

/// Minimal syntactic email check: `local@domain.tld` without whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Rejects blank required fields.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

pub fn is_reserved_username(username: &str) -> bool {
    RESERVED_USERNAMES.contains(&username)
}

pub fn is_reserved_email(email: &str) -> bool {
    email == RESERVED_EMAIL
}

/// Generates a user id.
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates the short random id used for posts, questions and answers.
///
/// Eight characters of the base64 encoding of a random UUID, with `/`
/// replaced so the id is safe in a URL path.
pub fn generate_short_id() -> String {
    let encoded = STANDARD_NO_PAD.encode(Uuid::new_v4().as_bytes());
    encoded[..SHORT_ID_LEN].replace('/', "A")
}

/// Returns the `[offset, offset + limit)` window of an already ordered
/// result set. Without a limit everything from `offset` on is returned.
pub fn page_window<T>(items: Vec<T>, offset: usize, limit: Option<usize>) -> Vec<T> {
    let end = match limit {
        Some(limit) => offset.saturating_add(limit),
        None => usize::MAX,
    };
    items
        .into_iter()
        .skip(offset)
        .take(end.saturating_sub(offset))
        .collect()
}
