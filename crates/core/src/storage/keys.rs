//! Key generation functions.
//!
//! Pure functions for generating partition and sort keys following the single-table design.
//! Each logical entity is stored as one or more "views", every view with its own key.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::social::PostCategory;

use super::types::ItemKey;

// ============================================================================
// Key prefixes
// ============================================================================

pub const USER_PREFIX: &str = "user:";
pub const EMAIL_PREFIX: &str = "email:";
pub const USERNAME_PREFIX: &str = "username:";
pub const POST_PREFIX: &str = "post:";
pub const QUESTION_PREFIX: &str = "question:";
pub const REPLY_PREFIX: &str = "reply:";
pub const LIKE_PREFIX: &str = "like:";
pub const OTP_PREFIX: &str = "otp:email:";

pub const USERS_PARTITION: &str = "users";
pub const POSTS_PARTITION: &str = "posts";
pub const NOTIFICATIONS_PARTITION: &str = "notifications";

// ============================================================================
// User keys
// ============================================================================

/// Generate partition key of the by-id user view.
///
/// Pattern: `user:<user_id>`
pub fn user_pk(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Generate sort key of the by-id user view. The active flag is the sort key.
///
/// Pattern: `true` | `false`
pub fn user_status_sk(is_active: bool) -> String {
    is_active.to_string()
}

/// Key of the by-id user view.
pub fn user_by_id(user_id: &str, is_active: bool) -> ItemKey {
    ItemKey::new(user_pk(user_id), user_status_sk(is_active))
}

/// Generate sort key of the by-email user view.
///
/// Pattern: `email:<email>`
pub fn user_email_sk(email: &str) -> String {
    format!("{EMAIL_PREFIX}{email}")
}

/// Key of the by-email user view.
pub fn user_by_email(email: &str) -> ItemKey {
    ItemKey::new(USERS_PARTITION, user_email_sk(email))
}

/// Generate sort key of the by-username user view.
///
/// Pattern: `username:<username>`
pub fn user_username_sk(username: &str) -> String {
    format!("{USERNAME_PREFIX}{username}")
}

/// Key of the by-username user view.
pub fn user_by_username(username: &str) -> ItemKey {
    ItemKey::new(USERS_PARTITION, user_username_sk(username))
}

// ============================================================================
// Post keys
// ============================================================================

/// Generate sort key of the by-author post view.
///
/// Pattern: `post:<post_id>`
pub fn post_sk(post_id: &str) -> String {
    format!("{POST_PREFIX}{post_id}")
}

/// Key of the by-author post view: `user:<user_id>` / `post:<post_id>`.
pub fn post_by_author(user_id: &str, post_id: &str) -> ItemKey {
    ItemKey::new(user_pk(user_id), post_sk(post_id))
}

/// Fixed-width timestamp used inside sort keys.
///
/// Microsecond precision with a `Z` suffix, so that lexicographic order of
/// the keys equals chronological order.
pub fn sortable_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Prefix selecting every post of one category in the `posts` partition.
///
/// Pattern: `post:<CATEGORY>:`
pub fn category_prefix(category: PostCategory) -> String {
    format!("{POST_PREFIX}{}:", category.as_str())
}

/// Generate sort key of the category post view.
///
/// Pattern: `post:<CATEGORY>:<rfc3339 micros>:<post_id>`
pub fn post_category_sk(
    category: PostCategory,
    created_at: DateTime<Utc>,
    post_id: &str,
) -> String {
    format!(
        "{}{}:{post_id}",
        category_prefix(category),
        sortable_timestamp(created_at)
    )
}

/// Key of the category post view.
pub fn post_by_category(
    category: PostCategory,
    created_at: DateTime<Utc>,
    post_id: &str,
) -> ItemKey {
    ItemKey::new(
        POSTS_PARTITION,
        post_category_sk(category, created_at, post_id),
    )
}

/// Key of the notification feed item of a post.
///
/// Pattern: `notifications` / `post:<post_id>`
pub fn notification(post_id: &str) -> ItemKey {
    ItemKey::new(NOTIFICATIONS_PARTITION, post_sk(post_id))
}

// ============================================================================
// Like keys
// ============================================================================

/// Generate partition key holding the like markers of a post.
///
/// Pattern: `like:<post_id>`
pub fn like_pk(post_id: &str) -> String {
    format!("{LIKE_PREFIX}{post_id}")
}

/// Key of the marker recording that `user_id` liked `post_id`.
///
/// Pattern: `like:<post_id>` / `user:<user_id>`
pub fn like_marker(post_id: &str, user_id: &str) -> ItemKey {
    ItemKey::new(like_pk(post_id), user_pk(user_id))
}

// ============================================================================
// Question and answer keys
// ============================================================================

/// Generate partition key holding the questions of a post.
///
/// Pattern: `post:<post_id>`
pub fn questions_pk(post_id: &str) -> String {
    format!("{POST_PREFIX}{post_id}")
}

/// Generate sort key of a question.
///
/// Pattern: `question:<question_id>`
pub fn question_sk(question_id: &str) -> String {
    format!("{QUESTION_PREFIX}{question_id}")
}

/// Key of a question under its post.
pub fn question(post_id: &str, question_id: &str) -> ItemKey {
    ItemKey::new(questions_pk(post_id), question_sk(question_id))
}

/// Generate partition key holding the answers of a question.
///
/// Pattern: `question:<question_id>`
pub fn answers_pk(question_id: &str) -> String {
    format!("{QUESTION_PREFIX}{question_id}")
}

/// Generate sort key of an answer.
///
/// Pattern: `reply:<answer_id>`
pub fn answer_sk(answer_id: &str) -> String {
    format!("{REPLY_PREFIX}{answer_id}")
}

/// Key of an answer under its question.
pub fn answer(question_id: &str, answer_id: &str) -> ItemKey {
    ItemKey::new(answers_pk(question_id), answer_sk(answer_id))
}

// ============================================================================
// OTP keys
// ============================================================================

/// Generate partition key of the OTP records of an email.
///
/// Pattern: `otp:email:<email>`
pub fn otp_pk(email: &str) -> String {
    format!("{OTP_PREFIX}{email}")
}

/// Key of an OTP record; the code itself is the sort key.
pub fn otp(email: &str, code: &str) -> ItemKey {
    ItemKey::new(otp_pk(email), code)
}

/// Removes a key prefix, returning the remainder when present.
pub fn strip_prefix<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value.strip_prefix(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap()
    }

    #[test]
    fn test_user_views() {
        assert_eq!(user_by_id("abc", true), ItemKey::new("user:abc", "true"));
        assert_eq!(user_by_id("abc", false), ItemKey::new("user:abc", "false"));
        assert_eq!(
            user_by_email("a@b.com"),
            ItemKey::new("users", "email:a@b.com")
        );
        assert_eq!(
            user_by_username("alice"),
            ItemKey::new("users", "username:alice")
        );
    }

    #[test]
    fn test_post_views() {
        assert_eq!(
            post_by_author("u1", "p1"),
            ItemKey::new("user:u1", "post:p1")
        );
        assert_eq!(
            post_by_category(PostCategory::Food, at(10, 30, 0), "p1"),
            ItemKey::new("posts", "post:FOOD:2024-03-15T10:30:00.000000Z:p1")
        );
        assert_eq!(
            notification("p1"),
            ItemKey::new("notifications", "post:p1")
        );
    }

    #[test]
    fn test_category_prefix_matches_category_keys() {
        let sk = post_category_sk(PostCategory::Travel, at(8, 0, 0), "x");
        assert!(sk.starts_with(&category_prefix(PostCategory::Travel)));
        assert!(!sk.starts_with(&category_prefix(PostCategory::Food)));
    }

    #[test]
    fn test_category_keys_sort_chronologically() {
        let earlier = post_category_sk(PostCategory::Food, at(9, 59, 59), "zzz");
        let later = post_category_sk(PostCategory::Food, at(10, 0, 0), "aaa");
        assert!(earlier < later);
    }

    #[test]
    fn test_sortable_timestamp_is_fixed_width() {
        let whole = sortable_timestamp(at(1, 2, 3));
        let fractional = sortable_timestamp(at(1, 2, 3) + chrono::Duration::microseconds(5));
        assert_eq!(whole.len(), fractional.len());
        assert!(whole < fractional);
    }

    #[test]
    fn test_sortable_timestamp_drops_nanoseconds() {
        let base = at(1, 2, 3) + chrono::Duration::microseconds(7);
        let with_nanos = base + chrono::Duration::nanoseconds(450);
        assert_eq!(sortable_timestamp(base), sortable_timestamp(with_nanos));
    }

    #[test]
    fn test_question_and_answer_keys() {
        assert_eq!(question("p1", "q1"), ItemKey::new("post:p1", "question:q1"));
        assert_eq!(answer("q1", "r1"), ItemKey::new("question:q1", "reply:r1"));
    }

    #[test]
    fn test_like_and_otp_keys() {
        assert_eq!(like_marker("p1", "u1"), ItemKey::new("like:p1", "user:u1"));
        assert_eq!(
            otp("a@b.com", "123456"),
            ItemKey::new("otp:email:a@b.com", "123456")
        );
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("email:a@b.com", EMAIL_PREFIX), Some("a@b.com"));
        assert_eq!(strip_prefix("username:x", EMAIL_PREFIX), None);
    }
}
