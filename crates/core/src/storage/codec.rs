//! Entity codec.
//!
//! Pure functions converting domain types to table items and back, one
//! encoder per physical view. Decoders accept any view of an entity since
//! every view carries the full set of attributes.

use chrono::{DateTime, Utc};

use crate::social::{Answer, Notification, OtpRecord, Post, Question, User};

use super::error::RepositoryError;
use super::keys;
use super::types::{Item, ItemKey, Value, RECENCY_INDEX_SORT_KEY};

// ============================================================================
// Attribute names
// ============================================================================

pub const ATTR_USER_ID: &str = "uid";
pub const ATTR_EMAIL: &str = "email";
pub const ATTR_USERNAME: &str = "username";
pub const ATTR_PASSWORD: &str = "password";
pub const ATTR_CITY: &str = "city";
pub const ATTR_DWELLING_AGE: &str = "dwelling_age";
pub const ATTR_IS_ACTIVE: &str = "is_active";
pub const ATTR_TAG: &str = "tag";

pub const ATTR_POST_ID: &str = "post_id";
pub const ATTR_AUTHOR_ID: &str = "user_id";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_CONTENT: &str = "content";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_LIKES: &str = "likes";
pub const ATTR_CREATED_AT: &str = RECENCY_INDEX_SORT_KEY;
pub const ATTR_TTL: &str = "ttl";

pub const ATTR_QUESTION_ID: &str = "question_id";
pub const ATTR_QUESTION_AUTHOR: &str = "q_user_id";
pub const ATTR_TEXT: &str = "text";

pub const ATTR_ANSWER_ID: &str = "r_id";
pub const ATTR_ANSWER_QUESTION: &str = "q_id";
pub const ATTR_ANSWER: &str = "answer";
pub const ATTR_ANSWER_AUTHOR: &str = "r_user_id";

pub const ATTR_OTP: &str = "otp";

fn keyed(key: ItemKey) -> Item {
    key.to_item()
}

fn insert(item: &mut Item, name: &str, value: Value) {
    item.insert(name.to_string(), value);
}

// ============================================================================
// User conversions
// ============================================================================

fn user_attributes(mut item: Item, user: &User) -> Item {
    insert(&mut item, ATTR_USER_ID, Value::s(&user.id));
    insert(&mut item, ATTR_EMAIL, Value::s(&user.email));
    insert(&mut item, ATTR_USERNAME, Value::s(&user.username));
    insert(&mut item, ATTR_PASSWORD, Value::s(&user.password_hash));
    insert(&mut item, ATTR_CITY, Value::s(&user.city));
    insert(&mut item, ATTR_DWELLING_AGE, Value::N(user.dwelling_age));
    insert(&mut item, ATTR_IS_ACTIVE, Value::Bool(user.is_active));
    insert(&mut item, ATTR_TAG, Value::s(user.tag.as_str()));
    item
}

/// Item of the by-id view; its sort key is the active flag.
pub fn user_by_id_item(user: &User) -> Item {
    user_attributes(keyed(keys::user_by_id(&user.id, user.is_active)), user)
}

pub fn user_by_email_item(user: &User) -> Item {
    user_attributes(keyed(keys::user_by_email(&user.email)), user)
}

pub fn user_by_username_item(user: &User) -> Item {
    user_attributes(keyed(keys::user_by_username(&user.username)), user)
}

/// Convert any user view to a User.
pub fn item_to_user(item: &Item) -> Result<User, RepositoryError> {
    let tag = get_string(item, ATTR_TAG)?;
    Ok(User {
        id: get_string(item, ATTR_USER_ID)?,
        email: get_string(item, ATTR_EMAIL)?,
        username: get_string(item, ATTR_USERNAME)?,
        password_hash: get_string(item, ATTR_PASSWORD)?,
        city: get_string(item, ATTR_CITY)?,
        dwelling_age: get_f64(item, ATTR_DWELLING_AGE)?,
        is_active: get_bool(item, ATTR_IS_ACTIVE)?,
        tag: tag
            .parse()
            .map_err(|e| RepositoryError::InvalidData(format!("Invalid tag: {e}")))?,
    })
}

// ============================================================================
// Post conversions
// ============================================================================

fn post_attributes(mut item: Item, post: &Post) -> Item {
    insert(&mut item, ATTR_POST_ID, Value::s(&post.id));
    insert(&mut item, ATTR_AUTHOR_ID, Value::s(&post.user_id));
    insert(&mut item, ATTR_TITLE, Value::s(&post.title));
    insert(&mut item, ATTR_CONTENT, Value::s(&post.content));
    insert(&mut item, ATTR_TYPE, Value::s(post.category.as_str()));
    insert(&mut item, ATTR_LIKES, Value::int(post.likes));
    insert(
        &mut item,
        ATTR_CREATED_AT,
        Value::s(keys::sortable_timestamp(post.created_at)),
    );
    item
}

pub fn post_by_author_item(post: &Post) -> Item {
    post_attributes(keyed(keys::post_by_author(&post.user_id, &post.id)), post)
}

pub fn post_by_category_item(post: &Post) -> Item {
    post_attributes(
        keyed(keys::post_by_category(
            post.category,
            post.created_at,
            &post.id,
        )),
        post,
    )
}

pub fn notification_item(notification: &Notification) -> Item {
    let post = &notification.post;
    let mut item = post_attributes(keyed(keys::notification(&post.id)), post);
    insert(&mut item, ATTR_TTL, Value::int(notification.expires_at));
    item
}

/// Convert any post view to a Post.
pub fn item_to_post(item: &Item) -> Result<Post, RepositoryError> {
    let category = get_string(item, ATTR_TYPE)?;
    Ok(Post {
        id: get_string(item, ATTR_POST_ID)?,
        user_id: get_string(item, ATTR_AUTHOR_ID)?,
        title: get_string(item, ATTR_TITLE)?,
        content: get_string(item, ATTR_CONTENT)?,
        category: category
            .parse()
            .map_err(|e| RepositoryError::InvalidData(format!("Invalid post type: {e}")))?,
        likes: get_i64(item, ATTR_LIKES)?,
        created_at: get_datetime(item, ATTR_CREATED_AT)?,
    })
}

pub fn item_to_notification(item: &Item) -> Result<Notification, RepositoryError> {
    Ok(Notification {
        post: item_to_post(item)?,
        expires_at: get_i64(item, ATTR_TTL)?,
    })
}

/// Marker recording that a user liked a post.
pub fn like_marker_item(post_id: &str, user_id: &str) -> Item {
    let mut item = keyed(keys::like_marker(post_id, user_id));
    insert(&mut item, ATTR_POST_ID, Value::s(post_id));
    insert(&mut item, ATTR_AUTHOR_ID, Value::s(user_id));
    item
}

// ============================================================================
// Question and answer conversions
// ============================================================================

pub fn question_to_item(question: &Question) -> Item {
    let mut item = keyed(keys::question(&question.post_id, &question.id));
    insert(&mut item, ATTR_QUESTION_ID, Value::s(&question.id));
    insert(&mut item, ATTR_POST_ID, Value::s(&question.post_id));
    insert(&mut item, ATTR_QUESTION_AUTHOR, Value::s(&question.user_id));
    insert(&mut item, ATTR_TEXT, Value::s(&question.text));
    item
}

pub fn item_to_question(item: &Item) -> Result<Question, RepositoryError> {
    Ok(Question {
        id: get_string(item, ATTR_QUESTION_ID)?,
        post_id: get_string(item, ATTR_POST_ID)?,
        user_id: get_string(item, ATTR_QUESTION_AUTHOR)?,
        text: get_string(item, ATTR_TEXT)?,
    })
}

pub fn answer_to_item(answer: &Answer) -> Item {
    let mut item = keyed(keys::answer(&answer.question_id, &answer.id));
    insert(&mut item, ATTR_ANSWER_ID, Value::s(&answer.id));
    insert(&mut item, ATTR_ANSWER_QUESTION, Value::s(&answer.question_id));
    insert(&mut item, ATTR_ANSWER, Value::s(&answer.answer));
    insert(&mut item, ATTR_ANSWER_AUTHOR, Value::s(&answer.user_id));
    item
}

pub fn item_to_answer(item: &Item) -> Result<Answer, RepositoryError> {
    Ok(Answer {
        id: get_string(item, ATTR_ANSWER_ID)?,
        question_id: get_string(item, ATTR_ANSWER_QUESTION)?,
        user_id: get_string(item, ATTR_ANSWER_AUTHOR)?,
        answer: get_string(item, ATTR_ANSWER)?,
    })
}

// ============================================================================
// OTP conversions
// ============================================================================

pub fn otp_to_item(record: &OtpRecord) -> Item {
    let mut item = keyed(keys::otp(&record.email, &record.code));
    insert(&mut item, ATTR_EMAIL, Value::s(&record.email));
    insert(&mut item, ATTR_OTP, Value::s(&record.code));
    insert(&mut item, ATTR_TTL, Value::int(record.expires_at));
    item
}

pub fn item_to_otp(item: &Item) -> Result<OtpRecord, RepositoryError> {
    Ok(OtpRecord {
        email: get_string(item, ATTR_EMAIL)?,
        code: get_string(item, ATTR_OTP)?,
        expires_at: get_i64(item, ATTR_TTL)?,
    })
}

// ============================================================================
// Attribute helpers
// ============================================================================

fn invalid(key: &str) -> RepositoryError {
    RepositoryError::InvalidData(format!("Missing or invalid field: {key}"))
}

/// Get a required string attribute.
pub fn get_string(item: &Item, key: &str) -> Result<String, RepositoryError> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(key))
}

fn get_f64(item: &Item, key: &str) -> Result<f64, RepositoryError> {
    item.get(key).and_then(Value::as_f64).ok_or_else(|| invalid(key))
}

fn get_i64(item: &Item, key: &str) -> Result<i64, RepositoryError> {
    item.get(key).and_then(Value::as_i64).ok_or_else(|| invalid(key))
}

fn get_bool(item: &Item, key: &str) -> Result<bool, RepositoryError> {
    item.get(key).and_then(Value::as_bool).ok_or_else(|| invalid(key))
}

/// Get a required datetime attribute (RFC 3339 format).
fn get_datetime(item: &Item, key: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let s = get_string(item, key)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid datetime {key}: {e}")))
}
