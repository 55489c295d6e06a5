//! API request types.
//!
//! Payloads are decoded leniently: missing string fields become empty and
//! are rejected by `validate`, so a structurally valid body with missing
//! data reports a validation failure instead of a decoding failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::operations::{
    require, validate_email, validate_living_since, validate_password, DEFAULT_USER_PAGE_SIZE,
};
use super::types::{LivingSince, PostCategory};
use super::ValidationError;

/// Identifies the category view of a post: its category and creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostLocator {
    pub category: PostCategory,
    pub created_at: DateTime<Utc>,
}

fn parse_category(value: &str) -> Result<PostCategory, ValidationError> {
    require("type", value)?;
    value.parse()
}

fn locate(
    category: &str,
    created_at: Option<DateTime<Utc>>,
) -> Result<PostLocator, ValidationError> {
    Ok(PostLocator {
        category: parse_category(category)?,
        created_at: created_at.ok_or(ValidationError::MissingField("created_at"))?,
    })
}

fn require_living_since(
    living_since: Option<&LivingSince>,
) -> Result<&LivingSince, ValidationError> {
    let living_since = living_since.ok_or(ValidationError::MissingField("living_since"))?;
    validate_living_since(living_since)?;
    Ok(living_since)
}

/// Request payload for creating an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_since: Option<LivingSince>,
    #[serde(default)]
    pub email: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("password", &self.password)?;
        require("city", &self.city)?;
        require("email", &self.email)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require_living_since(self.living_since.as_ref())?;
        Ok(())
    }
}

/// Request payload for logging in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("password", &self.password)
    }
}

/// Request payload for updating one's own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_since: Option<LivingSince>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<LivingSince, ValidationError> {
        require("password", &self.password)?;
        require("city", &self.city)?;
        validate_password(&self.password)?;
        require_living_since(self.living_since.as_ref()).copied()
    }
}

/// Request payload for creating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "type")]
    pub category: String,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<PostCategory, ValidationError> {
        require("title", &self.title)?;
        require("content", &self.content)?;
        parse_category(&self.category)
    }
}

/// Request payload for updating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub category: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<PostLocator, ValidationError> {
        require("title", &self.title)?;
        require("content", &self.content)?;
        locate(&self.category, self.created_at)
    }
}

/// Request payload for deleting a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub category: String,
}

impl DeletePostRequest {
    pub fn validate(&self) -> Result<PostLocator, ValidationError> {
        locate(&self.category, self.created_at)
    }
}

/// Request payload for toggling a like. `user_id` is the post's author.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikePostRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub category: String,
}

impl LikePostRequest {
    pub fn validate(&self) -> Result<PostLocator, ValidationError> {
        require("user_id", &self.user_id)?;
        locate(&self.category, self.created_at)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    #[serde(default)]
    pub text: String,
}

impl CreateQuestionRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("text", &self.text)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAnswerRequest {
    #[serde(default)]
    pub answer: String,
}

impl CreateAnswerRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("answer", &self.answer)
    }
}

/// Request payload for asking a password reset code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtpRequest {
    #[serde(default)]
    pub email: String,
}

impl OtpRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)
    }
}

/// Request payload for resetting a password with a one-time code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
    #[serde(default)]
    pub new_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        require("otp", &self.otp)?;
        require("new_password", &self.new_password)?;
        validate_password(&self.new_password)
    }
}

fn parse_count(value: Option<&String>) -> Option<usize> {
    value.and_then(|v| v.trim().parse().ok())
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.as_str()).filter(|v| !v.is_empty())
}

/// Query parameters of the posts listing.
///
/// Values that do not parse are ignored rather than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl ListPostsQuery {
    pub fn category(&self) -> Option<PostCategory> {
        self.filter.as_deref().and_then(|f| f.parse().ok())
    }

    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_ref())
    }

    pub fn limit(&self) -> Option<usize> {
        parse_count(self.limit.as_ref())
    }

    pub fn offset(&self) -> usize {
        parse_count(self.offset.as_ref()).unwrap_or(0)
    }
}

/// Query parameters of the admin users listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListUsersQuery {
    pub fn limit(&self) -> usize {
        parse_count(self.limit.as_ref())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_USER_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        parse_count(self.offset.as_ref()).unwrap_or(0)
    }

    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_ref())
    }
}
