use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Category a post is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostCategory {
    Food,
    Travel,
    Shopping,
}

impl PostCategory {
    pub const ALL: [PostCategory; 3] = [Self::Food, Self::Travel, Self::Shopping];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Travel => "TRAVEL",
            Self::Shopping => "SHOPPING",
        }
    }
}

impl std::fmt::Display for PostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_string()))
    }
}

/// Whether the caller has liked a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LikeStatus {
    Liked,
    NotLiked,
}

/// Residency label derived from how long a user has lived in the city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Resident,
    Newbie,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Newbie => "newbie",
        }
    }
}

impl FromStr for Tag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resident" => Ok(Self::Resident),
            "newbie" => Ok(Self::Newbie),
            other => Err(ValidationError::InvalidTag(other.to_string())),
        }
    }
}

/// How long someone has lived in their city, as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LivingSince {
    #[serde(default)]
    pub days: f64,
    #[serde(default)]
    pub months: f64,
    #[serde(default)]
    pub years: f64,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    pub city: String,
    /// Years lived in the city, rounded to two decimals.
    pub dwelling_age: f64,
    pub is_active: bool,
    pub tag: Tag,
}

/// A post as seen by readers.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

/// Feed item announcing a recently created post.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub post: Post,
    /// Unix seconds after which the item is no longer shown.
    pub expires_at: i64,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at
    }
}

/// A question asked on a post.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub text: String,
}

/// An answer to a question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub answer: String,
}

/// One-time password issued for a password reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub email: String,
    pub code: String,
    /// Unix seconds after which the code is rejected.
    pub expires_at: i64,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at
    }
}
