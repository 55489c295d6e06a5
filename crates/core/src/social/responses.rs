//! Response payloads returned in the `data` field of the envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Answer, Notification, Post, PostCategory, Question, Tag, User};

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub city: String,
    /// Years lived in the city.
    pub living_since: f64,
    pub tag: Tag,
    pub active_status: bool,
    pub email: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            city: user.city,
            living_since: user.dwelling_age,
            tag: user.tag,
            active_status: user.is_active,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub post_id: String,
    pub user_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub category: PostCategory,
    pub content: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            post_id: post.id,
            user_id: post.user_id,
            title: post.title,
            category: post.category,
            content: post.content,
            likes: post.likes,
            created_at: post.created_at,
        }
    }
}

impl From<Notification> for PostView {
    fn from(notification: Notification) -> Self {
        notification.post.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub question_id: String,
    pub post_id: String,
    pub q_user_id: String,
    pub text: String,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            question_id: question.id,
            post_id: question.post_id,
            q_user_id: question.user_id,
            text: question.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerView {
    pub r_id: String,
    pub q_id: String,
    pub answer: String,
    pub r_user_id: String,
}

impl From<Answer> for AnswerView {
    fn from(answer: Answer) -> Self {
        Self {
            r_id: answer.id,
            q_id: answer.question_id,
            answer: answer.answer,
            r_user_id: answer.user_id,
        }
    }
}
