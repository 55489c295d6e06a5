use chrono::{SubsecRound, Utc};
use localeyes_core::social::{
    generate_short_id, Answer, CreateAnswerRequest, CreatePostRequest, CreateQuestionRequest,
    DeletePostRequest, LikePostRequest, LikeStatus, ListPostsQuery, Post, Question,
    UpdatePostRequest,
};

use super::error::{Result, ServiceError};
use crate::repositories::{AnswerRepository, PostRepository, QuestionRepository};

/// Posts, likes, questions and answers on behalf of a signed-in user.
#[derive(Clone)]
pub struct PostService {
    posts: PostRepository,
    questions: QuestionRepository,
    answers: AnswerRepository,
}

impl PostService {
    pub fn new(
        posts: PostRepository,
        questions: QuestionRepository,
        answers: AnswerRepository,
    ) -> Self {
        Self {
            posts,
            questions,
            answers,
        }
    }

    pub async fn create(&self, user_id: &str, request: CreatePostRequest) -> Result<Post> {
        let category = request.validate()?;
        // Clients echo `created_at` back to address the post, so keep it at
        // the precision the JSON encoding round-trips.
        let post = Post {
            id: generate_short_id(),
            user_id: user_id.to_string(),
            title: request.title,
            content: request.content,
            category,
            likes: 0,
            created_at: Utc::now().trunc_subsecs(6),
        };
        self.posts.create(&post).await?;
        Ok(post)
    }

    pub async fn list(&self, query: &ListPostsQuery) -> Result<Vec<Post>> {
        Ok(self
            .posts
            .list(query.category(), query.search(), query.offset(), query.limit())
            .await?)
    }

    pub async fn list_own(&self, user_id: &str) -> Result<Vec<Post>> {
        Ok(self.posts.list_by_author(user_id).await?)
    }

    pub async fn update(
        &self,
        user_id: &str,
        post_id: &str,
        request: UpdatePostRequest,
    ) -> Result<()> {
        let locator = request.validate()?;
        self.posts
            .update(user_id, post_id, locator, &request.title, &request.content)
            .await
            .map_err(ServiceError::post)
    }

    pub async fn delete(
        &self,
        user_id: &str,
        post_id: &str,
        request: DeletePostRequest,
    ) -> Result<()> {
        let locator = request.validate()?;
        self.posts
            .delete(user_id, post_id, locator)
            .await
            .map_err(ServiceError::post)
    }

    /// Likes or unlikes a post. The request names the post's author so both
    /// counters can be addressed. Losing a race with a concurrent toggle by
    /// the same user leaves the counters alone and reports `LikeChanged`.
    pub async fn toggle_like(
        &self,
        user_id: &str,
        post_id: &str,
        request: LikePostRequest,
    ) -> Result<LikeStatus> {
        let locator = request.validate()?;
        self.posts
            .toggle_like(user_id, &request.user_id, post_id, locator)
            .await
            .map_err(|e| {
                if e.failed_at(0) {
                    ServiceError::LikeChanged
                } else {
                    ServiceError::post(e)
                }
            })
    }

    pub async fn like_status(&self, user_id: &str, post_id: &str) -> Result<LikeStatus> {
        Ok(if self.posts.has_liked(user_id, post_id).await? {
            LikeStatus::Liked
        } else {
            LikeStatus::NotLiked
        })
    }

    pub async fn ask(
        &self,
        user_id: &str,
        post_id: &str,
        request: CreateQuestionRequest,
    ) -> Result<Question> {
        request.validate()?;
        let question = Question {
            id: generate_short_id(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            text: request.text,
        };
        self.questions.create(&question).await?;
        Ok(question)
    }

    pub async fn questions(&self, post_id: &str) -> Result<Vec<Question>> {
        Ok(self.questions.list_by_post(post_id).await?)
    }

    /// Deletes one of the caller's questions together with its answers.
    pub async fn delete_question(
        &self,
        user_id: &str,
        post_id: &str,
        question_id: &str,
    ) -> Result<Question> {
        self.questions
            .delete(post_id, question_id, Some(user_id))
            .await
            .map_err(ServiceError::question)
    }

    pub async fn answer(
        &self,
        user_id: &str,
        question_id: &str,
        request: CreateAnswerRequest,
    ) -> Result<Answer> {
        request.validate()?;
        let answer = Answer {
            id: generate_short_id(),
            question_id: question_id.to_string(),
            user_id: user_id.to_string(),
            answer: request.answer,
        };
        self.answers.create(&answer).await?;
        Ok(answer)
    }

    pub async fn answers(&self, question_id: &str) -> Result<Vec<Answer>> {
        Ok(self.answers.list_by_question(question_id).await?)
    }

    pub async fn delete_answer(
        &self,
        user_id: &str,
        question_id: &str,
        answer_id: &str,
    ) -> Result<Answer> {
        self.answers
            .delete(question_id, answer_id, Some(user_id))
            .await
            .map_err(ServiceError::answer)
    }
}
