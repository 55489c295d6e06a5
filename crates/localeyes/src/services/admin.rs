use localeyes_core::social::{DeletePostRequest, ListUsersQuery, User};
use localeyes_core::storage::RepositoryError;

use super::error::{Result, ServiceError};
use crate::repositories::{AnswerRepository, PostRepository, QuestionRepository, UserRepository};

/// Moderation operations reserved to the administrator.
#[derive(Clone)]
pub struct AdminService {
    users: UserRepository,
    posts: PostRepository,
    questions: QuestionRepository,
    answers: AnswerRepository,
    admin_username: String,
}

impl AdminService {
    pub fn new(
        users: UserRepository,
        posts: PostRepository,
        questions: QuestionRepository,
        answers: AnswerRepository,
        admin_username: impl Into<String>,
    ) -> Self {
        Self {
            users,
            posts,
            questions,
            answers,
            admin_username: admin_username.into(),
        }
    }

    pub async fn list_users(&self, query: &ListUsersQuery) -> Result<Vec<User>> {
        Ok(self
            .users
            .list(
                query.offset(),
                query.limit(),
                query.search(),
                &self.admin_username,
            )
            .await?)
    }

    /// Removes every view of an account, active or not.
    pub async fn delete_user(&self, user_id: &str) -> Result<User> {
        let user = self.users.find_by_id(user_id).await.map_err(ServiceError::user)?;
        self.users.delete(&user).await.map_err(ServiceError::user)?;

        tracing::info!(user_id, username = %user.username, "Admin deleted user");
        Ok(user)
    }

    /// Re-enables a deactivated account.
    pub async fn reactivate_user(&self, user_id: &str) -> Result<()> {
        let user = self
            .users
            .fetch_by_id(user_id, false)
            .await
            .map_err(ServiceError::user)?;
        self.users
            .set_active_status(&user, true)
            .await
            .map_err(ServiceError::user)?;

        tracing::info!(user_id, "Admin reactivated user");
        Ok(())
    }

    /// Deletes a post of `author_id`. A post that exists under another
    /// author is reported as missing.
    pub async fn delete_post(
        &self,
        author_id: &str,
        post_id: &str,
        request: DeletePostRequest,
    ) -> Result<()> {
        let locator = request.validate()?;
        self.posts
            .delete(author_id, post_id, locator)
            .await
            .map_err(|e| match e {
                RepositoryError::ConditionFailed(_) => ServiceError::PostNotFound,
                e => ServiceError::post(e),
            })
    }

    pub async fn delete_question(
        &self,
        post_id: &str,
        question_id: &str,
        user_id: &str,
    ) -> Result<()> {
        let question = self
            .questions
            .delete(post_id, question_id, None)
            .await
            .map_err(ServiceError::question)?;

        tracing::info!(
            question_id,
            post_id,
            asked_by = %question.user_id,
            path_user = user_id,
            "Admin deleted question"
        );
        Ok(())
    }

    pub async fn delete_answer(
        &self,
        question_id: &str,
        answer_id: &str,
        user_id: &str,
    ) -> Result<()> {
        let answer = self
            .answers
            .delete(question_id, answer_id, None)
            .await
            .map_err(ServiceError::answer)?;

        tracing::info!(
            answer_id,
            question_id,
            answered_by = %answer.user_id,
            path_user = user_id,
            "Admin deleted answer"
        );
        Ok(())
    }
}
