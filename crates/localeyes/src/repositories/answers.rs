use std::sync::Arc;

use localeyes_core::social::Answer;
use localeyes_core::storage::codec::{answer_to_item, item_to_answer, ATTR_ANSWER_AUTHOR};
use localeyes_core::storage::{
    keys, Condition, Query, RepositoryError, Result, TableStore, Value,
};

const ENTITY: &str = "Answer";

/// Answers, stored under the question they reply to.
#[derive(Clone)]
pub struct AnswerRepository {
    store: Arc<dyn TableStore>,
}

impl AnswerRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, answer: &Answer) -> Result<()> {
        self.store
            .put(answer_to_item(answer), Some(Condition::NotExists))
            .await
            .map_err(|e| match e {
                RepositoryError::ConditionFailed(_) => RepositoryError::AlreadyExists {
                    entity_type: ENTITY,
                    id: answer.id.clone(),
                },
                e => e,
            })?;

        tracing::info!(answer_id = %answer.id, question_id = %answer.question_id, "Created answer");
        Ok(())
    }

    pub async fn list_by_question(&self, question_id: &str) -> Result<Vec<Answer>> {
        let query =
            Query::partition(keys::answers_pk(question_id)).begins_with(keys::REPLY_PREFIX);
        let items = self.store.query_all(query).await?;
        items.iter().map(item_to_answer).collect()
    }

    /// Deletes an answer. With `user_id` only that user's answer is deleted;
    /// an answer written by someone else yields `ConditionFailed`.
    pub async fn delete(
        &self,
        question_id: &str,
        answer_id: &str,
        user_id: Option<&str>,
    ) -> Result<Answer> {
        let key = keys::answer(question_id, answer_id);
        let condition = match user_id {
            Some(user_id) => Condition::equals(ATTR_ANSWER_AUTHOR, Value::s(user_id)),
            None => Condition::Exists,
        };

        let not_found = || RepositoryError::NotFound {
            entity_type: ENTITY,
            id: answer_id.to_string(),
        };
        let deleted = match self.store.delete(&key, Some(condition)).await {
            Ok(Some(item)) => item_to_answer(&item)?,
            Ok(None) => return Err(not_found()),
            Err(RepositoryError::ConditionFailed(failed)) => {
                return match self.store.get(&key).await? {
                    Some(_) => Err(RepositoryError::ConditionFailed(failed)),
                    None => Err(not_found()),
                };
            }
            Err(e) => return Err(e),
        };

        tracing::info!(answer_id, question_id, "Deleted answer");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::store;

    fn answer(id: &str, question_id: &str, user_id: &str) -> Answer {
        Answer {
            id: id.to_string(),
            question_id: question_id.to_string(),
            user_id: user_id.to_string(),
            answer: "Try the corner stall".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let repo = AnswerRepository::new(store());
        repo.create(&answer("r1", "q1", "u1")).await.unwrap();
        repo.create(&answer("r2", "q1", "u2")).await.unwrap();
        repo.create(&answer("r3", "q2", "u2")).await.unwrap();

        let listed = repo.list_by_question("q1").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn test_duplicate_answer_is_rejected() {
        let repo = AnswerRepository::new(store());
        repo.create(&answer("r1", "q1", "u1")).await.unwrap();
        assert!(matches!(
            repo.create(&answer("r1", "q1", "u1")).await,
            Err(RepositoryError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_checks_author() {
        let repo = AnswerRepository::new(store());
        repo.create(&answer("r1", "q1", "u1")).await.unwrap();

        assert!(matches!(
            repo.delete("q1", "r1", Some("u2")).await,
            Err(RepositoryError::ConditionFailed(_))
        ));
        assert!(matches!(
            repo.delete("q1", "r9", Some("u1")).await,
            Err(RepositoryError::NotFound { .. })
        ));

        let deleted = repo.delete("q1", "r1", None).await.unwrap();
        assert_eq!(deleted.user_id, "u1");
        assert!(repo.list_by_question("q1").await.unwrap().is_empty());
    }
}
