use std::sync::Arc;

use localeyes_core::social::Question;
use localeyes_core::storage::codec::{item_to_question, question_to_item, ATTR_QUESTION_AUTHOR};
use localeyes_core::storage::{
    keys, Condition, Query, RepositoryError, Result, TableStore, Value,
};

use super::delete_answers_of;

const ENTITY: &str = "Question";

/// Questions, stored under the post they were asked on.
#[derive(Clone)]
pub struct QuestionRepository {
    store: Arc<dyn TableStore>,
}

impl QuestionRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, question: &Question) -> Result<()> {
        self.store
            .put(question_to_item(question), Some(Condition::NotExists))
            .await
            .map_err(|e| match e {
                RepositoryError::ConditionFailed(_) => RepositoryError::AlreadyExists {
                    entity_type: ENTITY,
                    id: question.id.clone(),
                },
                e => e,
            })?;

        tracing::info!(question_id = %question.id, post_id = %question.post_id, "Created question");
        Ok(())
    }

    pub async fn get(&self, post_id: &str, question_id: &str) -> Result<Question> {
        match self.store.get(&keys::question(post_id, question_id)).await? {
            Some(item) => item_to_question(&item),
            None => Err(RepositoryError::NotFound {
                entity_type: ENTITY,
                id: question_id.to_string(),
            }),
        }
    }

    pub async fn list_by_post(&self, post_id: &str) -> Result<Vec<Question>> {
        let query =
            Query::partition(keys::questions_pk(post_id)).begins_with(keys::QUESTION_PREFIX);
        let items = self.store.query_all(query).await?;
        items.iter().map(item_to_question).collect()
    }

    /// Deletes a question and its answers.
    ///
    /// With `user_id` only that user's question is deleted; a question
    /// asked by someone else yields `ConditionFailed`.
    pub async fn delete(
        &self,
        post_id: &str,
        question_id: &str,
        user_id: Option<&str>,
    ) -> Result<Question> {
        let key = keys::question(post_id, question_id);
        let condition = match user_id {
            Some(user_id) => Condition::equals(ATTR_QUESTION_AUTHOR, Value::s(user_id)),
            None => Condition::Exists,
        };

        let deleted = match self.store.delete(&key, Some(condition)).await {
            Ok(Some(item)) => item_to_question(&item)?,
            Ok(None) => return Err(not_found(question_id)),
            Err(RepositoryError::ConditionFailed(failed)) => {
                return match self.store.get(&key).await? {
                    Some(_) => Err(RepositoryError::ConditionFailed(failed)),
                    None => Err(not_found(question_id)),
                };
            }
            Err(e) => return Err(e),
        };

        let answers = delete_answers_of(self.store.as_ref(), question_id).await?;
        tracing::info!(question_id, post_id, answers, "Deleted question");
        Ok(deleted)
    }
}

fn not_found(question_id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: ENTITY,
        id: question_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::store;
    use crate::repositories::AnswerRepository;
    use localeyes_core::social::Answer;

    fn question(id: &str, post_id: &str, user_id: &str) -> Question {
        Question {
            id: id.to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            text: format!("question {id}"),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_list() {
        let repo = QuestionRepository::new(store());
        repo.create(&question("q1", "p1", "u1")).await.unwrap();
        repo.create(&question("q2", "p1", "u2")).await.unwrap();
        repo.create(&question("q3", "p2", "u1")).await.unwrap();

        assert_eq!(repo.get("p1", "q2").await.unwrap().user_id, "u2");
        assert_eq!(repo.list_by_post("p1").await.unwrap().len(), 2);
        assert!(repo.list_by_post("p9").await.unwrap().is_empty());
        assert!(matches!(
            repo.get("p2", "q1").await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_author() {
        let repo = QuestionRepository::new(store());
        repo.create(&question("q1", "p1", "u1")).await.unwrap();

        let stranger = repo.delete("p1", "q1", Some("u2")).await;
        assert!(matches!(stranger, Err(RepositoryError::ConditionFailed(_))));

        let missing = repo.delete("p1", "nope", Some("u1")).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));

        let deleted = repo.delete("p1", "q1", Some("u1")).await.unwrap();
        assert_eq!(deleted.id, "q1");
    }

    #[tokio::test]
    async fn test_delete_without_author_cascades_answers() {
        let store = store();
        let repo = QuestionRepository::new(store.clone());
        let answers = AnswerRepository::new(store.clone());
        repo.create(&question("q1", "p1", "u1")).await.unwrap();
        for id in ["r1", "r2"] {
            answers
                .create(&Answer {
                    id: id.to_string(),
                    question_id: "q1".to_string(),
                    user_id: "u2".to_string(),
                    answer: "yes".to_string(),
                })
                .await
                .unwrap();
        }

        repo.delete("p1", "q1", None).await.unwrap();

        assert!(answers.list_by_question("q1").await.unwrap().is_empty());
        assert!(matches!(
            repo.get("p1", "q1").await,
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
