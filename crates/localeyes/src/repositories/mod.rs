//! Repositories over the single table.
//!
//! Each repository owns the key layout of one aggregate and keeps its
//! physical views in step. Multi-view writes go through one store
//! transaction so the views never diverge.

mod answers;
mod otp;
mod posts;
mod questions;
mod users;

pub use answers::AnswerRepository;
pub use otp::OtpRepository;
pub use posts::PostRepository;
pub use questions::QuestionRepository;
pub use users::UserRepository;

use localeyes_core::storage::{keys, Item, ItemKey, Query, Result, TableStore, WriteRequest};

/// Deletes every item of a partition whose sort key starts with `prefix`,
/// returning the deleted items.
pub(crate) async fn delete_partition(
    store: &dyn TableStore,
    partition: String,
    prefix: &str,
) -> Result<Vec<Item>> {
    let items = store
        .query_all(Query::partition(partition).begins_with(prefix))
        .await?;

    let deletes = items
        .iter()
        .filter_map(ItemKey::from_item)
        .map(WriteRequest::Delete)
        .collect::<Vec<_>>();
    if !deletes.is_empty() {
        store.batch_write(deletes).await?;
    }

    Ok(items)
}

/// Removes the answers of a question.
pub(crate) async fn delete_answers_of(store: &dyn TableStore, question_id: &str) -> Result<usize> {
    let answers = delete_partition(store, keys::answers_pk(question_id), keys::REPLY_PREFIX).await?;
    Ok(answers.len())
}
