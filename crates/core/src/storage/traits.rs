use async_trait::async_trait;

use super::types::{
    Condition, Item, ItemKey, Query, QueryPage, TransactWriteItem, UpdateAction, WriteRequest,
};
use super::Result;

/// Maximum number of members in one transaction.
pub const MAX_TRANSACT_ITEMS: usize = 100;
/// Maximum number of requests in one batch write call.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Access to the single table backing every entity.
///
/// Conditional writes report a failed condition as
/// [`RepositoryError::ConditionFailed`](super::RepositoryError::ConditionFailed);
/// transactions as
/// [`RepositoryError::TransactionCancelled`](super::RepositoryError::TransactionCancelled).
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Gets an item by its key.
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>>;

    /// Writes an item, replacing any existing one.
    async fn put(&self, item: Item, condition: Option<Condition>) -> Result<()>;

    /// Deletes an item and returns the previous version, if there was one.
    async fn delete(&self, key: &ItemKey, condition: Option<Condition>) -> Result<Option<Item>>;

    /// Applies update actions and returns the new version of the item.
    async fn update(
        &self,
        key: &ItemKey,
        actions: Vec<UpdateAction>,
        condition: Option<Condition>,
    ) -> Result<Item>;

    /// Reads one page of a partition.
    async fn query(&self, query: Query) -> Result<QueryPage>;

    /// Applies puts and deletes without atomicity.
    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<()>;

    /// Applies every write or none of them.
    async fn transact_write(&self, items: Vec<TransactWriteItem>) -> Result<()>;

    /// Follows `last_evaluated_key` until the partition is exhausted.
    async fn query_all(&self, query: Query) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start = query.exclusive_start_key.clone();

        loop {
            let page = self.query(query.clone().start_after(start)).await?;
            items.extend(page.items);
            match page.last_evaluated_key {
                Some(key) => start = Some(key),
                None => break,
            }
        }

        Ok(items)
    }
}
