//! In-memory table implementation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use localeyes_core::storage::{
    Condition, Item, ItemKey, Query, QueryPage, RepositoryError, Result, SortKeyCondition,
    TableStore, TransactWriteItem, UpdateAction, Value, WriteRequest, MAX_TRANSACT_ITEMS,
    RECENCY_INDEX_SORT_KEY,
};

type Table = BTreeMap<(String, String), Item>;

/// In-memory single table for tests and local runs.
///
/// Items are kept in a `BTreeMap` keyed by `(pk, sk)`, so a partition is a
/// contiguous, sort-key ordered range. Data is not persisted and will be
/// lost when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    items: Arc<RwLock<Table>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently stored.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn table_key(key: &ItemKey) -> (String, String) {
    (key.pk.clone(), key.sk.clone())
}

fn item_key(item: &Item) -> Result<ItemKey> {
    ItemKey::from_item(item)
        .ok_or_else(|| RepositoryError::InvalidData("item is missing pk or sk".to_string()))
}

fn check(condition: Option<&Condition>, current: Option<&Item>, key: &ItemKey) -> Result<()> {
    match condition {
        Some(condition) if !condition.holds(current) => {
            Err(RepositoryError::ConditionFailed(key.to_string()))
        }
        _ => Ok(()),
    }
}

fn apply_update(table: &mut Table, key: &ItemKey, actions: &[UpdateAction]) -> Item {
    let item = table
        .entry(table_key(key))
        .or_insert_with(|| key.to_item());
    for action in actions {
        action.apply(item);
    }
    item.clone()
}

/// Position of an item in the order a query walks: the table orders a
/// partition by sort key, the recency index by creation time then sort key.
fn order_key(item: &Item, recency_index: bool) -> (String, String) {
    let text = |name: &str| {
        item.get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    if recency_index {
        (text(RECENCY_INDEX_SORT_KEY), text("sk"))
    } else {
        (text("sk"), String::new())
    }
}

fn matches_sort_key(item: &Item, condition: &SortKeyCondition, recency_index: bool) -> bool {
    match condition {
        SortKeyCondition::Any => true,
        SortKeyCondition::BeginsWith(prefix) => order_key(item, recency_index)
            .0
            .starts_with(prefix.as_str()),
    }
}

/// Key attributes returned as `last_evaluated_key`.
fn evaluated_key(item: &Item, recency_index: bool) -> Item {
    let mut key = ItemKey::from_item(item)
        .map(|k| k.to_item())
        .unwrap_or_default();
    if recency_index {
        if let Some(created_at) = item.get(RECENCY_INDEX_SORT_KEY) {
            key.insert(RECENCY_INDEX_SORT_KEY.to_string(), created_at.clone());
        }
    }
    key
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(&table_key(key)).cloned())
    }

    async fn put(&self, item: Item, condition: Option<Condition>) -> Result<()> {
        let key = item_key(&item)?;
        let mut items = self.items.write().await;
        check(condition.as_ref(), items.get(&table_key(&key)), &key)?;
        items.insert(table_key(&key), item);
        Ok(())
    }

    async fn delete(&self, key: &ItemKey, condition: Option<Condition>) -> Result<Option<Item>> {
        let mut items = self.items.write().await;
        check(condition.as_ref(), items.get(&table_key(key)), key)?;
        Ok(items.remove(&table_key(key)))
    }

    async fn update(
        &self,
        key: &ItemKey,
        actions: Vec<UpdateAction>,
        condition: Option<Condition>,
    ) -> Result<Item> {
        let mut items = self.items.write().await;
        check(condition.as_ref(), items.get(&table_key(key)), key)?;
        Ok(apply_update(&mut items, key, &actions))
    }

    async fn query(&self, query: Query) -> Result<QueryPage> {
        let items = self.items.read().await;
        let index = query.recency_index;

        let range_start = (query.partition.clone(), String::new());
        let mut candidates: Vec<&Item> = items
            .range(range_start..)
            .take_while(|((pk, _), _)| *pk == query.partition)
            .map(|(_, item)| item)
            .filter(|item| !index || item.contains_key(RECENCY_INDEX_SORT_KEY))
            .filter(|item| matches_sort_key(item, &query.sort_key, index))
            .collect();

        candidates.sort_by_key(|item| order_key(item, index));
        if !query.scan_forward {
            candidates.reverse();
        }

        if let Some(start) = &query.exclusive_start_key {
            let start = order_key(start, index);
            candidates.retain(|item| {
                let position = order_key(item, index);
                if query.scan_forward {
                    position > start
                } else {
                    position < start
                }
            });
        }

        // The limit bounds the items evaluated, the filter is applied after.
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        let more = candidates.len() > limit;
        candidates.truncate(limit);

        let last_evaluated_key = match candidates.last() {
            Some(last) if more => Some(evaluated_key(last, index)),
            _ => None,
        };

        let items = candidates
            .into_iter()
            .filter(|item| query.filter.as_ref().is_none_or(|f| f.matches(item)))
            .cloned()
            .collect();

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<()> {
        let mut items = self.items.write().await;
        for request in requests {
            match request {
                WriteRequest::Put(item) => {
                    let key = item_key(&item)?;
                    items.insert(table_key(&key), item);
                }
                WriteRequest::Delete(key) => {
                    items.remove(&table_key(&key));
                }
            }
        }
        Ok(())
    }

    async fn transact_write(&self, writes: Vec<TransactWriteItem>) -> Result<()> {
        if writes.len() > MAX_TRANSACT_ITEMS {
            return Err(RepositoryError::QueryFailed(format!(
                "Transaction of {} items exceeds the limit of {MAX_TRANSACT_ITEMS}",
                writes.len()
            )));
        }

        let mut items = self.items.write().await;

        let mut seen = HashSet::new();
        let mut failed = Vec::new();
        for (index, write) in writes.iter().enumerate() {
            let key = write.key().ok_or_else(|| {
                RepositoryError::InvalidData("item is missing pk or sk".to_string())
            })?;
            if !seen.insert(key.clone()) {
                return Err(RepositoryError::QueryFailed(format!(
                    "Transaction touches {key} more than once"
                )));
            }
            let holds = write
                .condition()
                .is_none_or(|c| c.holds(items.get(&table_key(&key))));
            if !holds {
                failed.push(index);
            }
        }

        if !failed.is_empty() {
            return Err(RepositoryError::TransactionCancelled { failed });
        }

        for write in writes {
            match write {
                TransactWriteItem::Put { item, .. } => {
                    let key = item_key(&item)?;
                    items.insert(table_key(&key), item);
                }
                TransactWriteItem::Delete { key, .. } => {
                    items.remove(&table_key(&key));
                }
                TransactWriteItem::Update { key, actions, .. } => {
                    apply_update(&mut items, &key, &actions);
                }
            }
        }

        Ok(())
    }
}
