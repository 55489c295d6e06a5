//! DynamoDB table implementation.
//!
//! Implements `TableStore` from `localeyes_core::storage` over a single
//! table keyed by `pk`/`sk` with a recency index keyed by `pk`/`created_at`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    Delete, DeleteRequest, Put, PutRequest, ReturnValue, TransactWriteItem as SdkTransactItem,
    Update, WriteRequest as SdkWriteRequest,
};
use aws_sdk_dynamodb::Client;

use localeyes_core::storage::{
    Condition, Item, ItemKey, Query, QueryPage, RepositoryError, Result, TableStore,
    TransactWriteItem, UpdateAction, WriteRequest, MAX_BATCH_WRITE_ITEMS, MAX_TRANSACT_ITEMS,
};

use super::conversions::{attributes_to_item, item_to_attributes, key_to_attributes};
use super::error::{
    map_batch_write_error, map_build_error, map_delete_item_error, map_get_item_error,
    map_put_item_error, map_query_error, map_transact_write_error, map_update_item_error,
};
use super::expression::Expressions;

/// Attempts at resubmitting unprocessed batch items before giving up.
const MAX_BATCH_RETRIES: u32 = 5;
const BATCH_RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// DynamoDB-backed single table.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client, table and recency
    /// index names.
    pub fn new(
        client: Client,
        table_name: impl Into<String>,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            index_name: index_name.into(),
        }
    }

    /// Creates a new store using the AWS SDK default credential chain.
    ///
    /// `endpoint_url` points the client at a local DynamoDB when set.
    pub async fn connect(
        region: &str,
        endpoint_url: Option<&str>,
        table_name: impl Into<String>,
        index_name: impl Into<String>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        Self::new(Client::new(&config), table_name, index_name)
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn transact_item(&self, write: TransactWriteItem) -> Result<SdkTransactItem> {
        let mut exprs = Expressions::new();

        let item = match write {
            TransactWriteItem::Put { item, condition } => {
                let condition = condition.map(|c| exprs.condition(&c));
                let put = Put::builder()
                    .table_name(&self.table_name)
                    .set_item(Some(item_to_attributes(&item)))
                    .set_condition_expression(condition)
                    .set_expression_attribute_names(exprs.names())
                    .set_expression_attribute_values(exprs.values())
                    .build()
                    .map_err(map_build_error)?;
                SdkTransactItem::builder().put(put).build()
            }
            TransactWriteItem::Delete { key, condition } => {
                let condition = condition.map(|c| exprs.condition(&c));
                let delete = Delete::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(key_to_attributes(&key)))
                    .set_condition_expression(condition)
                    .set_expression_attribute_names(exprs.names())
                    .set_expression_attribute_values(exprs.values())
                    .build()
                    .map_err(map_build_error)?;
                SdkTransactItem::builder().delete(delete).build()
            }
            TransactWriteItem::Update {
                key,
                actions,
                condition,
            } => {
                let expression = update_expression(&mut exprs, &actions)?;
                let condition = condition.map(|c| exprs.condition(&c));
                let update = Update::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(key_to_attributes(&key)))
                    .update_expression(expression)
                    .set_condition_expression(condition)
                    .set_expression_attribute_names(exprs.names())
                    .set_expression_attribute_values(exprs.values())
                    .build()
                    .map_err(map_build_error)?;
                SdkTransactItem::builder().update(update).build()
            }
        };

        Ok(item)
    }
}

fn update_expression(exprs: &mut Expressions, actions: &[UpdateAction]) -> Result<String> {
    if actions.is_empty() {
        return Err(RepositoryError::InvalidData(
            "update requires at least one action".to_string(),
        ));
    }
    Ok(exprs.update(actions))
}

fn write_request(request: WriteRequest) -> Result<SdkWriteRequest> {
    let request = match request {
        WriteRequest::Put(item) => SdkWriteRequest::builder()
            .put_request(
                PutRequest::builder()
                    .set_item(Some(item_to_attributes(&item)))
                    .build()
                    .map_err(map_build_error)?,
            )
            .build(),
        WriteRequest::Delete(key) => SdkWriteRequest::builder()
            .delete_request(
                DeleteRequest::builder()
                    .set_key(Some(key_to_attributes(&key)))
                    .build()
                    .map_err(map_build_error)?,
            )
            .build(),
    };
    Ok(request)
}

#[async_trait]
impl TableStore for DynamoDbStore {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_attributes(key)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.as_ref().map(attributes_to_item).transpose()
    }

    async fn put(&self, item: Item, condition: Option<Condition>) -> Result<()> {
        let key = ItemKey::from_item(&item)
            .ok_or_else(|| RepositoryError::InvalidData("item is missing pk or sk".to_string()))?;
        let mut exprs = Expressions::new();
        let condition = condition.map(|c| exprs.condition(&c));

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_attributes(&item)))
            .set_condition_expression(condition)
            .set_expression_attribute_names(exprs.names())
            .set_expression_attribute_values(exprs.values())
            .send()
            .await
            .map_err(|e| map_put_item_error(e, &key))?;

        Ok(())
    }

    async fn delete(&self, key: &ItemKey, condition: Option<Condition>) -> Result<Option<Item>> {
        let mut exprs = Expressions::new();
        let condition = condition.map(|c| exprs.condition(&c));

        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_attributes(key)))
            .set_condition_expression(condition)
            .set_expression_attribute_names(exprs.names())
            .set_expression_attribute_values(exprs.values())
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, key))?;

        result.attributes.as_ref().map(attributes_to_item).transpose()
    }

    async fn update(
        &self,
        key: &ItemKey,
        actions: Vec<UpdateAction>,
        condition: Option<Condition>,
    ) -> Result<Item> {
        let mut exprs = Expressions::new();
        let expression = update_expression(&mut exprs, &actions)?;
        let condition = condition.map(|c| exprs.condition(&c));

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_attributes(key)))
            .update_expression(expression)
            .set_condition_expression(condition)
            .set_expression_attribute_names(exprs.names())
            .set_expression_attribute_values(exprs.values())
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, key))?;

        match result.attributes {
            Some(attributes) => attributes_to_item(&attributes),
            None => Ok(key.to_item()),
        }
    }

    async fn query(&self, query: Query) -> Result<QueryPage> {
        let mut exprs = Expressions::new();
        let key_condition =
            exprs.key_condition(&query.partition, &query.sort_key, query.recency_index);
        let filter = query.filter.as_ref().map(|f| exprs.filter(f));
        let index_name = query.recency_index.then(|| self.index_name.clone());
        let limit = query.limit.map(|l| l.min(i32::MAX as u32) as i32);

        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .set_index_name(index_name)
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_expression_attribute_names(exprs.names())
            .set_expression_attribute_values(exprs.values())
            .set_limit(limit)
            .set_exclusive_start_key(query.exclusive_start_key.as_ref().map(item_to_attributes))
            .scan_index_forward(query.scan_forward)
            .send()
            .await
            .map_err(map_query_error)?;

        let items = result
            .items()
            .iter()
            .map(attributes_to_item)
            .collect::<Result<Vec<_>>>()?;
        let last_evaluated_key = result
            .last_evaluated_key()
            .map(attributes_to_item)
            .transpose()?;

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<()> {
        let requests = requests
            .into_iter()
            .map(write_request)
            .collect::<Result<Vec<_>>>()?;

        for chunk in requests.chunks(MAX_BATCH_WRITE_ITEMS) {
            let mut pending = chunk.to_vec();
            let mut attempt = 0;

            while !pending.is_empty() {
                let result = self
                    .client
                    .batch_write_item()
                    .set_request_items(Some(HashMap::from([(
                        self.table_name.clone(),
                        pending,
                    )])))
                    .send()
                    .await
                    .map_err(map_batch_write_error)?;

                pending = result
                    .unprocessed_items
                    .and_then(|mut unprocessed| unprocessed.remove(&self.table_name))
                    .unwrap_or_default();

                if pending.is_empty() {
                    break;
                }

                attempt += 1;
                if attempt > MAX_BATCH_RETRIES {
                    return Err(RepositoryError::QueryFailed(format!(
                        "{} batch writes still unprocessed after {} retries",
                        pending.len(),
                        MAX_BATCH_RETRIES
                    )));
                }

                tracing::debug!(
                    unprocessed = pending.len(),
                    attempt,
                    "Resubmitting unprocessed batch writes"
                );
                tokio::time::sleep(BATCH_RETRY_BASE_DELAY * 2u32.pow(attempt)).await;
            }
        }

        Ok(())
    }

    async fn transact_write(&self, writes: Vec<TransactWriteItem>) -> Result<()> {
        if writes.len() > MAX_TRANSACT_ITEMS {
            return Err(RepositoryError::QueryFailed(format!(
                "Transaction of {} items exceeds the limit of {}",
                writes.len(),
                MAX_TRANSACT_ITEMS
            )));
        }

        let items = writes
            .into_iter()
            .map(|write| self.transact_item(write))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_transact_write_error)?;

        Ok(())
    }
}
