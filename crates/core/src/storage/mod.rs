pub mod codec;
mod error;
mod http_mapping;
pub mod keys;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use http_mapping::{repository_error_to_response_code, repository_error_to_status_code};
pub use traits::{TableStore, MAX_BATCH_WRITE_ITEMS, MAX_TRANSACT_ITEMS};
pub use types::{
    Condition, Filter, Item, ItemKey, Query, QueryPage, SortKeyCondition, TransactWriteItem,
    UpdateAction, Value, WriteRequest, PK, RECENCY_INDEX_SORT_KEY, SK,
};
