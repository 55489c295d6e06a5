//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of `TableStore`
//! using `aws-sdk-dynamodb`.

mod conversions;
mod error;
mod expression;
mod store;

pub use store::DynamoDbStore;
