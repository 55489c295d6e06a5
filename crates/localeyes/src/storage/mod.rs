//! Storage backend implementations.
//!
//! This module provides concrete implementations of the `TableStore` trait
//! defined in `localeyes_core::storage`. The backend is picked at startup
//! from the configuration.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! The in-memory backend is always available.

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
pub use inmemory::InMemoryStore;
