//! In-memory storage backend.
//!
//! Stores every item in a `BTreeMap` wrapped in `Arc<RwLock<_>>`. Used by
//! the test suite and for local runs where persistence is not required.
//!
//! # Example
//!
//! ```rust,ignore
//! use localeyes::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! // Use store for testing...
//! ```

mod store;

pub use store::InMemoryStore;
