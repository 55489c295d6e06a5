//! Functional core for localeyes.
//!
//! Domain types, business rules, the single-table storage contract and the
//! response envelope. Nothing in this crate performs network I/O.

pub mod auth;
pub mod response;
pub mod social;
pub mod storage;
