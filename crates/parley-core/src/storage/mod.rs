//! Storage abstractions for Parley.
//!
//! Defines the key-value store trait that all per-user state goes through,
//! plus an in-memory implementation. The SQLite implementation lives in
//! parley-infra.

pub mod kv_store;
pub mod memory;
