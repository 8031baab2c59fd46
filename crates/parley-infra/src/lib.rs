//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`: the
//! SQLite key-value store, the OpenAI-compatible HTTP completion provider,
//! and the configuration file loader.

pub mod config;
pub mod llm;
pub mod sqlite;
