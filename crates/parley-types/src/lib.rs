//! Shared domain types for Parley.
//!
//! This crate contains the data shapes used across the Parley assistant:
//! chat messages, the per-user transcript and summary, configuration,
//! reference libraries, inbound messages, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod inbound;
pub mod library;
pub mod llm;
pub mod summary;
pub mod transcript;
