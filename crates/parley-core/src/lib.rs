//! Conversation engine for Parley.
//!
//! This crate owns the chat turn, per-user transcripts and summaries, the
//! command surface, and the storage and provider traits the
//! infrastructure layer implements. It depends only on `parley-types` --
//! never on `parley-infra` or any database/IO crate.

pub mod chat;
pub mod clock;
pub mod command;
pub mod context;
pub mod dispatch;
pub mod library;
pub mod llm;
pub mod sanitize;
pub mod settings;
pub mod storage;
pub mod summary;

#[cfg(test)]
mod testing;
