//! Per-user conversation transcripts: prompt shapes, legacy migration, and
//! the store that loads, trims, and persists them.

pub mod migration;
pub mod prompt;
pub mod store;
