//! HTTP/REST API layer for Parley.
//!
//! Axum-based REST API at `/api/v1/` with an envelope response format and
//! CORS support. Chat platform bridges post inbound messages here and
//! relay whatever reply comes back.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
