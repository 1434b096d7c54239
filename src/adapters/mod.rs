//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - sqlx-backed persistence
//! - `http` - Axum REST endpoints

pub mod http;
pub mod postgres;
