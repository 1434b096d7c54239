//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionStore` - one authoritative subscription row per user
//! - `WebhookEventRepository` - billing webhook idempotency tracking

mod subscription_store;
mod webhook_event_repository;

pub use subscription_store::SubscriptionStore;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
