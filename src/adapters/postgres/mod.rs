//! PostgreSQL adapters - database implementations for repository ports.

mod subscription_store;
mod webhook_event_repository;

pub use subscription_store::PostgresSubscriptionStore;
pub use webhook_event_repository::PostgresWebhookEventRepository;
