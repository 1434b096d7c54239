//! HTTP adapter for the subscription module.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::SubscriptionAppState;
pub use routes::subscription_router;
