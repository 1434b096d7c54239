//! Subscription domain module.
//!
//! Handles billing webhook verification and the reconciliation of provider
//! lifecycle events into the per-user subscription record.
//!
//! # Module Structure
//!
//! - `record` - SubscriptionRecord aggregate and premium predicate
//! - `status` / `subscription_type` - record enums
//! - `billing_event` - provider event envelope and object views
//! - `webhook_verifier` - HMAC signature verification
//! - `webhook_errors` - error taxonomy with HTTP mapping
//! - `reconciler` - event dispatch and state transitions
//! - `webhook_processor` - event-id idempotency wrapper

mod billing_event;
mod reconciler;
mod record;
mod status;
mod subscription_type;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use billing_event::{
    BillingEvent, BillingEventData, BillingEventKind, CheckoutSessionObject, SubscriptionObject,
};
pub use reconciler::{DispatchOutcome, SubscriptionReconciler};
pub use record::{StatusChange, SubscriptionRecord};
pub use status::SubscriptionStatus;
pub use subscription_type::SubscriptionType;
pub use webhook_errors::WebhookError;
pub use webhook_processor::IdempotentWebhookProcessor;
pub use webhook_verifier::{BillingWebhookVerifier, SignatureHeader};

#[cfg(test)]
pub use billing_event::BillingEventBuilder;
