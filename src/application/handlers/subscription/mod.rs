//! Subscription command and query handlers.

mod get_subscription;
mod handle_billing_webhook;

pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery};
pub use handle_billing_webhook::{HandleBillingWebhookCommand, HandleBillingWebhookHandler};
