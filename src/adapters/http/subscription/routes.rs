//! Axum router configuration for subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_subscription, handle_billing_webhook, SubscriptionAppState};

/// Create the subscription API router.
///
/// # Routes
/// - `GET /` - Current user's subscription record (requires authentication)
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new().route("/", get(get_subscription))
}

/// Create the billing webhook router.
///
/// Separate from the subscription routes because webhooks carry no user
/// session; they authenticate via the payload signature.
///
/// # Routes
/// - `POST /stripe` - Billing provider webhooks
pub fn webhook_routes() -> Router<SubscriptionAppState> {
    Router::new().route("/stripe", post(handle_billing_webhook))
}

/// Create the complete subscription module router, suitable for mounting at
/// `/api`.
pub fn subscription_router() -> Router<SubscriptionAppState> {
    Router::new()
        .nest("/subscription", subscription_routes())
        .nest("/webhooks", webhook_routes())
}
