//! Subscription reconciler.
//!
//! Translates billing-provider lifecycle events into deterministic,
//! idempotent updates to the subscription store. Invoked once per verified
//! webhook delivery; carries no state between invocations, and delegates all
//! retry behavior to the provider's redelivery mechanism.
//!
//! ## Ordering
//!
//! Events are applied in delivery order. The stored `updated_at` is never
//! compared against the event's `created` timestamp, so a stale "active"
//! arriving after a newer "cancelled" will reactivate the record.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::SubscriptionStore;

use super::billing_event::{
    BillingEvent, BillingEventKind, CheckoutSessionObject, SubscriptionObject,
};
use super::record::{StatusChange, SubscriptionRecord};
use super::status::SubscriptionStatus;
use super::webhook_errors::WebhookError;

/// Result of dispatching a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Checkout completed; record upserted as active premium.
    Activated { user_id: UserId },
    /// Lifecycle event applied to an existing record.
    StatusChanged {
        user_id: UserId,
        status: SubscriptionStatus,
    },
    /// Event kind is not handled; acknowledged without a store call.
    Ignored,
}

/// Applies billing events to the subscription store.
///
/// Dependencies are injected at construction; the hosting process owns their
/// lifecycle.
pub struct SubscriptionReconciler {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionReconciler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Dispatch a verified event to its handler.
    ///
    /// Exactly one store upsert or update happens per successfully dispatched
    /// event; unrecognized kinds produce no store call at all.
    pub async fn dispatch(&self, event: &BillingEvent) -> Result<DispatchOutcome, WebhookError> {
        match event.kind() {
            BillingEventKind::CheckoutSessionCompleted => {
                self.handle_checkout_completed(event).await
            }
            BillingEventKind::SubscriptionUpdated | BillingEventKind::SubscriptionDeleted => {
                self.handle_subscription_change(event).await
            }
            BillingEventKind::Unknown => {
                tracing::debug!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "ignoring unhandled event kind"
                );
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    /// First (or repeated) activation: upsert the premium record.
    ///
    /// The upsert is keyed on `user_id`, so a redelivered checkout event can
    /// neither create a second row nor reset `start_date`/`created_at`.
    async fn handle_checkout_completed(
        &self,
        event: &BillingEvent,
    ) -> Result<DispatchOutcome, WebhookError> {
        let session: CheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let user_id = session
            .user_id()
            .and_then(|raw| UserId::new(raw).ok())
            .ok_or(WebhookError::MissingMetadata("user_id"))?;

        let record = SubscriptionRecord::premium_activation(
            user_id.clone(),
            session.customer.clone(),
            session.subscription.clone(),
            Timestamp::now(),
        );

        let stored = self.store.upsert(record).await?;

        tracing::info!(
            event_id = %event.id,
            user_id = %stored.user_id,
            customer_id = stored.stripe_customer_id.as_deref().unwrap_or(""),
            "premium subscription activated"
        );

        Ok(DispatchOutcome::Activated {
            user_id: stored.user_id,
        })
    }

    /// Lifecycle change: resolve the user, then apply the provider status.
    async fn handle_subscription_change(
        &self,
        event: &BillingEvent,
    ) -> Result<DispatchOutcome, WebhookError> {
        let subscription: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let user_id = self.resolve_user(&subscription).await?;

        let change = StatusChange::from_provider_status(&subscription.status, Timestamp::now());
        let status = change.status;

        self.store.update(&user_id, change).await?;

        tracing::info!(
            event_id = %event.id,
            user_id = %user_id,
            provider_status = %subscription.status,
            status = status.as_str(),
            "subscription status reconciled"
        );

        Ok(DispatchOutcome::StatusChanged { user_id, status })
    }

    /// Resolve the affected user: explicit metadata first, then lookup by the
    /// event's customer reference.
    ///
    /// Failing both means the event has no linkage back to an identity, and
    /// applying it would create an orphan record; the event is rejected
    /// instead.
    async fn resolve_user(
        &self,
        subscription: &SubscriptionObject,
    ) -> Result<UserId, WebhookError> {
        if let Some(raw) = subscription.user_id() {
            return UserId::new(raw).map_err(|_| WebhookError::MissingMetadata("user_id"));
        }

        match self
            .store
            .find_by_customer_id(&subscription.customer)
            .await?
        {
            Some(record) => Ok(record.user_id),
            None => Err(WebhookError::UnknownCustomer(subscription.customer.clone())),
        }
    }
}
