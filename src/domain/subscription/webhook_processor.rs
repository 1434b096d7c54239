//! Idempotent webhook processing.
//!
//! Coordination layer between verified billing events and the reconciler,
//! ensuring each provider event is applied at most once.
//!
//! ## Design
//!
//! 1. Check if the event id was already processed (idempotency)
//! 2. Dispatch to the reconciler
//! 3. Record the processing result (success, ignored, or failed)
//!
//! ## Race Condition Handling
//!
//! When multiple deliveries of the same event arrive simultaneously:
//! - First to save wins (database PRIMARY KEY constraint)
//! - Others get `AlreadyExists` and report `AlreadyProcessed`
//!
//! ## Retry Interaction
//!
//! Retryable failures (store outages) leave no processing record, so the
//! provider's redelivery runs the event again. Terminal failures (unknown
//! customer) are recorded, which ends the provider's retry loop on the next
//! delivery; the failure stays in the audit table for manual investigation.

use std::sync::Arc;

use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

use super::billing_event::BillingEvent;
use super::reconciler::{DispatchOutcome, SubscriptionReconciler};
use super::webhook_errors::WebhookError;

/// Processes webhook events with idempotency guarantees.
pub struct IdempotentWebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    reconciler: SubscriptionReconciler,
}

impl IdempotentWebhookProcessor {
    /// Creates a new processor with the given repository and reconciler.
    pub fn new(
        repository: Arc<dyn WebhookEventRepository>,
        reconciler: SubscriptionReconciler,
    ) -> Self {
        Self {
            repository,
            reconciler,
        }
    }

    /// Process a webhook event at most once.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - event was applied by this delivery
    /// - `Ok(WebhookResult::AlreadyProcessed)` - duplicate delivery, skipped
    /// - `Err(_)` - processing failed
    pub async fn process(&self, event: BillingEvent) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "skipping duplicate webhook delivery");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let result = self.reconciler.dispatch(&event).await;

        let payload = serde_json::to_value(&event)
            .map_err(|e| WebhookError::ParseError(format!("failed to serialize event: {}", e)))?;

        // No record for retryable failures: the provider's redelivery must
        // reprocess this event.
        if matches!(&result, Err(e) if e.is_retryable()) {
            return result.map(|_| WebhookResult::Processed);
        }

        let record = match &result {
            Ok(DispatchOutcome::Ignored) => WebhookEventRecord::ignored(
                &event.id,
                &event.event_type,
                "unhandled event kind",
                payload,
            ),
            Ok(_) => WebhookEventRecord::success(&event.id, &event.event_type, payload),
            Err(e) => {
                WebhookEventRecord::failed(&event.id, &event.event_type, e.to_string(), payload)
            }
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => result.map(|_| WebhookResult::Processed),
            SaveResult::AlreadyExists => {
                // Lost the race; another delivery already handled this event.
                Ok(WebhookResult::AlreadyProcessed)
            }
        }
    }
}
