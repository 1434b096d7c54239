//! HandleBillingWebhookHandler - Command handler for billing provider webhooks.

use std::sync::Arc;

use crate::domain::subscription::{
    BillingWebhookVerifier, IdempotentWebhookProcessor, WebhookError,
};
use crate::ports::WebhookResult;

/// Command to handle a billing webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleBillingWebhookCommand {
    /// Raw webhook payload bytes, exactly as received.
    pub payload: Vec<u8>,
    /// Webhook signature header.
    pub signature: String,
}

/// Handler for inbound billing webhooks.
///
/// Verifies the signature over the raw payload, then hands the parsed event
/// to the idempotent processor. Both collaborators are injected at
/// construction and live for the process.
pub struct HandleBillingWebhookHandler {
    verifier: Arc<BillingWebhookVerifier>,
    processor: Arc<IdempotentWebhookProcessor>,
}

impl HandleBillingWebhookHandler {
    pub fn new(
        verifier: Arc<BillingWebhookVerifier>,
        processor: Arc<IdempotentWebhookProcessor>,
    ) -> Self {
        Self {
            verifier,
            processor,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleBillingWebhookCommand,
    ) -> Result<WebhookResult, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, &cmd.signature)?;

        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "webhook signature verified"
        );

        let result = self.processor.process(event).await;

        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                retryable = e.is_retryable(),
                "webhook dispatch failed"
            );
        }

        result
    }
}
