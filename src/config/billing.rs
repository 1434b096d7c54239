//! Billing configuration (Stripe)

use serde::Deserialize;

use super::error::ValidationError;

/// Billing provider configuration.
///
/// Only the webhook signing secret is needed: this service consumes events,
/// it never calls the billing API outbound.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingConfig {
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
}

impl BillingConfig {
    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        Ok(())
    }
}
