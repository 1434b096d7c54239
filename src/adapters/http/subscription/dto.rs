//! HTTP DTOs for subscription endpoints.
//!
//! JSON request/response shapes forming the boundary between HTTP and the
//! application layer.

use serde::Serialize;

use crate::domain::subscription::{SubscriptionRecord, SubscriptionStatus, SubscriptionType};

/// Response for the subscription read endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    /// The subscription record, or null if the user never subscribed.
    pub subscription: Option<SubscriptionViewResponse>,
}

/// Subscription record view for API responses.
///
/// Consumers derive the premium predicate from these fields; it is not
/// stored or returned as a field of its own.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionViewResponse {
    pub id: String,
    pub user_id: String,
    pub status: SubscriptionStatus,
    pub subscription_type: SubscriptionType,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    /// ISO 8601.
    pub start_date: String,
    /// ISO 8601, null while the subscription is open-ended.
    pub end_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SubscriptionRecord> for SubscriptionViewResponse {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            user_id: record.user_id.to_string(),
            status: record.status,
            subscription_type: record.subscription_type,
            stripe_customer_id: record.stripe_customer_id,
            stripe_subscription_id: record.stripe_subscription_id,
            start_date: record.start_date.as_datetime().to_rfc3339(),
            end_date: record.end_date.map(|ts| ts.as_datetime().to_rfc3339()),
            created_at: record.created_at.as_datetime().to_rfc3339(),
            updated_at: record.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Acknowledgement body returned to the billing provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
