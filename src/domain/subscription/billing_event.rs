//! Billing provider webhook event types.
//!
//! Structures for parsing the provider's webhook payloads. Only fields the
//! reconciler acts on are captured; the rest of the event schema is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Webhook event envelope as delivered by the billing provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: BillingEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl BillingEvent {
    /// Parse the event type into a known enum variant.
    pub fn kind(&self) -> BillingEventKind {
        BillingEventKind::parse(&self.event_type)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Event kinds the reconciler handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEventKind {
    /// Checkout session completed successfully; first activation path.
    CheckoutSessionCompleted,
    /// Subscription lifecycle change.
    SubscriptionUpdated,
    /// Subscription removed at the provider.
    SubscriptionDeleted,
    /// Anything else; acknowledged without a store call.
    Unknown,
}

impl BillingEventKind {
    /// Parse event kind from the provider's type string.
    pub fn parse(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unknown,
        }
    }
}

/// Checkout session object carried by `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    /// Session identifier (cs_xxx).
    pub id: String,

    /// Customer created or attached during checkout.
    pub customer: Option<String>,

    /// Subscription created by the checkout, if any.
    pub subscription: Option<String>,

    /// Custom metadata attached when the session was created; the application
    /// puts the user's identity-provider id here.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// The user id the application attached at session creation.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

/// Subscription object carried by `customer.subscription.updated/deleted`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    /// Subscription identifier (sub_xxx).
    pub id: String,

    /// Owning customer (cus_xxx).
    pub customer: String,

    /// Provider lifecycle status ("active", "canceled", "past_due", ...).
    pub status: String,

    /// Custom metadata; may carry the user id.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SubscriptionObject {
    /// The user id from subscription metadata, when present.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

/// Builder for creating test BillingEvent instances.
#[cfg(test)]
pub struct BillingEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for BillingEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: 1_704_067_200,
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl BillingEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> BillingEvent {
        BillingEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: BillingEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
