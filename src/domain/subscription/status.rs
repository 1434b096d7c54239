//! Subscription status as reported by the billing provider.

use serde::{Deserialize, Serialize};

/// Current state of a user's subscription.
///
/// The billing provider is the source of truth: the reconciler overwrites
/// this field with whatever the latest delivered event says, so there is no
/// transition table to enforce here. A cancelled subscription becomes active
/// again the moment the provider reports it active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is paid up and current.
    Active,

    /// Subscription was cancelled or otherwise left the active state.
    Cancelled,

    /// Payment failed; the provider is retrying.
    ///
    /// Representable because the store schema names it, but never written by
    /// the reconciler (the dispatch table only produces Active or Cancelled).
    PastDue,
}

impl SubscriptionStatus {
    /// Database string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::PastDue => "past_due",
        }
    }

    /// Parses the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            "past_due" => Some(SubscriptionStatus::PastDue),
            _ => None,
        }
    }
}
