//! Subscription type determining feature access.

use serde::{Deserialize, Serialize};

/// Product tier attached to a subscription record.
///
/// Only `Premium` is ever written by the reconciler; `Free` exists so that
/// rows provisioned elsewhere (e.g. a future default tier) deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    Free,
    Premium,
}

impl SubscriptionType {
    /// Database string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Free => "free",
            SubscriptionType::Premium => "premium",
        }
    }

    /// Parses the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionType::Free),
            "premium" => Some(SubscriptionType::Premium),
            _ => None,
        }
    }
}
