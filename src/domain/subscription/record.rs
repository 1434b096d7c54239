//! Subscription record aggregate.
//!
//! One row per user, owned by the Subscription Store and mutated only by the
//! reconciler. The rest of the application reads it to gate premium features.
//!
//! # Invariants
//!
//! - `user_id` is unique (enforced by the store's conflict key) and immutable
//! - `stripe_customer_id` is set once and never cleared
//! - `start_date` and `created_at` survive every subsequent upsert
//! - cancellation is a status transition, never a row removal

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};

use super::{SubscriptionStatus, SubscriptionType};

/// A user's authoritative subscription state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Row identity.
    pub id: SubscriptionId,

    /// Owning user; unique key for all upserts.
    pub user_id: UserId,

    /// Latest provider-reported lifecycle state.
    pub status: SubscriptionStatus,

    /// Product tier.
    pub subscription_type: SubscriptionType,

    /// Billing-provider customer reference, used for event lookup fallback.
    pub stripe_customer_id: Option<String>,

    /// Billing-provider subscription reference, set on activation.
    pub stripe_subscription_id: Option<String>,

    /// First activation time; never overwritten afterwards.
    pub start_date: Timestamp,

    /// None while active; set to the event time when the subscription leaves
    /// the active state.
    pub end_date: Option<Timestamp>,

    /// Row creation time, first-write wins across upserts.
    pub created_at: Timestamp,

    /// Refreshed on every write.
    pub updated_at: Timestamp,
}

impl SubscriptionRecord {
    /// Builds the row a successful checkout completion writes.
    ///
    /// When a row already exists for the user, the store's upsert keeps the
    /// existing `start_date` and `created_at` and ignores the values set here.
    pub fn premium_activation(
        user_id: UserId,
        stripe_customer_id: Option<String>,
        stripe_subscription_id: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            status: SubscriptionStatus::Active,
            subscription_type: SubscriptionType::Premium,
            stripe_customer_id,
            stripe_subscription_id,
            start_date: now,
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived premium predicate, evaluated by consumers and never stored.
    ///
    /// A user is premium iff the subscription is active, the type is premium,
    /// and the end date (if any) is still in the future.
    pub fn is_premium_at(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active
            && self.subscription_type == SubscriptionType::Premium
            && self.end_date.map_or(true, |end| end.is_after(&now))
    }

    /// Convenience form of [`is_premium_at`](Self::is_premium_at) against the
    /// current clock.
    pub fn is_premium(&self) -> bool {
        self.is_premium_at(Timestamp::now())
    }
}

/// Partial update applied to an existing record on lifecycle events.
///
/// Mirrors the store's `update(user_id, partial_fields)` operation: only the
/// fields a subscription-updated/deleted event may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: SubscriptionStatus,
    pub subscription_type: SubscriptionType,
    /// None clears the end date (back to active), Some sets it.
    pub end_date: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl StatusChange {
    /// Change derived from a provider status string: "active" keeps the row
    /// active with no end date, anything else cancels it at `now`.
    pub fn from_provider_status(provider_status: &str, now: Timestamp) -> Self {
        let active = provider_status == "active";
        Self {
            status: if active {
                SubscriptionStatus::Active
            } else {
                SubscriptionStatus::Cancelled
            },
            subscription_type: SubscriptionType::Premium,
            end_date: if active { None } else { Some(now) },
            updated_at: now,
        }
    }
}
