//! Subscription store port.
//!
//! Contract for the durable table holding one subscription record per user.
//! The reconciler is the only writer; the rest of the application reads
//! through `find_by_user_id` to gate premium features.
//!
//! # Design
//!
//! - **One row per user**: unique constraint on `user_id`
//! - **Upsert as concurrency control**: concurrent writes to the same user
//!   are serialized by the store's atomic insert-or-update, not by any
//!   in-process lock
//! - **First-write wins**: `created_at` and `start_date` from an existing row
//!   survive every subsequent upsert

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::{StatusChange, SubscriptionRecord};

/// Port for subscription record persistence.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Find the record for a user.
    ///
    /// Returns `None` if the user has never completed a checkout.
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Find the record holding the given billing-provider customer reference.
    ///
    /// Fallback lookup for events whose metadata carries no user id.
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Insert or update the record, keyed on `user_id`.
    ///
    /// On conflict the existing row's `id`, `created_at`, `start_date`, and a
    /// non-null `stripe_customer_id` are preserved; all other fields are
    /// taken from `record`. Returns the stored row.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, DomainError>;

    /// Apply a partial lifecycle update to an existing record.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the user has no record
    /// - `DatabaseError` on persistence failure
    async fn update(
        &self,
        user_id: &UserId,
        change: StatusChange,
    ) -> Result<SubscriptionRecord, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SubscriptionStore) {}
    }
}
