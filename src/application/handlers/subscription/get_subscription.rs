//! GetSubscriptionHandler - Query handler for a user's subscription record.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::SubscriptionRecord;
use crate::ports::SubscriptionStore;

/// Query for the authenticated user's subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: UserId,
}

/// Returns the subscription record the rest of the application derives the
/// premium predicate from. `None` means the user never completed a checkout.
pub struct GetSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
}

impl GetSubscriptionHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        self.store.find_by_user_id(&query.user_id).await
    }
}
