//! End-to-end webhook reconciliation tests.
//!
//! Drives the full flow over in-memory ports: signature verification,
//! event-id idempotency, dispatch, and the subscription store's upsert
//! semantics. Mirrors the provider's at-least-once delivery behavior:
//! redelivered events, customer-id fallback resolution, and unlinked
//! customers.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use collectdex::application::handlers::subscription::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler,
};
use collectdex::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use collectdex::domain::subscription::{
    BillingWebhookVerifier, IdempotentWebhookProcessor, StatusChange, SubscriptionReconciler,
    SubscriptionRecord, SubscriptionStatus, SubscriptionType, WebhookError,
};
use collectdex::ports::{
    SaveResult, SubscriptionStore, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};

const SECRET: &str = "whsec_integration_secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory store with the same upsert/update semantics as the Postgres
/// adapter: first-write wins for id/created_at/start_date, customer id is
/// never cleared once set.
struct TestStore {
    records: Mutex<Vec<SubscriptionRecord>>,
}

impl TestStore {
    fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    fn records(&self) -> Vec<SubscriptionRecord> {
        self.records.lock().unwrap().clone()
    }

    fn record_for(&self, user: &str) -> Option<SubscriptionRecord> {
        self.records()
            .into_iter()
            .find(|r| r.user_id.as_str() == user)
    }
}

#[async_trait]
impl SubscriptionStore for TestStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.user_id == user_id)
            .cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, DomainError> {
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.iter_mut().find(|r| r.user_id == record.user_id) {
            let merged = SubscriptionRecord {
                id: existing.id,
                created_at: existing.created_at,
                start_date: existing.start_date,
                stripe_customer_id: existing
                    .stripe_customer_id
                    .clone()
                    .or(record.stripe_customer_id),
                ..record
            };
            *existing = merged.clone();
            Ok(merged)
        } else {
            records.push(record.clone());
            Ok(record)
        }
    }

    async fn update(
        &self,
        user_id: &UserId,
        change: StatusChange,
    ) -> Result<SubscriptionRecord, DomainError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| &r.user_id == user_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    format!("no subscription for user {}", user_id),
                )
            })?;
        record.status = change.status;
        record.subscription_type = change.subscription_type;
        record.end_date = change.end_date;
        record.updated_at = change.updated_at;
        Ok(record.clone())
    }
}

struct TestEventRepository {
    records: Mutex<HashMap<String, WebhookEventRecord>>,
}

impl TestEventRepository {
    fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl WebhookEventRepository for TestEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.lock().unwrap().get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.event_id) {
            Ok(SaveResult::AlreadyExists)
        } else {
            records.insert(record.event_id.clone(), record);
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(
        &self,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, DomainError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, r| r.processed_at >= timestamp);
        Ok((before - records.len()) as u64)
    }
}

fn handler(store: Arc<TestStore>) -> HandleBillingWebhookHandler {
    let processor = IdempotentWebhookProcessor::new(
        Arc::new(TestEventRepository::new()),
        SubscriptionReconciler::new(store),
    );
    HandleBillingWebhookHandler::new(
        Arc::new(BillingWebhookVerifier::new(SECRET)),
        Arc::new(processor),
    )
}

fn sign(payload: &[u8]) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

fn signed_command(payload: Vec<u8>) -> HandleBillingWebhookCommand {
    HandleBillingWebhookCommand {
        signature: sign(&payload),
        payload,
    }
}

fn checkout_payload(event_id: &str, user_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "cs_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": {"user_id": user_id}
            }
        },
        "livemode": false,
        "api_version": "2023-10-16"
    }))
    .unwrap()
}

fn subscription_payload(event_id: &str, event_type: &str, customer: &str, status: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "sub_1",
                "customer": customer,
                "status": status
            }
        },
        "livemode": false,
        "api_version": "2023-10-16"
    }))
    .unwrap()
}

// =============================================================================
// Lifecycle Scenario
// =============================================================================

#[tokio::test]
async fn checkout_then_cancellation_via_customer_lookup() {
    let store = Arc::new(TestStore::new());
    let h = handler(store.clone());

    // T0: checkout completes for u1
    let before_checkout = Timestamp::now();
    let result = h
        .handle(signed_command(checkout_payload("evt_1", "u1")))
        .await
        .unwrap();
    assert_eq!(result, WebhookResult::Processed);

    let record = store.record_for("u1").expect("record created");
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(record.subscription_type, SubscriptionType::Premium);
    assert_eq!(record.stripe_customer_id.as_deref(), Some("cus_1"));
    assert_eq!(record.stripe_subscription_id.as_deref(), Some("sub_1"));
    assert!(record.end_date.is_none());
    assert!(!record.start_date.is_before(&before_checkout));
    let start_date = record.start_date;

    // T1: provider deletes the subscription; no user id in metadata, so the
    // reconciler resolves u1 through cus_1
    let result = h
        .handle(signed_command(subscription_payload(
            "evt_2",
            "customer.subscription.deleted",
            "cus_1",
            "canceled",
        )))
        .await
        .unwrap();
    assert_eq!(result, WebhookResult::Processed);

    let record = store.record_for("u1").unwrap();
    assert_eq!(record.status, SubscriptionStatus::Cancelled);
    assert!(record.end_date.is_some());
    assert_eq!(record.start_date, start_date);
    assert!(!record.is_premium());
}

#[tokio::test]
async fn redelivered_checkout_is_skipped_and_state_is_unchanged() {
    let store = Arc::new(TestStore::new());
    let h = handler(store.clone());

    h.handle(signed_command(checkout_payload("evt_dup", "u1")))
        .await
        .unwrap();
    let first = store.record_for("u1").unwrap();

    // Same provider event id delivered again
    let result = h
        .handle(signed_command(checkout_payload("evt_dup", "u1")))
        .await
        .unwrap();

    assert_eq!(result, WebhookResult::AlreadyProcessed);
    assert_eq!(store.records().len(), 1);
    let second = store.record_for("u1").unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.start_date, first.start_date);
}

#[tokio::test]
async fn second_checkout_event_does_not_reset_dates() {
    let store = Arc::new(TestStore::new());
    let h = handler(store.clone());

    h.handle(signed_command(checkout_payload("evt_a", "u1")))
        .await
        .unwrap();
    let first = store.record_for("u1").unwrap();

    // Distinct event id for the same user: upsert keyed on user_id applies,
    // but created_at and start_date are first-write-wins
    h.handle(signed_command(checkout_payload("evt_b", "u1")))
        .await
        .unwrap();

    assert_eq!(store.records().len(), 1);
    let second = store.record_for("u1").unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.start_date, first.start_date);
    assert_eq!(second.status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn reactivation_clears_end_date() {
    let store = Arc::new(TestStore::new());
    let h = handler(store.clone());

    h.handle(signed_command(checkout_payload("evt_1", "u1")))
        .await
        .unwrap();
    h.handle(signed_command(subscription_payload(
        "evt_2",
        "customer.subscription.updated",
        "cus_1",
        "past_due",
    )))
    .await
    .unwrap();
    assert_eq!(
        store.record_for("u1").unwrap().status,
        SubscriptionStatus::Cancelled
    );

    h.handle(signed_command(subscription_payload(
        "evt_3",
        "customer.subscription.updated",
        "cus_1",
        "active",
    )))
    .await
    .unwrap();

    let record = store.record_for("u1").unwrap();
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert!(record.end_date.is_none());
    assert!(record.is_premium());
}

// =============================================================================
// Failure Paths
// =============================================================================

#[tokio::test]
async fn unlinked_customer_rejects_event_and_touches_nothing() {
    let store = Arc::new(TestStore::new());
    let h = handler(store.clone());

    let result = h
        .handle(signed_command(subscription_payload(
            "evt_orphan",
            "customer.subscription.deleted",
            "cus_nobody",
            "canceled",
        )))
        .await;

    assert!(matches!(result, Err(WebhookError::UnknownCustomer(_))));
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn tampered_payload_is_rejected_before_dispatch() {
    let store = Arc::new(TestStore::new());
    let h = handler(store.clone());

    let payload = checkout_payload("evt_tamper", "u1");
    let signature = sign(&payload);

    let mut tampered = payload;
    tampered[10] ^= 0xff;

    let result = h
        .handle(HandleBillingWebhookCommand {
            payload: tampered,
            signature,
        })
        .await;

    assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn unhandled_event_kind_is_acknowledged_without_writes() {
    let store = Arc::new(TestStore::new());
    let h = handler(store.clone());

    let payload = serde_json::to_vec(&json!({
        "id": "evt_noise",
        "type": "invoice.payment_succeeded",
        "created": chrono::Utc::now().timestamp(),
        "data": {"object": {"id": "in_1", "amount_paid": 999}},
        "livemode": false,
        "api_version": "2023-10-16"
    }))
    .unwrap();

    let result = h.handle(signed_command(payload)).await.unwrap();

    assert_eq!(result, WebhookResult::Processed);
    assert!(store.records().is_empty());
}
