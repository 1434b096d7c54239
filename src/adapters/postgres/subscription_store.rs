//! PostgreSQL implementation of SubscriptionStore.
//!
//! The unique constraint on `user_id` plus the atomic upsert is the sole
//! serialization mechanism for concurrent webhook deliveries touching the
//! same user; there is no in-process locking anywhere in the write path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, SubscriptionId, Timestamp, UserId,
};
use crate::domain::subscription::{
    StatusChange, SubscriptionRecord, SubscriptionStatus, SubscriptionType,
};
use crate::ports::SubscriptionStore;

/// PostgreSQL-backed subscription store.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    status: String,
    subscription_type: String,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;
        let subscription_type =
            SubscriptionType::parse(&row.subscription_type).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid subscription_type value: {}", row.subscription_type),
                )
            })?;

        Ok(SubscriptionRecord {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            status,
            subscription_type,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: row.end_date.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const COLUMNS: &str = "id, user_id, status, subscription_type, stripe_customer_id, \
                       stripe_subscription_id, start_date, end_date, created_at, updated_at";

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM user_subscriptions WHERE user_id = $1"
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM user_subscriptions WHERE stripe_customer_id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, DomainError> {
        // First-write wins for id, created_at and start_date; a customer id,
        // once set, is never cleared or replaced.
        let row: SubscriptionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO user_subscriptions (
                id, user_id, status, subscription_type, stripe_customer_id,
                stripe_subscription_id, start_date, end_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO UPDATE SET
                status = EXCLUDED.status,
                subscription_type = EXCLUDED.subscription_type,
                stripe_customer_id = COALESCE(user_subscriptions.stripe_customer_id, EXCLUDED.stripe_customer_id),
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                end_date = EXCLUDED.end_date,
                updated_at = EXCLUDED.updated_at
            RETURNING {COLUMNS}
            "#
        ))
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(record.status.as_str())
        .bind(record.subscription_type.as_str())
        .bind(&record.stripe_customer_id)
        .bind(&record.stripe_subscription_id)
        .bind(record.start_date.as_datetime())
        .bind(record.end_date.map(|ts| *ts.as_datetime()))
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to upsert subscription: {}", e),
            )
        })?;

        SubscriptionRecord::try_from(row)
    }

    async fn update(
        &self,
        user_id: &UserId,
        change: StatusChange,
    ) -> Result<SubscriptionRecord, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE user_subscriptions SET
                status = $2,
                subscription_type = $3,
                end_date = $4,
                updated_at = $5
            WHERE user_id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id.as_str())
        .bind(change.status.as_str())
        .bind(change.subscription_type.as_str())
        .bind(change.end_date.map(|ts| *ts.as_datetime()))
        .bind(change.updated_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription: {}", e),
            )
        })?;

        let row = row.ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("No subscription for user {}", user_id),
            )
        })?;

        SubscriptionRecord::try_from(row)
    }
}
