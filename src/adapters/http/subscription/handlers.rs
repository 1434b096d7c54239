//! HTTP handlers for subscription endpoints.
//!
//! Connects Axum routes to the application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::subscription::{
    GetSubscriptionHandler, GetSubscriptionQuery, HandleBillingWebhookCommand,
    HandleBillingWebhookHandler,
};
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::{
    BillingWebhookVerifier, IdempotentWebhookProcessor, SubscriptionReconciler, WebhookError,
};
use crate::ports::{SubscriptionStore, WebhookEventRepository};

use super::dto::{ErrorResponse, SubscriptionResponse, SubscriptionViewResponse, WebhookAckResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped and constructed once at
/// process startup.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub subscription_store: Arc<dyn SubscriptionStore>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub verifier: Arc<BillingWebhookVerifier>,
}

impl SubscriptionAppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> HandleBillingWebhookHandler {
        let processor = IdempotentWebhookProcessor::new(
            self.webhook_events.clone(),
            SubscriptionReconciler::new(self.subscription_store.clone()),
        );
        HandleBillingWebhookHandler::new(self.verifier.clone(), Arc::new(processor))
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscription_store.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the request.
///
/// Session handling belongs to the identity provider; for development and
/// testing the user id is taken from an X-User-Id header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscription - Current user's subscription record.
pub async fn get_subscription(
    State(state): State<SubscriptionAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.get_subscription_handler();
    let result = handler
        .handle(GetSubscriptionQuery {
            user_id: user.user_id,
        })
        .await?;

    let response = SubscriptionResponse {
        subscription: result.map(SubscriptionViewResponse::from),
    };

    Ok(Json(response))
}

/// POST /api/webhooks/stripe - Billing provider webhook events.
///
/// The body must reach the verifier byte-for-byte as delivered, so it is
/// extracted as raw bytes rather than JSON.
pub async fn handle_billing_webhook(
    State(state): State<SubscriptionAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            SubscriptionApiError::Webhook(WebhookError::ParseError(
                "missing Stripe-Signature header".to_string(),
            ))
        })?;

    let handler = state.webhook_handler();
    handler
        .handle(HandleBillingWebhookCommand {
            payload: body.to_vec(),
            signature: signature.to_string(),
        })
        .await?;

    Ok((StatusCode::OK, Json(WebhookAckResponse { received: true })))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type converting domain failures to HTTP responses.
///
/// The webhook status contract matters to the provider's retry loop:
/// 400 means "do not retry" (verification problem), 500 means "redeliver".
pub enum SubscriptionApiError {
    Webhook(WebhookError),
    Domain(DomainError),
}

impl From<WebhookError> for SubscriptionApiError {
    fn from(err: WebhookError) -> Self {
        Self::Webhook(err)
    }
}

impl From<DomainError> for SubscriptionApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SubscriptionApiError::Webhook(err) => {
                let code = match &err {
                    WebhookError::InvalidSignature => "INVALID_SIGNATURE",
                    WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => {
                        "INVALID_TIMESTAMP"
                    }
                    WebhookError::ParseError(_) => "PARSE_ERROR",
                    WebhookError::MissingMetadata(_) => "MISSING_METADATA",
                    WebhookError::UnknownCustomer(_) => "UNKNOWN_CUSTOMER",
                    WebhookError::Ignored(_) => "IGNORED",
                    WebhookError::Store(_) => "STORE_ERROR",
                };
                let body = ErrorResponse::new(code, err.to_string());
                (err.status_code(), Json(body)).into_response()
            }
            SubscriptionApiError::Domain(err) => {
                let body = ErrorResponse::new(err.code.to_string(), err.message.clone());
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
