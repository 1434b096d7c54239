//! Webhook error taxonomy.
//!
//! Every failure path during webhook handling maps to a variant here, with an
//! HTTP status the provider interprets as "do not retry" (4xx) or "retry"
//! (5xx), plus an explicit retryability flag for logging.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook verification and reconciliation.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or event payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from the webhook event.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// No subscription record links back to the event's customer reference.
    ///
    /// Terminal for the event: retries cannot resolve a missing linkage, so
    /// this is logged for manual investigation rather than marked retryable.
    #[error("No subscription found for customer {0}")]
    UnknownCustomer(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Subscription store operation failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    ///
    /// Only transient store failures may succeed on redelivery. An unknown
    /// customer is surfaced as a server error but is not expected to resolve
    /// through retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_))
    }

    /// Maps the error to the HTTP status returned to the provider.
    ///
    /// - 2xx: event acknowledged, no retry
    /// - 4xx: verification problem, no retry
    /// - 5xx: dispatch problem, provider redelivers
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingMetadata(_) => StatusCode::BAD_REQUEST,

            // Ignored events are acknowledged as success
            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::UnknownCustomer(_) | WebhookError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<crate::domain::foundation::DomainError> for WebhookError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        use crate::domain::foundation::ErrorCode;
        match err.code {
            // A vanished row during an update means the linkage is gone, which
            // is the same failure as an unresolved customer reference.
            ErrorCode::SubscriptionNotFound => WebhookError::UnknownCustomer(err.message),
            _ => WebhookError::Store(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, ErrorCode};

    // ══════════════════════════════════════════════════════════════
    // Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_displays_correctly() {
        assert_eq!(
            format!("{}", WebhookError::InvalidSignature),
            "Invalid signature"
        );
    }

    #[test]
    fn unknown_customer_displays_customer_reference() {
        let err = WebhookError::UnknownCustomer("cus_42".to_string());
        assert_eq!(format!("{}", err), "No subscription found for customer cus_42");
    }

    #[test]
    fn missing_metadata_displays_field_name() {
        let err = WebhookError::MissingMetadata("user_id");
        assert_eq!(format!("{}", err), "Missing metadata: user_id");
    }

    // ══════════════════════════════════════════════════════════════
    // Retryability Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn store_error_is_retryable() {
        assert!(WebhookError::Store("connection lost".to_string()).is_retryable());
    }

    #[test]
    fn unknown_customer_is_not_retryable() {
        assert!(!WebhookError::UnknownCustomer("cus_1".to_string()).is_retryable());
    }

    #[test]
    fn verification_failures_are_not_retryable() {
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert!(!WebhookError::TimestampOutOfRange.is_retryable());
        assert!(!WebhookError::ParseError("bad json".to_string()).is_retryable());
        assert!(!WebhookError::MissingMetadata("user_id").is_retryable());
    }

    #[test]
    fn ignored_is_not_retryable() {
        assert!(!WebhookError::Ignored("unhandled".to_string()).is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verification_failures_return_bad_request() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidTimestamp.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::ParseError("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MissingMetadata("user_id").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn ignored_returns_ok() {
        // Ignored events are acknowledged so the provider stops redelivering
        assert_eq!(
            WebhookError::Ignored("unhandled".to_string()).status_code(),
            StatusCode::OK
        );
    }

    #[test]
    fn dispatch_failures_return_internal_error() {
        assert_eq!(
            WebhookError::UnknownCustomer("cus_1".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::Store("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Conversion Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn not_found_domain_error_becomes_unknown_customer() {
        let err: WebhookError =
            DomainError::new(ErrorCode::SubscriptionNotFound, "no row for user u1").into();
        assert!(matches!(err, WebhookError::UnknownCustomer(_)));
    }

    #[test]
    fn database_domain_error_becomes_store_error() {
        let err: WebhookError =
            DomainError::new(ErrorCode::DatabaseError, "connection refused").into();
        assert!(matches!(err, WebhookError::Store(_)));
    }
}
