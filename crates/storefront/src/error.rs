//! Store error type with Sentry integration.
//!
//! Every cart and wishlist operation returns `Result<T, StoreError>`. Errors
//! are never fatal: the store turns each one into a user-visible
//! notification and leaves local state untouched.

use crowns_collars_core::{ProductId, QuantityChange};
use thiserror::Error;

use crate::remote::RemoteError;

/// Error returned by cart and wishlist operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No session credential; nothing was sent.
    #[error("Not signed in")]
    Unauthenticated,

    /// A quantity change was requested for a product that is not in the cart.
    #[error("Cannot {change} product {product_id}: not in cart")]
    InvalidQuantityTransition {
        product_id: ProductId,
        change: QuantityChange,
    },

    /// An increment was requested for a line already at the largest
    /// representable quantity.
    #[error("Cannot increment product {product_id}: quantity limit reached")]
    QuantityLimit { product_id: ProductId },

    /// Remote cart service call failed.
    #[error("Cart service error: {0}")]
    Remote(#[from] RemoteError),
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    /// The service answered and reported failure.
    RemoteRejected,
    /// No envelope was obtained (network, timeout, bad status).
    TransportFailure,
    /// An envelope was obtained but failed validation.
    MalformedResponse,
    InvalidQuantityTransition,
    QuantityLimit,
}

impl StoreError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::InvalidQuantityTransition { .. } => ErrorKind::InvalidQuantityTransition,
            Self::QuantityLimit { .. } => ErrorKind::QuantityLimit,
            Self::Remote(RemoteError::Rejected { .. }) => ErrorKind::RemoteRejected,
            Self::Remote(RemoteError::Malformed(_)) => ErrorKind::MalformedResponse,
            Self::Remote(
                RemoteError::Transport(_)
                | RemoteError::Timeout(_)
                | RemoteError::UnexpectedStatus(_)
                | RemoteError::RateLimited(_),
            ) => ErrorKind::TransportFailure,
        }
    }

    /// Message the service supplied for a rejected request.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Remote(err) => err.remote_message(),
            _ => None,
        }
    }

    /// Whether this error indicates a fault worth reporting to Sentry.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransportFailure | ErrorKind::MalformedResponse
        )
    }
}

/// Capture a store error to Sentry and log it.
///
/// User-caused errors (not signed in, rejected by the service) are logged at
/// `warn` only.
pub fn report_error(operation: &str, product_id: ProductId, err: &StoreError) {
    if err.is_reportable() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            operation,
            %product_id,
            error = %err,
            sentry_event_id = %event_id,
            "Cart operation failed"
        );
    } else {
        tracing::warn!(operation, %product_id, error = %err, "Cart operation not applied");
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// wishlist actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Add to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::InvalidQuantityTransition {
            product_id: ProductId::new(9),
            change: QuantityChange::Decrement,
        };
        assert_eq!(err.to_string(), "Cannot decrement product 9: not in cart");

        let err = StoreError::from(RemoteError::UnexpectedStatus(503));
        assert_eq!(
            err.to_string(),
            "Cart service error: Unexpected HTTP status 503"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(StoreError::Unauthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(
            StoreError::QuantityLimit {
                product_id: ProductId::new(1)
            }
            .kind(),
            ErrorKind::QuantityLimit
        );
        assert_eq!(
            StoreError::from(RemoteError::Rejected { message: None }).kind(),
            ErrorKind::RemoteRejected
        );
        assert_eq!(
            StoreError::from(RemoteError::Timeout(Duration::from_secs(1))).kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(
            StoreError::from(RemoteError::Transport("reset".to_string())).kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(
            StoreError::from(RemoteError::Malformed("bad".to_string())).kind(),
            ErrorKind::MalformedResponse
        );
    }

    #[test]
    fn test_reportable() {
        assert!(!StoreError::Unauthenticated.is_reportable());
        assert!(!StoreError::from(RemoteError::Rejected { message: None }).is_reportable());
        assert!(StoreError::from(RemoteError::RateLimited(5)).is_reportable());
        assert!(StoreError::from(RemoteError::Malformed("bad".to_string())).is_reportable());
    }

    #[test]
    fn test_remote_message_passthrough() {
        let err = StoreError::from(RemoteError::Rejected {
            message: Some("Product unavailable".to_string()),
        });
        assert_eq!(err.remote_message(), Some("Product unavailable"));
        assert_eq!(StoreError::Unauthenticated.remote_message(), None);
    }
}
