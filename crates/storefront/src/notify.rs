//! User-facing notifications and change events.
//!
//! The page shows a toast after every cart or wishlist action and refreshes
//! the cart badge whenever the cart changes. The store publishes both as
//! [`StoreEvent`]s.

use crowns_collars_core::ProductId;

use crate::error::{ErrorKind, StoreError};

/// Capacity of the store's event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The remote operation an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddToCart,
    RemoveFromCart,
    UpdateQuantity,
    AddToWishlist,
    RemoveFromWishlist,
}

impl Operation {
    /// Toast shown when the operation is confirmed.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::AddToCart => "Added to cart",
            Self::RemoveFromCart => "Removed from cart",
            Self::UpdateQuantity => "Quantity updated",
            Self::AddToWishlist => "Added to wishlist",
            Self::RemoveFromWishlist => "Removed from wishlist",
        }
    }

    /// Toast shown on failure when the service gave no message.
    #[must_use]
    pub const fn failure_fallback(self) -> &'static str {
        match self {
            Self::AddToCart => "Failed to add",
            Self::RemoveFromCart => "Error removing item",
            Self::UpdateQuantity => "Failed to update",
            Self::AddToWishlist | Self::RemoveFromWishlist => "Failed to update wishlist",
        }
    }

    /// Short name used in logs and breadcrumbs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddToCart => "add_to_cart",
            Self::RemoveFromCart => "remove_from_cart",
            Self::UpdateQuantity => "update_quantity",
            Self::AddToWishlist => "add_to_wishlist",
            Self::RemoveFromWishlist => "remove_from_wishlist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A toast message for the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    /// Confirmation toast for an operation.
    #[must_use]
    pub fn success(operation: Operation) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: operation.success_message().to_string(),
        }
    }

    /// Failure toast for an operation.
    ///
    /// Uses the service's message when it supplied one, otherwise the
    /// operation's fallback text.
    #[must_use]
    pub fn failure(operation: Operation, err: &StoreError) -> Self {
        let message = match err.kind() {
            ErrorKind::Unauthenticated => "Please log in",
            ErrorKind::InvalidQuantityTransition => "Item is not in your cart",
            ErrorKind::QuantityLimit => "You cannot add more of this item",
            ErrorKind::RemoteRejected => err
                .remote_message()
                .unwrap_or_else(|| operation.failure_fallback()),
            ErrorKind::TransportFailure | ErrorKind::MalformedResponse => {
                operation.failure_fallback()
            }
        };

        Self {
            level: NotificationLevel::Error,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Change published by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The cart changed; `item_count` is the new badge value.
    CartChanged { item_count: u32 },
    /// The wishlist changed; `count` is the number of saved products.
    WishlistChanged { count: usize },
    /// Outcome of a cart or wishlist action.
    Notified {
        operation: Operation,
        product_id: ProductId,
        notification: Notification,
    },
}
