//! Cart and wishlist state reconciliation.
//!
//! [`CartWishlistStore`] keeps the page's local copy of the cart and wishlist
//! in step with the remote cart service:
//!
//! - local state changes only after the remote confirms success, and then by
//!   exactly the change the remote applied (no re-fetch after mutations)
//! - failed calls leave local state untouched
//! - mutations for the same product run one at a time, in call order
//! - every remote call is bounded by the configured timeout
//!
//! The store is cheaply cloneable; clones share state.

mod slots;

pub use slots::{SlotGuard, SlotKey, SlotTable};

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crowns_collars_core::{
    BearerToken, Cart, CartLine, Product, ProductId, Quantity, QuantityChange, QuantityError,
    Wishlist, WishlistEntry,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument};

use crate::error::{StoreError, add_breadcrumb, report_error};
use crate::notify::{EVENT_CHANNEL_CAPACITY, Notification, Operation, StoreEvent};
use crate::remote::{RemoteCartService, RemoteError, WishlistAction};
use crate::views::{CartSummary, ProductCardView};

/// Outcome of loading one collection.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// No credential; nothing fetched.
    Skipped,
    /// Snapshot applied.
    Loaded { count: usize },
    /// Fetch failed; the collection was left empty.
    Failed(StoreError),
}

impl LoadOutcome {
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Result of [`CartWishlistStore::load`], per collection.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub cart: LoadOutcome,
    pub wishlist: LoadOutcome,
}

#[derive(Debug, Default)]
struct StoreState {
    cart: Cart,
    wishlist: Wishlist,
}

/// Local cart and wishlist mirror for one session.
pub struct CartWishlistStore<S> {
    inner: Arc<StoreInner<S>>,
}

struct StoreInner<S> {
    service: S,
    request_timeout: Duration,
    state: Mutex<StoreState>,
    slots: SlotTable,
    events: broadcast::Sender<StoreEvent>,
}

impl<S> Clone for CartWishlistStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RemoteCartService> CartWishlistStore<S> {
    /// Create an empty store backed by `service`.
    ///
    /// `request_timeout` bounds every remote call; a call that exceeds it
    /// fails with [`RemoteError::Timeout`].
    #[must_use]
    pub fn new(service: S, request_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(StoreInner {
                service,
                request_timeout,
                state: Mutex::new(StoreState::default()),
                slots: SlotTable::default(),
                events,
            }),
        }
    }

    /// Subscribe to change events and notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// (Re)initialize local state from the remote service.
    ///
    /// Without a credential the store is reset to empty and nothing is
    /// fetched. Otherwise the cart and wishlist are fetched concurrently; each
    /// side is replaced by its snapshot on success and left empty on failure,
    /// independently of the other.
    #[instrument(skip_all, fields(authenticated = credential.is_some()))]
    pub async fn load(&self, credential: Option<&BearerToken>) -> LoadReport {
        let Some(token) = credential else {
            self.replace_state(Cart::new(), Wishlist::new());
            debug!("No credential, store reset to anonymous state");
            return LoadReport {
                cart: LoadOutcome::Skipped,
                wishlist: LoadOutcome::Skipped,
            };
        };

        let (cart, wishlist) = tokio::join!(
            self.call(self.inner.service.fetch_cart(token)),
            self.call(self.inner.service.fetch_wishlist(token)),
        );

        let (cart, cart_outcome) = match cart {
            Ok(cart) => {
                let count = cart.len();
                (cart, LoadOutcome::Loaded { count })
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load cart");
                (Cart::new(), LoadOutcome::Failed(err))
            }
        };

        let (wishlist, wishlist_outcome) = match wishlist {
            Ok(wishlist) => {
                let count = wishlist.len();
                (wishlist, LoadOutcome::Loaded { count })
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load wishlist");
                (Wishlist::new(), LoadOutcome::Failed(err))
            }
        };

        self.replace_state(cart, wishlist);
        info!(
            cart_lines = self.cart_lines().len(),
            wishlist_entries = self.wishlist_entries().len(),
            "Cart and wishlist loaded"
        );

        LoadReport {
            cart: cart_outcome,
            wishlist: wishlist_outcome,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product to the cart.
    ///
    /// On confirmation the existing line is incremented, or a new line with
    /// quantity 1 is appended. Returns the product's new quantity.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unauthenticated`] without a credential (nothing sent)
    /// - [`StoreError::QuantityLimit`] if the line is already at
    ///   [`u32::MAX`] (nothing sent)
    /// - [`StoreError::Remote`] if the service rejects or cannot be reached
    #[instrument(skip(self, credential), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        product_id: ProductId,
        credential: Option<&BearerToken>,
    ) -> Result<Quantity, StoreError> {
        let operation = Operation::AddToCart;
        let Some(token) = credential else {
            return self.finish(operation, product_id, Err(StoreError::Unauthenticated));
        };

        let _slot = self.inner.slots.acquire(SlotKey::Cart(product_id)).await;

        if self.quantity_of(product_id) == u32::MAX {
            return self.finish(
                operation,
                product_id,
                Err(StoreError::QuantityLimit { product_id }),
            );
        }

        breadcrumb("cart", operation, product_id);

        let result = self
            .call(
                self.inner
                    .service
                    .add_to_cart(token, product_id, Quantity::ONE),
            )
            .await
            .and_then(|()| {
                let (quantity, item_count) = {
                    let mut state = self.state();
                    let quantity = state
                        .cart
                        .add_one(product_id)
                        .map_err(|err| confirmed_but_unapplied(product_id, &err))?;
                    (quantity, state.cart.item_count())
                };
                self.publish(StoreEvent::CartChanged { item_count });
                Ok(quantity)
            });

        self.finish(operation, product_id, result)
    }

    /// Change a cart line's quantity by one unit.
    ///
    /// Decrementing a line with quantity 1 removes it through the remote's
    /// remove operation; every other change goes through the update operation
    /// with a signed delta. Returns the product's new quantity (0 once
    /// removed).
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unauthenticated`] without a credential (nothing sent)
    /// - [`StoreError::InvalidQuantityTransition`] if the product is not in
    ///   the cart (nothing sent)
    /// - [`StoreError::QuantityLimit`] when incrementing a line already at
    ///   [`u32::MAX`] (nothing sent)
    /// - [`StoreError::Remote`] if the service rejects or cannot be reached
    #[instrument(skip(self, credential), fields(product_id = %product_id, change = %change))]
    pub async fn change_quantity(
        &self,
        product_id: ProductId,
        change: QuantityChange,
        credential: Option<&BearerToken>,
    ) -> Result<u32, StoreError> {
        let Some(token) = credential else {
            return self.finish(
                Operation::UpdateQuantity,
                product_id,
                Err(StoreError::Unauthenticated),
            );
        };

        let _slot = self.inner.slots.acquire(SlotKey::Cart(product_id)).await;

        let current = self.quantity_of(product_id);
        if current == 0 {
            return self.finish(
                Operation::UpdateQuantity,
                product_id,
                Err(StoreError::InvalidQuantityTransition { product_id, change }),
            );
        }

        if change == QuantityChange::Increment && current == u32::MAX {
            return self.finish(
                Operation::UpdateQuantity,
                product_id,
                Err(StoreError::QuantityLimit { product_id }),
            );
        }

        if change == QuantityChange::Decrement && current == 1 {
            let operation = Operation::RemoveFromCart;
            breadcrumb("cart", operation, product_id);

            let result = self
                .call(self.inner.service.remove_from_cart(token, product_id))
                .await
                .map(|()| {
                    let item_count = {
                        let mut state = self.state();
                        state.cart.remove(product_id);
                        state.cart.item_count()
                    };
                    self.publish(StoreEvent::CartChanged { item_count });
                    0
                });

            return self.finish(operation, product_id, result);
        }

        let operation = Operation::UpdateQuantity;
        breadcrumb("cart", operation, product_id);

        let result = self
            .call(self.inner.service.update_cart(token, product_id, change))
            .await
            .and_then(|()| {
                let (quantity, item_count) = {
                    let mut state = self.state();
                    let quantity = state
                        .cart
                        .adjust(product_id, change)
                        .map_err(|err| confirmed_but_unapplied(product_id, &err))?;
                    (quantity, state.cart.item_count())
                };
                self.publish(StoreEvent::CartChanged { item_count });
                Ok(quantity)
            });

        self.finish(operation, product_id, result)
    }

    /// Add a product to the wishlist, or remove it if already saved.
    ///
    /// Returns the product's new membership.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unauthenticated`] without a credential (nothing sent)
    /// - [`StoreError::Remote`] if the service rejects or cannot be reached
    #[instrument(skip(self, credential), fields(product_id = %product_id))]
    pub async fn toggle_wishlist(
        &self,
        product_id: ProductId,
        credential: Option<&BearerToken>,
    ) -> Result<bool, StoreError> {
        let Some(token) = credential else {
            let operation = if self.is_wishlisted(product_id) {
                Operation::RemoveFromWishlist
            } else {
                Operation::AddToWishlist
            };
            return self.finish(operation, product_id, Err(StoreError::Unauthenticated));
        };

        let _slot = self
            .inner
            .slots
            .acquire(SlotKey::Wishlist(product_id))
            .await;

        let already = self.is_wishlisted(product_id);
        let action = WishlistAction::toggling(already);
        let operation = match action {
            WishlistAction::Add => Operation::AddToWishlist,
            WishlistAction::Remove => Operation::RemoveFromWishlist,
        };
        breadcrumb("wishlist", operation, product_id);

        let result = self
            .call(self.inner.service.update_wishlist(token, product_id, action))
            .await
            .map(|()| {
                let count = {
                    let mut state = self.state();
                    if action == WishlistAction::Add {
                        state.wishlist.insert(product_id);
                    } else {
                        state.wishlist.remove(product_id);
                    }
                    state.wishlist.len()
                };
                self.publish(StoreEvent::WishlistChanged { count });
                action == WishlistAction::Add
            });

        self.finish(operation, product_id, result)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Quantity of a product in the cart, or 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.state().cart.quantity_of(product_id)
    }

    /// Whether a product is on the wishlist.
    #[must_use]
    pub fn is_wishlisted(&self, product_id: ProductId) -> bool {
        self.state().wishlist.contains(product_id)
    }

    /// Snapshot of the cart lines in display order.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.state().cart.lines().to_vec()
    }

    /// Snapshot of the wishlist entries in the order they were saved.
    #[must_use]
    pub fn wishlist_entries(&self) -> Vec<WishlistEntry> {
        self.state().wishlist.entries().to_vec()
    }

    /// Total units in the cart (the cart badge value).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.state().cart.item_count()
    }

    /// Cart quantity and wishlist state for one product card.
    #[must_use]
    pub fn product_card<'a>(&self, product: &'a Product) -> ProductCardView<'a> {
        let state = self.state();
        ProductCardView::new(product, &state.cart, &state.wishlist)
    }

    /// Priced summary of the cart, joined against the catalog.
    #[must_use]
    pub fn cart_summary(&self, catalog: &[Product]) -> CartSummary {
        CartSummary::build(&self.state().cart, catalog)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run a remote call under the request timeout.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, StoreError> {
        let timeout = self.inner.request_timeout;
        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(RemoteError::Timeout(timeout).into()),
        }
    }

    /// Lock local state. Never held across an `.await`.
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_state(&self, cart: Cart, wishlist: Wishlist) {
        let (item_count, count) = {
            let mut state = self.state();
            state.cart = cart;
            state.wishlist = wishlist;
            (state.cart.item_count(), state.wishlist.len())
        };
        self.publish(StoreEvent::CartChanged { item_count });
        self.publish(StoreEvent::WishlistChanged { count });
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    /// Log, report and notify the outcome of a mutation.
    fn finish<T>(
        &self,
        operation: Operation,
        product_id: ProductId,
        result: Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let notification = match &result {
            Ok(_) => {
                debug!(operation = operation.as_str(), %product_id, "Cart operation confirmed");
                Notification::success(operation)
            }
            Err(err) => {
                report_error(operation.as_str(), product_id, err);
                Notification::failure(operation, err)
            }
        };

        self.publish(StoreEvent::Notified {
            operation,
            product_id,
            notification,
        });

        result
    }
}

fn breadcrumb(category: &str, operation: Operation, product_id: ProductId) {
    add_breadcrumb(
        category,
        operation.as_str(),
        Some(&[("product_id", &product_id.to_string())]),
    );
}

/// The service applied a change the local mirror could not. Only reachable
/// when a `load` during the call left the line at the quantity ceiling.
fn confirmed_but_unapplied(product_id: ProductId, err: &QuantityError) -> StoreError {
    error!(product_id = %product_id, error = %err, "Confirmed cart change not applied locally");
    StoreError::QuantityLimit { product_id }
}
