//! In-memory cart service for tests.
//!
//! [`MockCartService`] keeps its own server-side cart and wishlist, records
//! every call, and can be told to fail, hang or respond slowly per endpoint.
//! [`hold`](MockCartService::hold) keeps responses in flight until
//! [`release`](MockCartService::release).
//! Compiled for unit tests only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use crowns_collars_core::{BearerToken, Cart, ProductId, Quantity, QuantityChange, Wishlist};
use tokio::sync::watch;

use crate::remote::{RemoteCartService, RemoteError, WishlistAction};

/// A remote operation, as seen by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FetchCart,
    FetchWishlist,
    AddToCart,
    RemoveFromCart,
    UpdateCart,
    AddToWishlist,
    RemoveFromWishlist,
}

impl Endpoint {
    /// Whether this endpoint changes server state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::FetchCart | Self::FetchWishlist)
    }
}

/// How a failing endpoint should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Respond with `success: false` and an optional message.
    Rejected(Option<String>),
    /// Fail before any response arrives.
    Transport,
    /// Respond with a body that fails validation.
    Malformed,
    /// Never respond.
    Hang,
}

/// One call received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub product_id: Option<ProductId>,
    /// Signed delta for [`Endpoint::UpdateCart`].
    pub change: Option<i32>,
    pub token: String,
}

#[derive(Debug, Default)]
struct MockState {
    cart: Cart,
    wishlist: Wishlist,
    calls: Vec<RecordedCall>,
    failures: HashMap<Endpoint, MockFailure>,
    in_flight: HashMap<ProductId, usize>,
    max_in_flight: usize,
}

/// Cart service that lives in memory.
///
/// Clones share state, so a test can hand one clone to the store and keep
/// another for assertions.
#[derive(Debug, Clone)]
pub struct MockCartService {
    state: Arc<Mutex<MockState>>,
    latency: Arc<Mutex<Duration>>,
    /// `true` while responses are held.
    gate: Arc<watch::Sender<bool>>,
}

impl Default for MockCartService {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            latency: Arc::default(),
            gate: Arc::new(watch::Sender::new(false)),
        }
    }
}

impl MockCartService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with this server-side cart.
    #[must_use]
    pub fn with_cart(self, cart: Cart) -> Self {
        self.lock().cart = cart;
        self
    }

    /// Start with this server-side wishlist.
    #[must_use]
    pub fn with_wishlist(self, wishlist: Wishlist) -> Self {
        self.lock().wishlist = wishlist;
        self
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
        self
    }

    /// Make `endpoint` fail until [`recover`](Self::recover) is called.
    pub fn fail(&self, endpoint: Endpoint, failure: MockFailure) {
        self.lock().failures.insert(endpoint, failure);
    }

    /// Let `endpoint` succeed again.
    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    /// Keep every response in flight until [`release`](Self::release).
    ///
    /// Calls are still recorded on arrival.
    pub fn hold(&self) {
        self.gate.send_replace(true);
    }

    /// Let held and future responses through.
    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    /// Server-side cart.
    #[must_use]
    pub fn server_cart(&self) -> Cart {
        self.lock().cart.clone()
    }

    /// Server-side wishlist.
    #[must_use]
    pub fn server_wishlist(&self) -> Wishlist {
        self.lock().wishlist.clone()
    }

    /// Every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of calls received for `endpoint`.
    #[must_use]
    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    /// Number of mutating calls received.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.endpoint.is_mutation())
            .count()
    }

    /// Highest number of calls seen in flight at once for a single product.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn latency(&self) -> Duration {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call, wait out latency and failures, then apply `respond`.
    async fn serve<T>(
        &self,
        call: RecordedCall,
        respond: impl FnOnce(&mut MockState) -> Result<T, RemoteError> + Send,
    ) -> Result<T, RemoteError> {
        let endpoint = call.endpoint;
        let _in_flight = InFlight::enter(self, call);

        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut gate = self.gate.subscribe();
        // The sender lives as long as `self`, so this only ends on release
        let _ = gate.wait_for(|held| !held).await;

        let failure = self.lock().failures.get(&endpoint).cloned();
        match failure {
            Some(MockFailure::Rejected(message)) => Err(RemoteError::Rejected { message }),
            Some(MockFailure::Transport) => {
                Err(RemoteError::Transport("connection reset by peer".to_string()))
            }
            Some(MockFailure::Malformed) => Err(RemoteError::Malformed(
                "missing field `success`".to_string(),
            )),
            Some(MockFailure::Hang) => {
                std::future::pending::<()>().await;
                Err(RemoteError::Transport("unreachable".to_string()))
            }
            None => {
                let mut state = self.lock();
                respond(&mut state)
            }
        }
    }
}

/// Tracks one call in flight for its product.
struct InFlight<'a> {
    service: &'a MockCartService,
    product_id: Option<ProductId>,
}

impl<'a> InFlight<'a> {
    fn enter(service: &'a MockCartService, call: RecordedCall) -> Self {
        let product_id = call.product_id;
        let mut state = service.lock();
        if let Some(id) = product_id {
            let count = state.in_flight.entry(id).or_default();
            *count += 1;
            let count = *count;
            state.max_in_flight = state.max_in_flight.max(count);
        }
        state.calls.push(call);
        drop(state);

        Self {
            service,
            product_id,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.product_id {
            let mut state = self.service.lock();
            if let Some(count) = state.in_flight.get_mut(&id) {
                *count = count.saturating_sub(1);
            }
        }
    }
}

fn recorded(
    endpoint: Endpoint,
    token: &BearerToken,
    product_id: Option<ProductId>,
    change: Option<i32>,
) -> RecordedCall {
    RecordedCall {
        endpoint,
        product_id,
        change,
        token: token.expose().to_string(),
    }
}

fn rejected(message: &str) -> RemoteError {
    RemoteError::Rejected {
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl RemoteCartService for MockCartService {
    async fn fetch_cart(&self, token: &BearerToken) -> Result<Cart, RemoteError> {
        let call = recorded(Endpoint::FetchCart, token, None, None);
        self.serve(call, |state| Ok(state.cart.clone())).await
    }

    async fn fetch_wishlist(&self, token: &BearerToken) -> Result<Wishlist, RemoteError> {
        let call = recorded(Endpoint::FetchWishlist, token, None, None);
        self.serve(call, |state| Ok(state.wishlist.clone())).await
    }

    async fn add_to_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RemoteError> {
        let call = recorded(Endpoint::AddToCart, token, Some(product_id), None);
        self.serve(call, move |state| {
            for _ in 0..quantity.get() {
                state
                    .cart
                    .add_one(product_id)
                    .map_err(|_| rejected("Quantity limit reached"))?;
            }
            Ok(())
        })
        .await
    }

    async fn remove_from_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
    ) -> Result<(), RemoteError> {
        let call = recorded(Endpoint::RemoveFromCart, token, Some(product_id), None);
        self.serve(call, move |state| {
            if state.cart.remove(product_id) {
                Ok(())
            } else {
                Err(rejected("Item not in cart"))
            }
        })
        .await
    }

    async fn update_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        change: QuantityChange,
    ) -> Result<(), RemoteError> {
        let call = recorded(
            Endpoint::UpdateCart,
            token,
            Some(product_id),
            Some(change.delta()),
        );
        self.serve(call, move |state| match state.cart.quantity_of(product_id) {
            0 => Err(rejected("Item not in cart")),
            1 if change == QuantityChange::Decrement => {
                Err(rejected("Quantity must be at least 1"))
            }
            _ => state
                .cart
                .adjust(product_id, change)
                .map(|_| ())
                .map_err(|_| rejected("Quantity limit reached")),
        })
        .await
    }

    async fn update_wishlist(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        action: WishlistAction,
    ) -> Result<(), RemoteError> {
        let endpoint = match action {
            WishlistAction::Add => Endpoint::AddToWishlist,
            WishlistAction::Remove => Endpoint::RemoveFromWishlist,
        };
        let call = recorded(endpoint, token, Some(product_id), None);
        self.serve(call, move |state| {
            if action == WishlistAction::Add {
                state.wishlist.insert(product_id);
            } else {
                state.wishlist.remove(product_id);
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token() -> BearerToken {
        BearerToken::parse("test-token").unwrap()
    }

    #[tokio::test]
    async fn test_server_update_rejects_below_one() {
        let mut cart = Cart::new();
        cart.add_one(ProductId::new(1)).unwrap();
        let mock = MockCartService::new().with_cart(cart);

        let err = mock
            .update_cart(&token(), ProductId::new(1), QuantityChange::Decrement)
            .await
            .unwrap_err();
        assert_eq!(err.remote_message(), Some("Quantity must be at least 1"));
        assert_eq!(mock.server_cart().quantity_of(ProductId::new(1)), 1);
    }

    #[tokio::test]
    async fn test_failure_and_recover() {
        let mock = MockCartService::new();
        mock.fail(Endpoint::AddToCart, MockFailure::Transport);

        let err = mock
            .add_to_cart(&token(), ProductId::new(2), Quantity::ONE)
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(mock.server_cart().is_empty());

        mock.recover(Endpoint::AddToCart);
        mock.add_to_cart(&token(), ProductId::new(2), Quantity::ONE)
            .await
            .unwrap();
        assert_eq!(mock.server_cart().quantity_of(ProductId::new(2)), 1);
        assert_eq!(mock.call_count(Endpoint::AddToCart), 2);
    }

    #[tokio::test]
    async fn test_calls_record_token_and_delta() {
        let mock = MockCartService::new();
        mock.add_to_cart(&token(), ProductId::new(4), Quantity::ONE)
            .await
            .unwrap();
        mock.update_cart(&token(), ProductId::new(4), QuantityChange::Increment)
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].endpoint, Endpoint::UpdateCart);
        assert_eq!(calls[1].change, Some(1));
        assert_eq!(calls[1].token, "test-token");
        assert_eq!(mock.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_hold_keeps_call_in_flight() {
        let mock = MockCartService::new();
        mock.hold();

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move {
                mock.add_to_cart(&token(), ProductId::new(6), Quantity::ONE)
                    .await
            })
        };

        // Recorded on arrival, applied only after release
        while mock.call_count(Endpoint::AddToCart) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(mock.server_cart().is_empty());

        mock.release();
        task.await.unwrap().unwrap();
        assert_eq!(mock.server_cart().quantity_of(ProductId::new(6)), 1);
    }
}
