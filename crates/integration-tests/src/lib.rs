//! Integration tests for the Crowns & Collars cart engine.
//!
//! [`MockCartApi`] serves the cart and wishlist JSON API from memory on an
//! ephemeral local port, so the real `HttpCartService` can be exercised end
//! to end without a live backend.
//!
//! # Routes
//!
//! ```text
//! GET  /api/cart             - { success, items: [{ product_id, quantity }] }
//! POST /api/cart/add         - { product_id, quantity }
//! POST /api/cart/update      - { product_id, change }
//! POST /api/cart/remove      - { product_id }
//! GET  /api/wishlist         - { success, items: [{ product_id }] }
//! POST /api/wishlist/add     - { product_id }
//! POST /api/wishlist/remove  - { product_id }
//! ```
//!
//! Every route requires `Authorization: Bearer <VALID_TOKEN>`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p crowns-collars-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// The only token the mock API accepts.
pub const VALID_TOKEN: &str = "integration-session-token";

/// A scripted misbehavior applied to every API request until cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Answer `success: false` with this message.
    Reject(String),
    /// Answer 200 with a body that is not an envelope.
    MalformedBody,
    /// Answer with this status and an HTML error page.
    Status(u16),
    /// Answer 429 with this `Retry-After`.
    RateLimit(u64),
    /// Wait this long before handling the request normally.
    Delay(Duration),
}

/// A request as seen by the mock API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRequest {
    pub path: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Default)]
struct Backend {
    /// Cart lines in insertion order.
    cart: Vec<(i32, u32)>,
    wishlist: Vec<i32>,
    fault: Option<Fault>,
    requests: Vec<ReceivedRequest>,
}

impl Backend {
    fn line_mut(&mut self, product_id: i32) -> Option<&mut (i32, u32)> {
        self.cart.iter_mut().find(|(id, _)| *id == product_id)
    }
}

/// Shared handle on the mock API's data.
#[derive(Debug, Clone, Default)]
pub struct ApiState {
    backend: Arc<Mutex<Backend>>,
}

impl ApiState {
    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fault(&self) -> Option<Fault> {
        self.lock().fault.clone()
    }
}

/// A running mock cart API.
///
/// The server task is aborted on drop.
#[derive(Debug)]
pub struct MockCartApi {
    addr: SocketAddr,
    state: ApiState,
    handle: JoinHandle<()>,
}

impl MockCartApi {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn spawn() -> std::io::Result<Self> {
        let state = ApiState::default();
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            // Serving only ends when the task is aborted
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL to configure the client with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the server-side cart.
    pub fn set_cart(&self, lines: &[(i32, u32)]) {
        self.state.lock().cart = lines.to_vec();
    }

    /// Replace the server-side wishlist.
    pub fn set_wishlist(&self, product_ids: &[i32]) {
        self.state.lock().wishlist = product_ids.to_vec();
    }

    /// Server-side cart lines in insertion order.
    #[must_use]
    pub fn cart(&self) -> Vec<(i32, u32)> {
        self.state.lock().cart.clone()
    }

    /// Server-side wishlist.
    #[must_use]
    pub fn wishlist(&self) -> Vec<i32> {
        self.state.lock().wishlist.clone()
    }

    /// Apply `fault` to every request until [`clear_fault`](Self::clear_fault).
    pub fn set_fault(&self, fault: Fault) {
        self.state.lock().fault = Some(fault);
    }

    pub fn clear_fault(&self) {
        self.state.lock().fault = None;
    }

    /// Requests received so far, including rejected ones.
    #[must_use]
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.lock().requests.clone()
    }
}

impl Drop for MockCartApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Router
// =============================================================================

fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update", post(update_cart))
        .route("/api/cart/remove", post(remove_from_cart))
        .route("/api/wishlist", get(get_wishlist))
        .route("/api/wishlist/add", post(add_to_wishlist))
        .route("/api/wishlist/remove", post(remove_from_wishlist))
        .layer(middleware::from_fn_with_state(state.clone(), gatekeeper))
        .with_state(state)
}

/// Record the request, check the bearer token and apply any scripted fault.
async fn gatekeeper(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let headers = request.headers();
    state.lock().requests.push(ReceivedRequest {
        path: request.uri().path().to_string(),
        request_id: headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    if !authorized(headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Unauthorized"})),
        )
            .into_response();
    }

    match state.fault() {
        None => next.run(request).await,
        Some(Fault::Delay(delay)) => {
            tokio::time::sleep(delay).await;
            next.run(request).await
        }
        Some(Fault::Reject(message)) => {
            Json(json!({"success": false, "message": message})).into_response()
        }
        Some(Fault::MalformedBody) => Json(json!({"ok": true})).into_response(),
        Some(Fault::Status(code)) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body>Internal Server Error</body></html>",
        )
            .into_response(),
        Some(Fault::RateLimit(retry_after)) => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
            "",
        )
            .into_response(),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == VALID_TOKEN)
}

fn ok() -> Json<Value> {
    Json(json!({"success": true}))
}

fn rejected(message: &str) -> Json<Value> {
    Json(json!({"success": false, "message": message}))
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct AddBody {
    product_id: i32,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct UpdateBody {
    product_id: i32,
    change: i32,
}

#[derive(Debug, Deserialize)]
struct ProductBody {
    product_id: i32,
}

async fn get_cart(State(state): State<ApiState>) -> Json<Value> {
    let items: Vec<Value> = state
        .lock()
        .cart
        .iter()
        .map(|(product_id, quantity)| json!({"product_id": product_id, "quantity": quantity}))
        .collect();
    Json(json!({"success": true, "items": items}))
}

async fn add_to_cart(State(state): State<ApiState>, Json(body): Json<AddBody>) -> Json<Value> {
    if body.quantity == 0 {
        return rejected("Quantity must be at least 1");
    }

    let mut backend = state.lock();
    if let Some(line) = backend.line_mut(body.product_id) {
        line.1 += body.quantity;
    } else {
        backend.cart.push((body.product_id, body.quantity));
    }
    ok()
}

async fn update_cart(State(state): State<ApiState>, Json(body): Json<UpdateBody>) -> Json<Value> {
    let mut backend = state.lock();
    let Some(line) = backend.line_mut(body.product_id) else {
        return rejected("Item not in cart");
    };

    match line.1.checked_add_signed(body.change) {
        Some(quantity) if quantity >= 1 => {
            line.1 = quantity;
            ok()
        }
        _ => rejected("Quantity must be at least 1"),
    }
}

async fn remove_from_cart(
    State(state): State<ApiState>,
    Json(body): Json<ProductBody>,
) -> Json<Value> {
    let mut backend = state.lock();
    let before = backend.cart.len();
    backend.cart.retain(|(id, _)| *id != body.product_id);
    if backend.cart.len() == before {
        rejected("Item not in cart")
    } else {
        ok()
    }
}

async fn get_wishlist(State(state): State<ApiState>) -> Json<Value> {
    let items: Vec<Value> = state
        .lock()
        .wishlist
        .iter()
        .map(|product_id| json!({"product_id": product_id}))
        .collect();
    Json(json!({"success": true, "items": items}))
}

async fn add_to_wishlist(
    State(state): State<ApiState>,
    Json(body): Json<ProductBody>,
) -> Json<Value> {
    let mut backend = state.lock();
    if backend.wishlist.contains(&body.product_id) {
        return rejected("Already in wishlist");
    }
    backend.wishlist.push(body.product_id);
    ok()
}

async fn remove_from_wishlist(
    State(state): State<ApiState>,
    Json(body): Json<ProductBody>,
) -> Json<Value> {
    let mut backend = state.lock();
    let Some(index) = backend.wishlist.iter().position(|id| *id == body.product_id) else {
        return rejected("Not in wishlist");
    };
    backend.wishlist.remove(index);
    ok()
}
