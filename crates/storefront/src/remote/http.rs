//! HTTP implementation of the remote cart service.
//!
//! Uses `reqwest` with JSON bodies. Each request carries the caller's bearer
//! token and a fresh `X-Request-Id` for log correlation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crowns_collars_core::{BearerToken, Cart, ProductId, Quantity, QuantityChange, Wishlist};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::envelope::{parse_action, parse_cart, parse_wishlist};
use super::{RemoteCartService, RemoteError, WishlistAction};
use crate::config::StorefrontConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest slice of a response body included in logs.
const LOG_BODY_LIMIT: usize = 500;

#[derive(Debug, Serialize)]
struct AddToCartBody {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct UpdateCartBody {
    product_id: ProductId,
    change: i32,
}

#[derive(Debug, Serialize)]
struct ProductBody {
    product_id: ProductId,
}

/// Client for the storefront's cart and wishlist JSON API.
#[derive(Clone)]
pub struct HttpCartService {
    inner: Arc<HttpCartServiceInner>,
}

struct HttpCartServiceInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCartService {
    /// Create a new cart API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCartServiceInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    /// Send a request and return the status and body text.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        token: &BearerToken,
    ) -> Result<(u16, String), RemoteError> {
        let request_id = Uuid::new_v4();

        let response = request
            .bearer_auth(token.expose())
            .header("X-Request-Id", request_id.to_string())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(RemoteError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        debug!(
            %request_id,
            status = status.as_u16(),
            "Cart service responded"
        );

        Ok((status.as_u16(), body))
    }

    /// GET an items endpoint.
    async fn get(&self, path: &str, token: &BearerToken) -> Result<(u16, String), RemoteError> {
        let url = self.endpoint(path)?;
        self.send(self.inner.client.get(url), token).await
    }

    /// POST a JSON body to an action endpoint and decode the envelope.
    async fn post_action<B: Serialize + Sync>(
        &self,
        path: &str,
        token: &BearerToken,
        body: &B,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(path)?;
        let (status, text) = self.send(self.inner.client.post(url).json(body), token).await?;
        parse_action(status, &text).inspect_err(|e| log_failure(path, status, &text, e))
    }
}

/// Log a decoding or rejection failure with a truncated body.
fn log_failure(path: &str, status: u16, body: &str, err: &RemoteError) {
    match err {
        RemoteError::Rejected { .. } => {
            debug!(path, status, error = %err, "Cart service rejected request");
        }
        _ => {
            tracing::error!(
                path,
                status,
                error = %err,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to decode cart service response"
            );
        }
    }
}

#[async_trait]
impl RemoteCartService for HttpCartService {
    #[instrument(skip_all)]
    async fn fetch_cart(&self, token: &BearerToken) -> Result<Cart, RemoteError> {
        let (status, text) = self.get("api/cart", token).await?;
        parse_cart(status, &text).inspect_err(|e| log_failure("api/cart", status, &text, e))
    }

    #[instrument(skip_all)]
    async fn fetch_wishlist(&self, token: &BearerToken) -> Result<Wishlist, RemoteError> {
        let (status, text) = self.get("api/wishlist", token).await?;
        parse_wishlist(status, &text).inspect_err(|e| log_failure("api/wishlist", status, &text, e))
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn add_to_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RemoteError> {
        let body = AddToCartBody {
            product_id,
            quantity: quantity.get(),
        };
        self.post_action("api/cart/add", token, &body).await
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn remove_from_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
    ) -> Result<(), RemoteError> {
        self.post_action("api/cart/remove", token, &ProductBody { product_id })
            .await
    }

    #[instrument(skip(self, token), fields(product_id = %product_id, change = %change))]
    async fn update_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        change: QuantityChange,
    ) -> Result<(), RemoteError> {
        let body = UpdateCartBody {
            product_id,
            change: change.delta(),
        };
        self.post_action("api/cart/update", token, &body).await
    }

    #[instrument(skip(self, token), fields(product_id = %product_id, action = ?action))]
    async fn update_wishlist(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        action: WishlistAction,
    ) -> Result<(), RemoteError> {
        self.post_action(action.path(), token, &ProductBody { product_id })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(base: &str) -> HttpCartService {
        HttpCartService::new(&StorefrontConfig::for_base_url(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_resolution() {
        let svc = service("https://shop.example.com");
        assert_eq!(
            svc.endpoint("api/cart/add").unwrap().as_str(),
            "https://shop.example.com/api/cart/add"
        );

        let svc = service("https://shop.example.com/store");
        assert_eq!(
            svc.endpoint(WishlistAction::Remove.path()).unwrap().as_str(),
            "https://shop.example.com/store/api/wishlist/remove"
        );
    }

    #[test]
    fn test_request_bodies_use_wire_names() {
        let body = serde_json::to_value(AddToCartBody {
            product_id: ProductId::new(5),
            quantity: 1,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"product_id": 5, "quantity": 1}));

        let body = serde_json::to_value(UpdateCartBody {
            product_id: ProductId::new(5),
            change: QuantityChange::Decrement.delta(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"product_id": 5, "change": -1}));
    }
}
