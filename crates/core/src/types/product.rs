//! Catalog product reference.
//!
//! Products are owned by the catalog service. The cart engine only refers to
//! them by [`ProductId`]; this type exists so views can join catalog data with
//! cart and wishlist state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{CurrencyCode, Price};

/// A product as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Image URL or path.
    pub image: String,
    pub category: String,
}

impl Product {
    /// Unit price in the store currency (USD).
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::new(self.price, CurrencyCode::USD)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_catalog_json() {
        let product: Product = serde_json::from_str(
            r#"{"id": 4, "name": "Velvet Crown Collar", "price": 24.5, "image": "/p/4.png", "category": "Dogs"}"#,
        )
        .unwrap();

        assert_eq!(product.id, ProductId::new(4));
        assert_eq!(product.unit_price().to_string(), "$24.50");
    }
}
