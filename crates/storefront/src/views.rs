//! Display data for product cards and the cart page.
//!
//! Views join catalog [`Product`]s with the store's cart and wishlist. Prices
//! are pre-formatted strings, ready for templates.

use std::collections::HashMap;

use crowns_collars_core::{Cart, CurrencyCode, Price, Product, ProductId, Wishlist};

/// Per-product card state: quantity controls and the wishlist heart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView<'a> {
    pub product: &'a Product,
    /// Quantity in the cart, or 0.
    pub quantity: u32,
    pub wishlisted: bool,
}

impl<'a> ProductCardView<'a> {
    #[must_use]
    pub fn new(product: &'a Product, cart: &Cart, wishlist: &Wishlist) -> Self {
        Self {
            product,
            quantity: cart.quantity_of(product.id),
            wishlisted: wishlist.contains(product.id),
        }
    }

    /// Whether to show quantity controls instead of the add button.
    #[must_use]
    pub const fn in_cart(&self) -> bool {
        self.quantity > 0
    }
}

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart page display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    /// Total units, including lines whose product is not in the catalog.
    pub item_count: u32,
}

impl CartSummary {
    /// Create an empty cart summary.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            subtotal: Price::zero(CurrencyCode::USD).to_string(),
            item_count: 0,
        }
    }

    /// Price the cart against `catalog`.
    ///
    /// Lines whose product is missing from the catalog count toward
    /// `item_count` but are left out of `lines` and the subtotal.
    #[must_use]
    pub fn build(cart: &Cart, catalog: &[Product]) -> Self {
        let products: HashMap<ProductId, &Product> =
            catalog.iter().map(|product| (product.id, product)).collect();

        let mut subtotal = Price::zero(CurrencyCode::USD);
        let mut lines = Vec::with_capacity(cart.len());

        for line in cart.lines() {
            let Some(product) = products.get(&line.product_id) else {
                tracing::debug!(product_id = %line.product_id, "Cart line not in catalog");
                continue;
            };

            let quantity = line.quantity.get();
            let unit_price = product.unit_price();
            let line_price = unit_price.times(quantity);
            subtotal = subtotal.checked_add(line_price).unwrap_or(subtotal);

            lines.push(CartLineView {
                product_id: product.id,
                name: product.name.clone(),
                image: product.image.clone(),
                quantity,
                price: unit_price.to_string(),
                line_price: line_price.to_string(),
            });
        }

        Self {
            lines,
            subtotal: subtotal.to_string(),
            item_count: cart.item_count(),
        }
    }
}
