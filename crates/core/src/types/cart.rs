//! Cart line items and the local cart mirror.
//!
//! A [`Cart`] holds at most one [`CartLine`] per product, and every line has
//! a strictly positive [`Quantity`]. Lines are kept in the order they were
//! first added, which is the order the storefront lists them.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Errors that can occur when constructing cart values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// A cart line cannot have a quantity of zero.
    #[error("quantity must be at least 1")]
    Zero,
    /// The same product appeared on more than one line.
    #[error("duplicate cart line for product {0}")]
    DuplicateLine(ProductId),
    /// The line is already at the largest representable quantity.
    #[error("quantity of product {0} cannot be increased further")]
    Overflow(ProductId),
}

/// Quantity of a product in the cart.
///
/// Backed by [`NonZeroU32`]: a line that exists always has at least one unit.
/// Deserialization rejects `0` and negative numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a raw count.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `count` is zero.
    pub const fn new(count: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(count) {
            Some(n) => Ok(Self(n)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Get the raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Apply a single-unit change.
    ///
    /// Returns `None` when the result is out of range: a decrement that
    /// would reach zero (the caller removes the line instead) or an increment
    /// past [`u32::MAX`].
    #[must_use]
    pub const fn apply(self, change: QuantityChange) -> Option<Self> {
        match change {
            QuantityChange::Increment => match self.0.checked_add(1) {
                Some(n) => Some(Self(n)),
                None => None,
            },
            QuantityChange::Decrement => match NonZeroU32::new(self.0.get() - 1) {
                Some(n) => Some(Self(n)),
                None => None,
            },
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

/// Direction of a single-unit quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityChange {
    Increment,
    Decrement,
}

impl QuantityChange {
    /// Signed delta sent to the remote cart service.
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Increment => 1,
            Self::Decrement => -1,
        }
    }
}

impl fmt::Display for QuantityChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increment => f.write_str("increment"),
            Self::Decrement => f.write_str("decrement"),
        }
    }
}

/// One product's presence in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product on this line.
    pub product_id: ProductId,
    /// Units of the product.
    pub quantity: Quantity,
}

impl CartLine {
    /// Create a new cart line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Local mirror of the visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from a fetched snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::DuplicateLine`] if two lines share a product,
    /// since the intended quantity is ambiguous.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Result<Self, QuantityError> {
        let mut cart = Self::new();
        for line in lines {
            if cart.line(line.product_id).is_some() {
                return Err(QuantityError::DuplicateLine(line.product_id));
            }
            cart.lines.push(line);
        }
        Ok(cart)
    }

    /// Get the line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Quantity of a product, or 0 if it is not in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |line| line.quantity.get())
    }

    /// Merge one unit of a product into the cart.
    ///
    /// Increments the existing line or appends a new line with quantity 1.
    /// Returns the resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Overflow`] if the line is already at
    /// [`u32::MAX`]; the cart is left unchanged.
    pub fn add_one(&mut self, product_id: ProductId) -> Result<Quantity, QuantityError> {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = line
                .quantity
                .apply(QuantityChange::Increment)
                .ok_or(QuantityError::Overflow(product_id))?;
            return Ok(line.quantity);
        }

        self.lines.push(CartLine::new(product_id, Quantity::ONE));
        Ok(Quantity::ONE)
    }

    /// Apply a single-unit change to an existing line.
    ///
    /// A decrement that would reach zero removes the line. Absent products are
    /// left absent. Returns the resulting quantity (0 if no line remains).
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Overflow`] when incrementing a line already at
    /// [`u32::MAX`]; the cart is left unchanged.
    pub fn adjust(
        &mut self,
        product_id: ProductId,
        change: QuantityChange,
    ) -> Result<u32, QuantityError> {
        let Some(index) = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
        else {
            return Ok(0);
        };

        let Some(line) = self.lines.get_mut(index) else {
            return Ok(0);
        };

        match (line.quantity.apply(change), change) {
            (Some(quantity), _) => {
                line.quantity = quantity;
                Ok(quantity.get())
            }
            (None, QuantityChange::Decrement) => {
                self.lines.remove(index);
                Ok(0)
            }
            (None, QuantityChange::Increment) => Err(QuantityError::Overflow(product_id)),
        }
    }

    /// Remove a product's line. Returns `true` if a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    /// All lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity.get()))
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
