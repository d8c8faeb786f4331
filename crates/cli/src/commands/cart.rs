//! Cart commands.

use crowns_collars_core::{ProductId, QuantityChange};

use super::{CliError, Session};

/// Log the cart lines and wishlist.
pub fn show(session: &Session) {
    let lines = session.store.cart_lines();
    if lines.is_empty() {
        tracing::info!("Cart is empty");
    }
    for line in &lines {
        tracing::info!("  product {} x {}", line.product_id, line.quantity.get());
    }
    tracing::info!("Items in cart: {}", session.store.item_count());

    let entries = session.store.wishlist_entries();
    if !entries.is_empty() {
        let ids: Vec<String> = entries.iter().map(|e| e.product_id.to_string()).collect();
        tracing::info!("Wishlist: {}", ids.join(", "));
    }
}

/// Add one unit of `product_id`.
///
/// # Errors
///
/// Returns error if the cart service does not apply the change.
pub async fn add(session: &Session, product_id: ProductId) -> Result<(), CliError> {
    let quantity = session
        .store
        .add_to_cart(product_id, session.token.as_ref())
        .await?;
    tracing::info!("Added product {product_id} (quantity now {})", quantity.get());
    Ok(())
}

/// Increment or decrement the line for `product_id`.
///
/// # Errors
///
/// Returns error if the product is not in the cart or the cart service does
/// not apply the change.
pub async fn change(
    session: &Session,
    product_id: ProductId,
    change: QuantityChange,
) -> Result<(), CliError> {
    let quantity = session
        .store
        .change_quantity(product_id, change, session.token.as_ref())
        .await?;

    if quantity == 0 {
        tracing::info!("Removed product {product_id} from cart");
    } else {
        tracing::info!("Product {product_id} quantity now {quantity}");
    }
    Ok(())
}
