//! Wishlist commands.

use crowns_collars_core::ProductId;

use super::{CliError, Session};

/// Save `product_id`, or remove it if already saved.
///
/// # Errors
///
/// Returns error if the cart service does not apply the change.
pub async fn toggle(session: &Session, product_id: ProductId) -> Result<(), CliError> {
    let saved = session
        .store
        .toggle_wishlist(product_id, session.token.as_ref())
        .await?;

    if saved {
        tracing::info!("Saved product {product_id} to wishlist");
    } else {
        tracing::info!("Removed product {product_id} from wishlist");
    }
    Ok(())
}
