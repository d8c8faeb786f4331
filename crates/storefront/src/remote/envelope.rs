//! Validated response envelopes.
//!
//! Every endpoint answers `{ success, message?, items? }`. Bodies are decoded
//! into these types before anything touches local state.

use crowns_collars_core::{Cart, CartLine, Wishlist, WishlistEntry};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::RemoteError;

/// Response to a mutating request.
#[derive(Debug, Deserialize)]
pub struct ActionEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionEnvelope {
    /// Convert into a result, mapping `success: false` to a rejection.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rejected`] if the service reported failure.
    pub fn into_result(self) -> Result<(), RemoteError> {
        if self.success {
            Ok(())
        } else {
            Err(rejected(self.message))
        }
    }
}

/// Response to a fetch request.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ItemsEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Missing `items` on a successful response is an empty collection.
    #[serde(default)]
    pub items: Option<Vec<T>>,
}

impl<T> ItemsEnvelope<T> {
    /// Convert into the item list, mapping `success: false` to a rejection.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rejected`] if the service reported failure.
    pub fn into_result(self) -> Result<Vec<T>, RemoteError> {
        if self.success {
            Ok(self.items.unwrap_or_default())
        } else {
            Err(rejected(self.message))
        }
    }
}

/// Decode a mutation response.
pub(crate) fn parse_action(status: u16, body: &str) -> Result<(), RemoteError> {
    decode::<ActionEnvelope>(status, body)?.into_result()
}

/// Decode and validate a cart snapshot.
pub(crate) fn parse_cart(status: u16, body: &str) -> Result<Cart, RemoteError> {
    let lines = decode::<ItemsEnvelope<CartLine>>(status, body)?.into_result()?;
    Cart::from_lines(lines).map_err(|e| RemoteError::Malformed(e.to_string()))
}

/// Decode a wishlist snapshot.
pub(crate) fn parse_wishlist(status: u16, body: &str) -> Result<Wishlist, RemoteError> {
    let entries = decode::<ItemsEnvelope<WishlistEntry>>(status, body)?.into_result()?;
    Ok(Wishlist::from_entries(entries))
}

/// Decode an envelope, classifying undecodable bodies by status.
///
/// A `success: true` envelope on a non-2xx status is not trusted.
fn decode<E>(status: u16, body: &str) -> Result<E, RemoteError>
where
    E: DeserializeOwned + Successful,
{
    let is_success_status = (200..300).contains(&status);

    match serde_json::from_str::<E>(body) {
        Ok(envelope) if !is_success_status && envelope.succeeded() => {
            Err(RemoteError::UnexpectedStatus(status))
        }
        Ok(envelope) => Ok(envelope),
        Err(e) if is_success_status => Err(RemoteError::Malformed(e.to_string())),
        Err(_) => Err(RemoteError::UnexpectedStatus(status)),
    }
}

/// Access to the `success` flag shared by all envelopes.
trait Successful {
    fn succeeded(&self) -> bool;
}

impl Successful for ActionEnvelope {
    fn succeeded(&self) -> bool {
        self.success
    }
}

impl<T> Successful for ItemsEnvelope<T> {
    fn succeeded(&self) -> bool {
        self.success
    }
}

fn rejected(message: Option<String>) -> RemoteError {
    RemoteError::Rejected {
        message: message.filter(|m| !m.trim().is_empty()),
    }
}
