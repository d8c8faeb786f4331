//! Session credential types.
//!
//! The bearer token is issued and stored by the session layer; the cart engine
//! only carries it to the remote service.

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when parsing a [`BearerToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The token is empty or only whitespace.
    #[error("bearer token cannot be empty")]
    Empty,
    /// The token contains whitespace or control characters.
    #[error("bearer token contains invalid characters")]
    InvalidCharacters,
}

/// Opaque bearer token authorizing cart and wishlist calls.
///
/// `Debug` output is redacted.
#[derive(Debug, Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Parse a bearer token, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is blank or would not be a valid
    /// `Authorization` header value.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        if token
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(CredentialError::InvalidCharacters);
        }
        Ok(Self(SecretString::from(token.to_string())))
    }

    /// Read a token from the session store's raw value.
    ///
    /// Absent and blank values both mean "not signed in".
    #[must_use]
    pub fn from_session(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| Self::parse(value).ok())
    }

    /// Expose the token for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<SecretString> for BearerToken {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}
