//! Error types for the shop layer.
//!
//! [`ShopError`] is the unified error for operations that can fail in a way
//! the caller must see (checkout, session login, reconciled likes).
//! [`GatewayError`] covers the REST backend. Cart mutations never return
//! errors; their persistence failures are logged instead.

use flora_core::CoreError;
use flora_storage::StorageError;
use thiserror::Error;

/// Failures talking to the storefront backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be sent or the response not read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The order was created but the response carried no id.
    #[error("order created but no id returned")]
    MissingOrderId,

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// True for 401/403 answers, after which stored credentials are stale.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Status { status: 401 | 403, .. })
    }
}

/// Errors surfaced by shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// An operation needed a logged-in user.
    #[error("not logged in")]
    NotLoggedIn,

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}
