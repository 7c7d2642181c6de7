//! Domain model for the Flora storefront client.
//!
//! Everything here is plain data: identifiers, fixed-point [`Money`], the
//! catalog and cart line shapes, checkout form and order payloads, and the
//! storefront [`User`]. Stateful stores live in `flora-shop`; persistence
//! media live in `flora-storage`.

pub mod error;
pub mod id;
pub mod item;
pub mod money;
pub mod order;
pub mod user;

// Re-export commonly used types
pub use error::CoreError;
pub use id::{FlowerId, OrderId};
pub use item::{CartLineItem, CatalogItem};
pub use money::Money;
pub use order::{CheckoutForm, CustomerDetails, OrderItemRequest, OrderRequest};
pub use user::User;
