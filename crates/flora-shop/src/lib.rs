//! Stateful storefront client services.
//!
//! Ties the domain model from `flora-core` to a persistence medium from
//! `flora-storage` and to the storefront backend.
//!
//! # Modules
//!
//! - [`cart`]: CartStore, the write-through shopping cart
//! - [`favorites`]: FavoritesStore with optimistic like toggling
//! - [`session`]: AdminSession and UserSession with route guards
//! - [`checkout`]: submit, which turns the cart into a backend order
//! - [`orders`]: PlacedOrder, OrderStatus and the OrderLog
//! - [`receipt`]: plain-text order summary
//! - [`gateway`]: OrderGateway/LikeGateway traits and the REST client
//! - [`config`]: ShopConfig read from the environment
//! - [`error`]: ShopError and GatewayError

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod favorites;
pub mod gateway;
pub mod orders;
pub mod receipt;
pub mod session;

// Re-export key types for ergonomic use.
pub use cart::{CartStore, CART_KEY};
pub use checkout::submit;
pub use config::ShopConfig;
pub use error::{GatewayError, ShopError};
pub use favorites::FavoritesStore;
pub use gateway::{LikeGateway, LikeResponse, OrderGateway, RestGateway};
pub use orders::{OrderLine, OrderLog, OrderStatus, PlacedOrder};
pub use receipt::Receipt;
pub use session::{Access, AdminSession, UserSession};
