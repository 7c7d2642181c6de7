//! Catalog item references and cart line items.
//!
//! A [`CatalogItem`] is the `{id, name, price, imgUrl}` shape the storefront
//! hands to the cart. A [`CartLineItem`] is that snapshot plus a quantity.
//! Name, price and image are captured at add-time and never re-fetched.

use serde::{Deserialize, Serialize};

use crate::id::FlowerId;
use crate::money::Money;

/// A sellable flower as referenced by the storefront (not owned by the cart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: FlowerId,
    pub name: String,
    #[serde(default)]
    pub price: Money,
    /// Image reference; the backend spells it either `imgUrl` or `img_url`.
    #[serde(default, alias = "img_url", skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
}

impl CatalogItem {
    pub fn new(id: impl Into<FlowerId>, name: impl Into<String>, price: Money) -> Self {
        CatalogItem {
            id: id.into(),
            name: name.into(),
            price,
            img_url: None,
        }
    }

    /// Sets the image reference.
    pub fn with_image(mut self, img_url: impl Into<String>) -> Self {
        self.img_url = Some(img_url.into());
        self
    }
}

/// One entry in the cart: a catalog snapshot and its requested quantity.
///
/// The serialized form is the persisted cart format:
/// `{"id":"f1","name":"Rose","price":"10000","imgUrl":"r.jpg","quantity":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: FlowerId,
    pub name: String,
    #[serde(default)]
    pub price: Money,
    #[serde(default, alias = "img_url", skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    /// Always at least 1 for a line held by a cart.
    pub quantity: u32,
}

impl CartLineItem {
    /// Creates a line item with quantity 1 from a catalog reference.
    pub fn from_catalog(item: CatalogItem) -> Self {
        CartLineItem {
            id: item.id,
            name: item.name,
            price: item.price,
            img_url: item.img_url,
            quantity: 1,
        }
    }

    /// Unit price times quantity.
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}
