//! Identifier newtypes for catalog and order entities.
//!
//! Identifiers are owned by the backend and arrive as opaque strings, so
//! both newtypes wrap `String`. They are distinct types so that a
//! `FlowerId` cannot be accidentally used where an `OrderId` is expected.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog item (a flower). Unique key within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowerId(pub String);

/// Identifier the backend assigns to a created order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FlowerId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl OrderId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for FlowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Lookups keyed by `&str` (e.g. `IndexMap<FlowerId, _>::get("f1")`).

impl Borrow<str> for FlowerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FlowerId {
    fn from(s: &str) -> Self {
        FlowerId(s.to_string())
    }
}

impl From<String> for FlowerId {
    fn from(s: String) -> Self {
        FlowerId(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        OrderId(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        OrderId(s)
    }
}
