//! Core error types for flora-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of the domain model: price parsing and checkout form
//! validation.

use thiserror::Error;

/// Core errors produced by the flora-core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A price string could not be read as a non-negative decimal amount.
    #[error("invalid price: '{input}'")]
    InvalidPrice { input: String },

    /// A price does not fit the fixed-point representation.
    #[error("price out of range: '{input}'")]
    PriceOverflow { input: String },

    /// A required checkout form field was empty after trimming.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}
