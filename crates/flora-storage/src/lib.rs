//! Persistence media for the Flora storefront client.
//!
//! Provides the [`KeyValueStore`] trait defining the contract every medium
//! implements, plus [`InMemoryStore`] and [`SqliteStore`] as first-class
//! backends.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: Namespace scoping for keys
//! - [`traits`]: KeyValueStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: connection setup and embedded migrations
//! - [`sqlite`]: SqliteStore implementation

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::KeyValueStore;
pub use types::Namespace;
