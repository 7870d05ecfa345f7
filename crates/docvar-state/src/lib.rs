//! Placeholder state persistence
//!
//! Only the load/store contract lives here. The medium is a
//! [`StorageBackend`]; [`StateStore`] maps placeholder aspects and settings to
//! namespaced keys and validates what it reads back.

#![warn(unreachable_pub)]

mod backend;
mod error;
mod store;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use error::{StateError, StateResult};
pub use store::{StateStore, DEFAULT_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
