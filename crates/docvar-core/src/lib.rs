//! Docvar Core - placeholder engine for documentation pages
//!
//! Ties the components together into one [`EngineState`] per page view:
//! - Parses the descriptor and loads persisted values
//! - Builds the dependency graph and runs the expansion pass
//! - Runs the change cycle for every user edit
//! - Hands out inline editor listeners that can be revoked together
//!
//! # Core Concepts
//!
//! A change always runs validate → store → graph update → refresh. The
//! returned [`ChangeOutcome`] lists the affected placeholders and whether the
//! host has to reload the page because some occurrence was substituted in a
//! way that cannot be refreshed in place.
//!
//! # Example
//!
//! ```rust,ignore
//! use docvar_core::{Capabilities, Descriptor, Document, EngineState, MemoryStorage, Page};
//!
//! let descriptor = Descriptor::from_path("placeholders.yaml")?;
//! let mut engine = EngineState::new(&descriptor, Box::new(MemoryStorage::new()), &Capabilities::new());
//! engine.attach_page(Page::new(Document::parse(&html)))?;
//!
//! let outcome = engine.set_text("HOST", "docs.example.org")?;
//! if outcome.requires_reload {
//!     // re-render from scratch
//! }
//! ```

#![warn(unreachable_pub)]

mod engine;
mod error;
mod interaction;
mod startup;
mod summary;

pub use engine::{ChangeOutcome, EngineState, Page};
pub use error::{EngineError, EngineResult};
pub use interaction::{EditorEvent, EditorKind, EditorListener, InteractionHub, RevocationToken};
pub use startup::StartupTrigger;
pub use summary::{PageSummary, SummaryRow};

pub use docvar_expand::{Document, NodeId};
pub use docvar_registry::{BehaviourSetting, Capabilities, Descriptor, Settings};
pub use docvar_state::{FileStorage, MemoryStorage, StorageBackend};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
