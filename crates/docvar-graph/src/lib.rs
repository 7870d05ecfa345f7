//! Placeholder dependency graph
//!
//! Placeholders whose values contain other placeholders' tokens depend on
//! them. The graph keeps those references acyclic, computes expanded values
//! dependencies-first and answers which placeholders a change affects.
//!
//! # Example
//!
//! ```rust,ignore
//! use docvar_graph::DependencyGraph;
//!
//! let (mut graph, problems) = DependencyGraph::build(&mut registry);
//! registry.get_mut("GREETING").unwrap().current_value = "Hi".into();
//! graph.on_value_changed(&mut registry, "GREETING")?;
//! ```

#![warn(unreachable_pub)]

mod error;
mod graph;
mod substitute;

pub use error::{GraphError, GraphResult};
pub use graph::DependencyGraph;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
