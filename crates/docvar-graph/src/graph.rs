//! Dependency graph
//!
//! An edge `A -> B` means "A's current value contains B's token", so A
//! depends on B. Edges are discovered by scanning values, never declared,
//! and only leave placeholders that allow recursion.
//!
//! The graph stores names only. Values live in the
//! [`PlaceholderRegistry`], which every operation receives explicitly.

use crate::error::{GraphError, GraphResult};
use crate::substitute::expand_value;
use docvar_registry::{Placeholder, PlaceholderRegistry, TokenClass};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use tracing::{debug, info, warn};

type NodeIx = usize;

/// DFS colouring used by cycle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Directed graph of placeholder references
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    inner: DiGraphMap<NodeIx, ()>,
    names: Vec<String>,
    ids: HashMap<String, NodeIx>,
}

impl DependencyGraph {
    /// Build the graph over every placeholder and compute all expanded values
    ///
    /// Values are scanned in registry order. A reference that would close a
    /// cycle is dropped at the placeholder being scanned, exactly like an
    /// edit would; each such repair is returned as an error.
    #[must_use]
    pub fn build(registry: &mut PlaceholderRegistry) -> (Self, Vec<GraphError>) {
        let mut graph = Self::default();
        for placeholder in registry.iter() {
            let ix = graph.names.len();
            graph.names.push(placeholder.name.clone());
            graph.ids.insert(placeholder.name.clone(), ix);
            graph.inner.add_node(ix);
        }

        let mut errors = Vec::new();
        for ix in 0..graph.names.len() {
            graph.update_downlinks(registry, ix);
            if let Some(cycle) = graph.find_cycle() {
                errors.push(graph.break_cycle(registry, ix, &cycle));
            }
        }

        if let Err(e) = graph.recompute_all(registry) {
            errors.push(e);
        }
        info!(
            "Built dependency graph with {} nodes and {} edges",
            graph.inner.node_count(),
            graph.inner.edge_count()
        );
        (graph, errors)
    }

    fn id(&self, name: &str) -> GraphResult<NodeIx> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownPlaceholder(name.to_string()))
    }

    fn placeholder<'r>(&self, registry: &'r PlaceholderRegistry, ix: NodeIx) -> Option<&'r Placeholder> {
        registry.get(&self.names[ix])
    }

    /// Re-derive the outgoing edges of `ix` from its current value
    fn update_downlinks(&mut self, registry: &PlaceholderRegistry, ix: NodeIx) {
        let Some(placeholder) = self.placeholder(registry, ix) else {
            return;
        };
        if !placeholder.allow_recursive {
            return;
        }

        let old: Vec<NodeIx> = self.inner.neighbors_directed(ix, Direction::Outgoing).collect();
        for target in old {
            self.inner.remove_edge(ix, target);
        }

        let value = &placeholder.current_value;
        for (other_ix, other_name) in self.names.iter().enumerate() {
            // self-references stay literal text
            if other_ix == ix {
                continue;
            }
            let Some(other) = registry.get(other_name) else {
                continue;
            };
            if references(value, other) {
                self.inner.add_edge(ix, other_ix, ());
            }
        }
    }

    fn clear_downlinks(&mut self, ix: NodeIx) {
        let old: Vec<NodeIx> = self.inner.neighbors_directed(ix, Direction::Outgoing).collect();
        for target in old {
            self.inner.remove_edge(ix, target);
        }
    }

    /// Drop the references of `ix` and report the cycle they closed
    fn break_cycle(&mut self, registry: &mut PlaceholderRegistry, ix: NodeIx, cycle: &[NodeIx]) -> GraphError {
        let name = self.names[ix].clone();
        let cycle: Vec<String> = cycle.iter().map(|&c| self.names[c].clone()).collect();
        warn!("Dependency cycle in placeholders detected: {}", cycle.join(" -> "));

        self.clear_downlinks(ix);
        if let Some(placeholder) = registry.get_mut(&name) {
            placeholder.expanded_value = placeholder.current_value.clone();
        }
        GraphError::CycleDetected { name, cycle }
    }

    /// First cycle found, as a closed path `a -> b -> ... -> a`
    ///
    /// White/gray/black DFS started from every unvisited node, since the
    /// graph is generally disconnected.
    #[must_use]
    fn find_cycle(&self) -> Option<Vec<NodeIx>> {
        let mut marks = vec![Mark::White; self.names.len()];
        let mut path = Vec::new();
        for start in 0..self.names.len() {
            if marks[start] == Mark::White {
                if let Some(cycle) = self.visit(start, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit(&self, ix: NodeIx, marks: &mut [Mark], path: &mut Vec<NodeIx>) -> Option<Vec<NodeIx>> {
        marks[ix] = Mark::Gray;
        path.push(ix);
        for next in self.inner.neighbors_directed(ix, Direction::Outgoing) {
            match marks[next] {
                Mark::Gray => {
                    let start = path.iter().position(|&p| p == next).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Mark::White => {
                    if let Some(cycle) = self.visit(next, marks, path) {
                        return Some(cycle);
                    }
                }
                Mark::Black => {}
            }
        }
        path.pop();
        marks[ix] = Mark::Black;
        None
    }

    /// Whether the graph currently contains a cycle
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Recompute the expanded value of `name`
    ///
    /// With `recursive`, every transitive dependent is recomputed as well,
    /// dependencies first.
    pub fn recompute(
        &self,
        registry: &mut PlaceholderRegistry,
        name: &str,
        recursive: bool,
    ) -> GraphResult<()> {
        let ix = self.id(name)?;
        if !recursive {
            return self.recompute_node(registry, ix);
        }

        let mut targets = self.closure(ix, Direction::Incoming);
        targets.insert(ix);
        for node in self.dependency_order()? {
            if targets.contains(&node) {
                self.recompute_node(registry, node)?;
            }
        }
        Ok(())
    }

    fn recompute_all(&self, registry: &mut PlaceholderRegistry) -> GraphResult<()> {
        for ix in self.dependency_order()? {
            self.recompute_node(registry, ix)?;
        }
        Ok(())
    }

    fn recompute_node(&self, registry: &mut PlaceholderRegistry, ix: NodeIx) -> GraphResult<()> {
        let snapshot: &PlaceholderRegistry = registry;
        let dependencies: Vec<&Placeholder> = self
            .inner
            .neighbors_directed(ix, Direction::Outgoing)
            .filter_map(|dep| self.placeholder(snapshot, dep))
            .collect();
        let Some(placeholder) = self.placeholder(snapshot, ix) else {
            return Ok(());
        };
        let expanded = expand_value(&placeholder.current_value, &dependencies)?;
        if let Some(placeholder) = registry.get_mut(&self.names[ix]) {
            placeholder.expanded_value = expanded;
        }
        Ok(())
    }

    /// All nodes ordered so that dependencies come before their dependents
    fn dependency_order(&self) -> GraphResult<Vec<NodeIx>> {
        let mut order = toposort(&self.inner, None).map_err(|cycle| {
            let name = self.names[cycle.node_id()].clone();
            GraphError::CycleDetected {
                cycle: vec![name.clone()],
                name,
            }
        })?;
        order.reverse();
        Ok(order)
    }

    /// React to a changed current value of `name`
    ///
    /// Re-derives the node's references and checks the whole graph for
    /// cycles. On a cycle the node's references are dropped, its expanded
    /// value becomes its raw value and [`GraphError::CycleDetected`] is
    /// returned after its dependents were brought up to date. Otherwise the
    /// node and all its dependents are recomputed.
    pub fn on_value_changed(&mut self, registry: &mut PlaceholderRegistry, name: &str) -> GraphResult<()> {
        let ix = self.id(name)?;
        self.update_downlinks(registry, ix);

        if let Some(cycle) = self.find_cycle() {
            let error = self.break_cycle(registry, ix, &cycle);
            self.recompute(registry, name, true)?;
            return Err(error);
        }

        debug!("Recomputing '{name}' and its dependents");
        self.recompute(registry, name, true)
    }

    fn closure(&self, ix: NodeIx, direction: Direction) -> HashSet<NodeIx> {
        let mut visited = HashSet::new();
        let mut stack = vec![ix];
        while let Some(node) = stack.pop() {
            for next in self.inner.neighbors_directed(node, direction) {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
        visited.remove(&ix);
        visited
    }

    fn names_of(&self, set: &HashSet<NodeIx>) -> Vec<String> {
        let mut ids: Vec<NodeIx> = set.iter().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(|ix| self.names[ix].clone()).collect()
    }

    /// Every placeholder that transitively depends on `name`, excluding itself
    pub fn upstream(&self, name: &str) -> GraphResult<Vec<String>> {
        let ix = self.id(name)?;
        Ok(self.names_of(&self.closure(ix, Direction::Incoming)))
    }

    /// Every placeholder `name` transitively depends on, excluding itself
    pub fn downstream(&self, name: &str) -> GraphResult<Vec<String>> {
        let ix = self.id(name)?;
        Ok(self.names_of(&self.closure(ix, Direction::Outgoing)))
    }

    /// Direct dependencies of `name`
    pub fn dependencies(&self, name: &str) -> GraphResult<Vec<String>> {
        let ix = self.id(name)?;
        let set = self.inner.neighbors_directed(ix, Direction::Outgoing).collect();
        Ok(self.names_of(&set))
    }

    /// Placeholders on the page plus everything they depend on
    #[must_use]
    pub fn used_placeholders(&self, registry: &PlaceholderRegistry) -> Vec<String> {
        let mut used = HashSet::new();
        for (ix, name) in self.names.iter().enumerate() {
            if registry.get(name).is_some_and(Placeholder::is_used) {
                used.insert(ix);
                used.extend(self.closure(ix, Direction::Outgoing));
            }
        }
        self.names_of(&used)
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// One line per node with its expanded value and dependencies
    #[must_use]
    pub fn debug_representation(&self, registry: &PlaceholderRegistry) -> String {
        let mut text = String::from("Dependency graph nodes:");
        for (ix, name) in self.names.iter().enumerate() {
            let expanded = registry.get(name).map_or("", |p| p.expanded_value.as_str());
            let set = self.inner.neighbors_directed(ix, Direction::Outgoing).collect();
            let dependencies = self.names_of(&set);
            if dependencies.is_empty() {
                let _ = write!(text, "\n{name} ({expanded}) has no dependencies");
            } else {
                let _ = write!(text, "\n{name} ({expanded}) depends on {}", dependencies.join(", "));
            }
        }
        text
    }
}

/// Whether `value` contains any token of `other`
fn references(value: &str, other: &Placeholder) -> bool {
    TokenClass::ALL
        .into_iter()
        .any(|class| other.tokens.get(class).is_match(value))
}
