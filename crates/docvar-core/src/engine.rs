//! Engine state owned by one page view
//!
//! Every change runs the same chain: validate, store, update the graph,
//! refresh bound elements. Nothing in the chain yields, so one change is
//! complete before the next one starts.

use crate::error::{EngineError, EngineResult};
use docvar_expand::{refresh, replace_in_subtree, BindingTable, Document, NodeId};
use docvar_graph::DependencyGraph;
use docvar_registry::{
    BehaviourSetting, Capabilities, Descriptor, Placeholder, PlaceholderKind, PlaceholderRegistry,
    Settings,
};
use docvar_state::{StateStore, StorageBackend};
use docvar_validator::Verdict;
use std::fmt;
use tracing::{debug, info, warn};

/// Result of a change operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeOutcome {
    /// Changed placeholder followed by everything depending on it
    pub affected: Vec<String>,
    /// An affected placeholder was substituted where it cannot be refreshed
    pub requires_reload: bool,
    /// Bound elements rewritten in place
    pub refreshed: usize,
}

/// Expanded document and its bindings
#[derive(Debug, Clone)]
pub struct Page {
    pub(crate) document: Document,
    pub(crate) root: NodeId,
    pub(crate) bindings: BindingTable,
}

impl Page {
    /// Page expanded from the document root
    #[must_use]
    pub fn new(document: Document) -> Self {
        let root = document.root();
        Self::with_root(document, root)
    }

    /// Page expanded from a subtree
    #[must_use]
    pub fn with_root(document: Document, root: NodeId) -> Self {
        Self {
            document,
            root,
            bindings: BindingTable::default(),
        }
    }

    /// The document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Root of the expanded subtree
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Bindings found by the last expansion pass
    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Whole document as markup
    #[must_use]
    pub fn to_html(&self) -> String {
        self.document.to_html()
    }
}

/// Everything a page view owns
pub struct EngineState {
    registry: PlaceholderRegistry,
    graph: DependencyGraph,
    store: StateStore,
    page: Option<Page>,
    diagnostics: Vec<EngineError>,
}

impl fmt::Debug for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineState")
            .field("placeholders", &self.registry.len())
            .field("edges", &self.graph.edge_count())
            .field("store", &self.store)
            .field("page", &self.page.is_some())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

fn changeable<'a>(registry: &'a mut PlaceholderRegistry, name: &str) -> EngineResult<&'a mut Placeholder> {
    let placeholder = registry
        .get_mut(name)
        .ok_or_else(|| EngineError::UnknownPlaceholder(name.to_string()))?;
    if placeholder.read_only {
        return Err(EngineError::ReadOnly(name.to_string()));
    }
    Ok(placeholder)
}

fn kind_mismatch(placeholder: &Placeholder, expected: &'static str) -> EngineError {
    EngineError::KindMismatch {
        name: placeholder.name.clone(),
        expected,
        actual: placeholder.kind.kind_name(),
    }
}

impl EngineState {
    /// Parse the descriptor, load stored values and build the graph
    ///
    /// Broken placeholders and repaired cycles do not stop the engine; they
    /// are kept in [`EngineState::diagnostics`].
    #[must_use]
    pub fn new(
        descriptor: &Descriptor,
        storage: Box<dyn StorageBackend>,
        capabilities: &Capabilities,
    ) -> Self {
        let store = StateStore::with_prefix(storage, descriptor.settings.storage_prefix.clone());
        let (mut registry, parse_errors) = PlaceholderRegistry::parse(descriptor, capabilities);
        let mut diagnostics: Vec<EngineError> =
            parse_errors.into_iter().map(EngineError::from).collect();

        registry.settings_mut().apply_overrides(&store);
        registry.load_state(&store);

        let (graph, graph_errors) = DependencyGraph::build(&mut registry);
        diagnostics.extend(graph_errors.into_iter().map(EngineError::from));
        if registry.settings().debug {
            debug!("{}", graph.debug_representation(&registry));
        }
        for diagnostic in &diagnostics {
            warn!("{diagnostic}");
        }
        info!(
            "Engine ready with {} placeholders ({} diagnostics)",
            registry.len(),
            diagnostics.len()
        );

        Self {
            registry,
            graph,
            store,
            page: None,
            diagnostics,
        }
    }

    /// Placeholder records
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &PlaceholderRegistry {
        &self.registry
    }

    /// Dependency graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Persisted state
    #[inline]
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Effective settings, user overrides applied
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &Settings {
        self.registry.settings()
    }

    /// Recoverable problems collected so far
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[EngineError] {
        &self.diagnostics
    }

    /// Hand the collected problems to the caller
    pub fn take_diagnostics(&mut self) -> Vec<EngineError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Attached page
    #[inline]
    #[must_use]
    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    pub(crate) fn page_parts(&mut self) -> Option<(&mut Page, &PlaceholderRegistry)> {
        let registry = &self.registry;
        self.page.as_mut().map(|page| (page, registry))
    }

    /// Run the expansion pass over a page and keep it for in-place refreshes
    ///
    /// Returns the placeholders found on the page.
    pub fn attach_page(&mut self, mut page: Page) -> EngineResult<Vec<String>> {
        let report = replace_in_subtree(&mut page.document, page.root, &mut self.registry)?;
        page.bindings = report.bindings;
        self.page = Some(page);
        Ok(report.used)
    }

    /// Run the expansion pass again over the attached page
    pub fn rerun_expansion(&mut self) -> EngineResult<Vec<String>> {
        let page = self.page.as_mut().ok_or(EngineError::NoPage)?;
        let report = replace_in_subtree(&mut page.document, page.root, &mut self.registry)?;
        page.bindings = report.bindings;
        Ok(report.used)
    }

    /// Give up the attached page
    pub fn detach_page(&mut self) -> Option<Page> {
        self.page.take()
    }

    /// Validation verdict for a candidate value
    pub fn evaluate(&self, name: &str, value: &str) -> EngineResult<Verdict> {
        self.registry
            .get(name)
            .map(|p| p.evaluate(value))
            .ok_or_else(|| EngineError::UnknownPlaceholder(name.to_string()))
    }

    /// Change the text of a textbox
    ///
    /// # Errors
    /// [`EngineError::ValidationRejected`] if no rule-set accepts the value;
    /// warnings do not block.
    pub fn set_text(&mut self, name: &str, value: &str) -> EngineResult<ChangeOutcome> {
        let placeholder = changeable(&mut self.registry, name)?;
        if !matches!(placeholder.kind, PlaceholderKind::Textbox(_)) {
            return Err(kind_mismatch(placeholder, "textbox"));
        }
        if !placeholder.is_valid_value(value) {
            return Err(EngineError::ValidationRejected {
                name: name.to_string(),
                value: value.to_string(),
                message: placeholder.evaluate(value).message,
            });
        }
        self.store.store_text(name, value)?;
        placeholder.current_value = value.to_string();
        self.commit(name)
    }

    /// Change the state of a checkbox
    pub fn set_checked(&mut self, name: &str, checked: bool) -> EngineResult<ChangeOutcome> {
        let placeholder = changeable(&mut self.registry, name)?;
        let mismatch = kind_mismatch(placeholder, "checkbox");
        let PlaceholderKind::Checkbox(data) = &mut placeholder.kind else {
            return Err(mismatch);
        };
        data.store(name, &mut self.store, checked)?;
        placeholder.sync_value_from_kind();
        self.commit(name)
    }

    /// Flip the state of a checkbox
    pub fn toggle_checked(&mut self, name: &str) -> EngineResult<ChangeOutcome> {
        let checked = match self.registry.get(name).map(|p| (p, &p.kind)) {
            Some((_, PlaceholderKind::Checkbox(data))) => data.current_is_checked,
            Some((p, _)) => return Err(kind_mismatch(p, "checkbox")),
            None => return Err(EngineError::UnknownPlaceholder(name.to_string())),
        };
        self.set_checked(name, !checked)
    }

    /// Select a dropdown option by index
    ///
    /// # Errors
    /// [`EngineError::Persistence`] for an index outside the options
    pub fn select_index(&mut self, name: &str, index: usize) -> EngineResult<ChangeOutcome> {
        let placeholder = changeable(&mut self.registry, name)?;
        let mismatch = kind_mismatch(placeholder, "dropdown");
        let PlaceholderKind::Dropdown(data) = &mut placeholder.kind else {
            return Err(mismatch);
        };
        data.store(name, &mut self.store, index)?;
        placeholder.sync_value_from_kind();
        self.commit(name)
    }

    /// Move the dropdown selection by `delta` options, wrapping around
    pub fn cycle_index(&mut self, name: &str, delta: isize) -> EngineResult<ChangeOutcome> {
        let index = match self.registry.get(name).map(|p| (p, &p.kind)) {
            Some((_, PlaceholderKind::Dropdown(data))) => data.wrapped_index(delta),
            Some((p, _)) => return Err(kind_mismatch(p, "dropdown")),
            None => return Err(EngineError::UnknownPlaceholder(name.to_string())),
        };
        self.select_index(name, index)
    }

    /// Change a behaviour toggle and persist the user override
    pub fn set_behaviour(&mut self, setting: BehaviourSetting, value: bool) -> EngineResult<()> {
        self.registry
            .settings_mut()
            .set_override(&mut self.store, setting, value)?;
        Ok(())
    }

    /// Forget every stored value and return to the defaults
    pub fn reset_all_state(&mut self) -> EngineResult<ChangeOutcome> {
        self.store.clear_placeholders()?;
        self.registry.reset_to_defaults();
        let (graph, errors) = DependencyGraph::build(&mut self.registry);
        self.graph = graph;
        self.diagnostics.extend(errors.into_iter().map(EngineError::from));
        info!("All placeholder values were reset");
        self.propagate(self.registry.names())
    }

    /// Adapter callback: the current value of `name` was changed in place
    pub fn on_placeholder_changed(&mut self, name: &str) -> EngineResult<ChangeOutcome> {
        if !self.registry.contains(name) {
            return Err(EngineError::UnknownPlaceholder(name.to_string()));
        }
        self.commit(name)
    }

    /// Adapter callback: everything that transitively depends on `name`
    pub fn upstream_dependents(&self, name: &str) -> EngineResult<Vec<String>> {
        Ok(self.graph.upstream(name)?)
    }

    /// Adapter callback: placeholders on the page plus their dependencies
    #[must_use]
    pub fn used_placeholders(&self) -> Vec<String> {
        self.graph.used_placeholders(&self.registry)
    }

    /// Adapter callback: expanded value of `name`
    pub fn expanded_value(&self, name: &str) -> EngineResult<&str> {
        self.registry
            .get(name)
            .map(|p| p.expanded_value.as_str())
            .ok_or_else(|| EngineError::UnknownPlaceholder(name.to_string()))
    }

    /// Graph update and refresh after the current value of `name` changed
    ///
    /// A repaired cycle is reported after the refresh, together with its outcome.
    fn commit(&mut self, name: &str) -> EngineResult<ChangeOutcome> {
        let cycle = match self.graph.on_value_changed(&mut self.registry, name) {
            Ok(()) => None,
            Err(e) if e.is_recoverable() => Some(e),
            Err(e) => return Err(e.into()),
        };
        let mut affected = vec![name.to_string()];
        affected.extend(self.graph.upstream(name)?);
        let outcome = self.propagate(affected)?;
        match cycle {
            Some(source) => Err(EngineError::CycleRepaired { source, outcome }),
            None => Ok(outcome),
        }
    }

    fn propagate(&mut self, affected: Vec<String>) -> EngineResult<ChangeOutcome> {
        let refreshed = match &mut self.page {
            Some(page) => refresh(&mut page.document, &page.bindings, &self.registry, &affected)?,
            None => 0,
        };
        let requires_reload = affected
            .iter()
            .filter_map(|name| self.registry.get(name))
            .any(|p| p.reload_on_change);
        debug!(
            "Change affected {} placeholder(s), {refreshed} element(s) refreshed, reload needed: {requires_reload}",
            affected.len()
        );
        Ok(ChangeOutcome {
            affected,
            requires_reload,
            refreshed,
        })
    }
}
