//! Data for auto-generated placeholder tables

use crate::engine::EngineState;
use serde::Serialize;

/// One editable placeholder used on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    /// Placeholder name
    pub name: String,
    /// Description from the descriptor
    pub description: String,
    /// `textbox`, `checkbox` or `dropdown`
    pub kind: &'static str,
    /// Current raw value
    pub value: String,
    /// Value after substitution of nested placeholders
    pub expanded_value: String,
}

/// Editable placeholders used on the page, in descriptor order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// Rows sorted by descriptor order
    pub rows: Vec<SummaryRow>,
}

impl PageSummary {
    /// Collect the rows from the current engine state
    #[must_use]
    pub fn collect(engine: &EngineState) -> Self {
        let registry = engine.registry();
        let mut used: Vec<_> = engine
            .used_placeholders()
            .iter()
            .filter_map(|name| registry.get(name))
            .filter(|p| !p.read_only)
            .collect();
        used.sort_by_key(|p| p.order_index);

        let rows = used
            .into_iter()
            .map(|p| SummaryRow {
                name: p.name.clone(),
                description: p.description.clone(),
                kind: p.kind.kind_name(),
                value: p.current_value.clone(),
                expanded_value: p.expanded_value.clone(),
            })
            .collect();
        Self { rows }
    }

    /// Row names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.name.as_str())
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Nothing to show
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Page;
    use docvar_expand::Document;
    use docvar_registry::{Capabilities, Descriptor};
    use docvar_state::MemoryStorage;
    use docvar_test_utils::SAMPLE_DESCRIPTOR;
    use pretty_assertions::assert_eq;

    fn engine() -> EngineState {
        let descriptor = Descriptor::from_yaml_str(SAMPLE_DESCRIPTOR).unwrap();
        EngineState::new(&descriptor, Box::new(MemoryStorage::new()), &Capabilities::new())
    }

    #[test]
    fn read_only_rows_are_left_out() {
        let mut engine = engine();
        engine
            .attach_page(Page::new(Document::parse("<p>dPORTd then xURLx</p>")))
            .unwrap();
        let summary = PageSummary::collect(&engine);
        assert_eq!(summary.names().collect::<Vec<_>>(), vec!["HOST", "TLS", "PORT"]);
        assert_eq!(summary.rows[0].kind, "textbox");
        assert_eq!(summary.rows[2].value, "443");
    }

    #[test]
    fn unused_page_gives_empty_summary() {
        let mut engine = engine();
        engine.attach_page(Page::new(Document::parse("<p>nothing</p>"))).unwrap();
        assert!(PageSummary::collect(&engine).is_empty());
    }
}
