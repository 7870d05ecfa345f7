//! Expansion pass and in-place refresh

use crate::bindings::{apply_editor_state, BindingTable};
use crate::dom::{Document, NodeId};
use crate::error::{ExpandError, ExpandResult};
use crate::strategy::{Strategy, TokenMatcher};
use docvar_registry::{PlaceholderRegistry, TokenClass};
use tracing::{debug, info};

/// Result of one expansion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Placeholders found on the page so far, in registry order
    pub used: Vec<String>,
    /// Every binding below the expanded root
    pub bindings: BindingTable,
}

/// Token classes whose substitution cannot be refreshed in place
fn flags_reload(class: TokenClass) -> bool {
    matches!(class, TokenClass::Normal | TokenClass::Html)
}

/// Substitute every placeholder below `root`
///
/// All tokens are matched in a single pass, each token class handled by its
/// [`Strategy`], and occurrence counts are added to `count_on_page`. Values
/// written by the pass are never scanned for tokens again, so running it
/// twice over the same subtree changes nothing even when a value holds a
/// token.
///
/// # Errors
/// [`ExpandError::UnknownNode`] for a root of another document and
/// [`ExpandError::Token`] for non-global token patterns
pub fn replace_in_subtree(
    doc: &mut Document,
    root: NodeId,
    registry: &mut PlaceholderRegistry,
) -> ExpandResult<ExpansionReport> {
    if !doc.contains(root) {
        return Err(ExpandError::UnknownNode(root.index()));
    }

    let tally = {
        let mut matcher = TokenMatcher::default();
        for placeholder in registry.iter() {
            let source = matcher.add_source(&placeholder.name, &placeholder.expanded_value);
            for class in TokenClass::ALL {
                if Strategy::for_class(class) == Strategy::EscapedMarkup
                    && !placeholder.allow_inner_html
                {
                    continue;
                }
                matcher.add_token(source, class, placeholder.tokens.get(class))?;
            }
        }
        matcher.substitute(doc, root)?
    };

    let mut placeholders: Vec<_> = registry.iter_mut().collect();
    for ((source, class), count) in tally {
        let placeholder = &mut placeholders[source];
        debug!(
            "Replaced {} via {} method {count} time(s)",
            placeholder.name,
            Strategy::for_class(class)
        );
        placeholder.count_on_page += count;
        if flags_reload(class) {
            placeholder.reload_on_change = true;
        }
    }

    let bindings = BindingTable::scan(doc, root);
    let used: Vec<String> = registry
        .iter()
        .filter(|p| p.is_used() || bindings.contains(&p.name))
        .map(|p| p.name.clone())
        .collect();
    info!(
        "Expansion pass done: {} of {} placeholders used, {} live bindings",
        used.len(),
        registry.len(),
        bindings.len()
    );
    Ok(ExpansionReport { used, bindings })
}

/// Rewrite the bindings of `names` with their expanded values
///
/// Active inline editors also get their validation or checked state
/// refreshed. Returns the number of rewritten elements.
///
/// # Errors
/// [`ExpandError::UnknownPlaceholder`] if a name is not registered
pub fn refresh(
    doc: &mut Document,
    bindings: &BindingTable,
    registry: &PlaceholderRegistry,
    names: &[String],
) -> ExpandResult<usize> {
    let mut updated = 0;
    for name in names {
        let placeholder = registry
            .get(name)
            .ok_or_else(|| ExpandError::UnknownPlaceholder(name.clone()))?;
        for &element in bindings.elements(name) {
            doc.set_text_content(element, &placeholder.expanded_value);
            apply_editor_state(doc, element, placeholder);
            updated += 1;
        }
    }
    if updated > 0 {
        debug!("Refreshed {updated} bound element(s)");
    }
    Ok(updated)
}
