//! Replacement strategies
//!
//! The tokens of every placeholder are matched together, one text node or
//! attribute at a time, so a value written into the page is never scanned
//! again. Written text and attributes are sealed in the [`Document`] and
//! skipped by later passes.
//!
//! - direct: the value replaces the token as text
//! - escaped markup: as direct, and also inside attribute values
//! - live-bound: the token becomes a binding element that can be refreshed
//!   later without scanning the page again

use crate::bindings::{is_binding, BINDING_ATTRIBUTE, BINDING_CLASS, EDITOR_REQUEST_CLASS};
use crate::dom::{Document, NodeData, NodeId};
use crate::error::{ExpandError, ExpandResult};
use crate::html::{escape_html, is_raw_text_element};
use docvar_registry::{TokenClass, TokenError, TokenPattern};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// How occurrences of one token class are substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Text replacement
    Direct,
    /// Text and attribute replacement, escaped inside raw text
    EscapedMarkup,
    /// Binding elements, optionally marked for inline editing
    LiveBound { editor: bool },
}

impl Strategy {
    /// Strategy used for a token class
    #[must_use]
    pub fn for_class(class: TokenClass) -> Self {
        match class {
            TokenClass::Normal | TokenClass::Static => Self::Direct,
            TokenClass::Html => Self::EscapedMarkup,
            TokenClass::Dynamic => Self::LiveBound { editor: false },
            TokenClass::Editable => Self::LiveBound { editor: true },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::EscapedMarkup => f.write_str("escaped markup"),
            Self::LiveBound { .. } => f.write_str("live-bound"),
        }
    }
}

fn ensure_global(pattern: &TokenPattern) -> Result<(), TokenError> {
    if pattern.is_global() {
        Ok(())
    } else {
        Err(TokenError::NotGlobal(pattern.literal().to_string()))
    }
}

/// Occurrences substituted per source index and token class
pub(crate) type Tally = BTreeMap<(usize, TokenClass), usize>;

#[derive(Debug, Clone, Copy)]
struct Source<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    source: usize,
    class: TokenClass,
}

enum Piece<'a> {
    Plain(String),
    Value(String),
    Binding {
        name: &'a str,
        value: &'a str,
        editor: bool,
    },
}

/// Tokens of several placeholders substituted in one pass
#[derive(Debug, Default)]
pub(crate) struct TokenMatcher<'a> {
    sources: Vec<Source<'a>>,
    targets: HashMap<&'a str, Target>,
}

impl<'a> TokenMatcher<'a> {
    /// Register a placeholder and return its source index
    pub(crate) fn add_source(&mut self, name: &'a str, value: &'a str) -> usize {
        self.sources.push(Source { name, value });
        self.sources.len() - 1
    }

    /// Substitute `pattern` with the value of `source`, using the strategy of `class`
    ///
    /// The first source to register a literal keeps it.
    pub(crate) fn add_token(
        &mut self,
        source: usize,
        class: TokenClass,
        pattern: &'a TokenPattern,
    ) -> Result<(), TokenError> {
        ensure_global(pattern)?;
        if !pattern.literal().is_empty() {
            self.targets
                .entry(pattern.literal())
                .or_insert(Target { source, class });
        }
        Ok(())
    }

    fn alternation(&self, keep: impl Fn(&Target) -> bool) -> ExpandResult<Option<Regex>> {
        let mut literals: Vec<&str> = self
            .targets
            .iter()
            .filter(|(_, target)| keep(target))
            .map(|(literal, _)| *literal)
            .collect();
        if literals.is_empty() {
            return Ok(None);
        }
        // longest literal wins where tokens overlap
        literals.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = literals
            .iter()
            .map(|literal| regex::escape(literal))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&alternation)
            .map(Some)
            .map_err(|e| ExpandError::Matcher(e.to_string()))
    }

    /// Substitute every registered token below `root`
    ///
    /// Binding elements and sealed content are left alone.
    pub(crate) fn substitute(&self, doc: &mut Document, root: NodeId) -> ExpandResult<Tally> {
        let mut tally = Tally::new();
        let Some(text_pattern) = self.alternation(|_| true)? else {
            return Ok(tally);
        };
        let markup_pattern =
            self.alternation(|target| Strategy::for_class(target.class) == Strategy::EscapedMarkup)?;

        let (texts, elements) = unbound_nodes(doc, root);
        for id in texts {
            if !doc.is_sealed_text(id) {
                self.substitute_text(doc, id, &text_pattern, &mut tally);
            }
        }
        if let Some(pattern) = markup_pattern {
            for id in elements {
                self.substitute_attributes(doc, id, &pattern, &mut tally);
            }
        }
        Ok(tally)
    }

    fn substitute_text(&self, doc: &mut Document, id: NodeId, pattern: &Regex, tally: &mut Tally) {
        let Some(text) = doc.text(id).map(str::to_string) else {
            return;
        };
        let raw = doc
            .parent(id)
            .and_then(|parent| doc.tag(parent))
            .is_some_and(is_raw_text_element);

        let mut pieces = Vec::new();
        let mut plain = String::new();
        let mut last = 0;
        for found in pattern.find_iter(&text) {
            let Some(target) = self.targets.get(found.as_str()) else {
                continue;
            };
            plain.push_str(&text[last..found.start()]);
            last = found.end();
            let source = self.sources[target.source];
            let piece = match Strategy::for_class(target.class) {
                Strategy::LiveBound { .. } if raw => {
                    plain.push_str(found.as_str());
                    continue;
                }
                Strategy::LiveBound { editor } => Piece::Binding {
                    name: source.name,
                    value: source.value,
                    editor,
                },
                Strategy::EscapedMarkup if raw => Piece::Value(escape_html(source.value)),
                Strategy::Direct | Strategy::EscapedMarkup => Piece::Value(source.value.to_string()),
            };
            if !plain.is_empty() {
                pieces.push(Piece::Plain(std::mem::take(&mut plain)));
            }
            pieces.push(piece);
            *tally.entry((target.source, target.class)).or_default() += 1;
        }
        if pieces.is_empty() {
            return;
        }
        plain.push_str(&text[last..]);
        if !plain.is_empty() {
            pieces.push(Piece::Plain(plain));
        }

        for piece in pieces {
            let node = match piece {
                Piece::Plain(text) => doc.create_text(text),
                Piece::Value(value) => {
                    let node = doc.create_text(value);
                    doc.seal_text(node);
                    node
                }
                Piece::Binding {
                    name,
                    value,
                    editor,
                } => binding_element(doc, name, value, editor),
            };
            doc.insert_before(id, node);
        }
        doc.detach(id);
    }

    fn substitute_attributes(
        &self,
        doc: &mut Document,
        id: NodeId,
        pattern: &Regex,
        tally: &mut Tally,
    ) {
        let attributes = doc.attributes(id).to_vec();
        for (name, value) in attributes {
            if doc.is_sealed_attribute(id, &name) || !pattern.is_match(&value) {
                continue;
            }
            let replaced = pattern.replace_all(&value, |caps: &Captures<'_>| {
                let token = &caps[0];
                match self.targets.get(token) {
                    Some(target) => {
                        *tally.entry((target.source, target.class)).or_default() += 1;
                        self.sources[target.source].value.to_string()
                    }
                    None => token.to_string(),
                }
            });
            doc.set_attribute(id, &name, &replaced);
            doc.seal_attribute(id, &name);
        }
    }
}

/// Text nodes and elements below `root` in document order, skipping bindings
fn unbound_nodes(doc: &Document, root: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut texts = Vec::new();
    let mut elements = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(root).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        match doc.data(id) {
            NodeData::Text(_) => texts.push(id),
            NodeData::Element { .. } if is_binding(doc, id) => {}
            NodeData::Element { .. } => {
                elements.push(id);
                stack.extend(doc.children(id).iter().rev().copied());
            }
            _ => stack.extend(doc.children(id).iter().rev().copied()),
        }
    }
    (texts, elements)
}

fn binding_element(doc: &mut Document, name: &str, value: &str, editor: bool) -> NodeId {
    let class = if editor {
        format!("{BINDING_CLASS} {EDITOR_REQUEST_CLASS}")
    } else {
        BINDING_CLASS.to_string()
    };
    let span = doc.create_element(
        "span",
        vec![
            ("class".to_string(), class),
            (BINDING_ATTRIBUTE.to_string(), name.to_string()),
        ],
    );
    if !value.is_empty() {
        let text = doc.create_text(value);
        doc.append_child(span, text);
    }
    span
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvar_registry::{PlaceholderTokens, Settings};
    use pretty_assertions::assert_eq;

    /// Substitute one placeholder for the given classes
    fn expand(doc: &mut Document, name: &str, value: &str, classes: &[TokenClass]) -> Tally {
        let tokens = PlaceholderTokens::new(name, &Settings::default());
        let mut matcher = TokenMatcher::default();
        let source = matcher.add_source(name, value);
        for &class in classes {
            matcher.add_token(source, class, tokens.get(class)).unwrap();
        }
        let root = doc.root();
        matcher.substitute(doc, root).unwrap()
    }

    #[test]
    fn direct_counts_occurrences() {
        let mut doc = Document::parse("<p>xAx and xAx</p><p>xAx</p><p>none</p>");
        let tally = expand(&mut doc, "A", "<v>", &[TokenClass::Normal]);
        assert_eq!(tally[&(0, TokenClass::Normal)], 3);
        assert_eq!(doc.to_html(), "<p>&lt;v&gt; and &lt;v&gt;</p><p>&lt;v&gt;</p><p>none</p>");
    }

    #[test]
    fn direct_skips_bindings_and_attributes() {
        let mut doc = Document::parse(
            r#"<a href="xAx">xAx</a><span class="placeholder-value" data-placeholder="B">xAx</span>"#,
        );
        expand(&mut doc, "A", "1", &[TokenClass::Normal]);
        assert_eq!(
            doc.to_html(),
            r#"<a href="xAx">1</a><span class="placeholder-value" data-placeholder="B">xAx</span>"#
        );
    }

    #[test]
    fn non_global_pattern_is_rejected() {
        let pattern = TokenPattern::new("A", "x", "x").first_only();
        let mut matcher = TokenMatcher::default();
        let source = matcher.add_source("A", "1");
        assert_eq!(
            matcher.add_token(source, TokenClass::Normal, &pattern),
            Err(TokenError::NotGlobal("xAx".to_string()))
        );
    }

    #[test]
    fn written_values_are_not_scanned_again() {
        let mut doc = Document::parse("<p>xAx xBx</p>");
        let a = PlaceholderTokens::new("A", &Settings::default());
        let b = PlaceholderTokens::new("B", &Settings::default());
        let mut matcher = TokenMatcher::default();
        let first = matcher.add_source("A", "xBx");
        let second = matcher.add_source("B", "[xAx]");
        matcher.add_token(first, TokenClass::Normal, a.normal()).unwrap();
        matcher.add_token(second, TokenClass::Normal, b.normal()).unwrap();

        let root = doc.root();
        matcher.substitute(&mut doc, root).unwrap();
        assert_eq!(doc.to_html(), "<p>xBx [xAx]</p>");

        let tally = matcher.substitute(&mut doc, root).unwrap();
        assert!(tally.is_empty());
        assert_eq!(doc.to_html(), "<p>xBx [xAx]</p>");
    }

    #[test]
    fn escaped_markup_reaches_attributes_and_raw_text() {
        let mut doc = Document::parse(r#"<a href="/iAi/">iAi</a><script>var a = "iAi";</script>"#);
        let value = r#"<script>"x"</script>"#;
        let tally = expand(&mut doc, "A", value, &[TokenClass::Html]);
        assert_eq!(tally[&(0, TokenClass::Html)], 3);

        let root = doc.root();
        let link = doc.children(root)[0];
        assert_eq!(doc.attribute(link, "href"), Some(format!("/{value}/").as_str()));
        assert!(doc.is_sealed_attribute(link, "href"));
        assert_eq!(doc.text_content(link), value);
        let script = doc.children(root)[1];
        assert_eq!(doc.children(script).len(), 3);
        assert_eq!(doc.text_content(script), format!(r#"var a = "{}";"#, escape_html(value)));
    }

    #[test]
    fn escaped_markup_keeps_binding_identity() {
        let mut doc = Document::parse(
            r#"<p>iAi <span class="placeholder-value" data-placeholder="A" title="iAi">iAi</span></p>"#,
        );
        let root = doc.root();
        let binding = doc.find_elements(root, is_binding)[0];
        expand(&mut doc, "A", "v", &[TokenClass::Html]);

        assert_eq!(doc.find_elements(root, is_binding), vec![binding]);
        assert_eq!(
            doc.to_html(),
            r#"<p>v <span class="placeholder-value" data-placeholder="A" title="iAi">iAi</span></p>"#
        );
    }

    #[test]
    fn live_bind_wraps_each_occurrence_once() {
        let mut doc = Document::parse("<p>go dAd, then dAd.</p><script>dAd</script>");
        let tally = expand(&mut doc, "A", "v", &[TokenClass::Dynamic]);
        assert_eq!(tally[&(0, TokenClass::Dynamic)], 2);
        let expected = concat!(
            r#"<p>go <span class="placeholder-value" data-placeholder="A">v</span>, "#,
            r#"then <span class="placeholder-value" data-placeholder="A">v</span>.</p>"#,
            "<script>dAd</script>"
        );
        assert_eq!(doc.to_html(), expected);

        let tally = expand(&mut doc, "A", "v", &[TokenClass::Dynamic]);
        assert!(tally.is_empty());
        assert_eq!(doc.to_html(), expected);
    }

    #[test]
    fn longest_token_wins() {
        let mut doc = Document::parse("<p>xAxBx xAx</p>");
        let a = PlaceholderTokens::new("A", &Settings::default());
        let ab = PlaceholderTokens::new("AxB", &Settings::default());
        let mut matcher = TokenMatcher::default();
        let short = matcher.add_source("A", "short");
        let long = matcher.add_source("AxB", "long");
        matcher.add_token(short, TokenClass::Normal, a.normal()).unwrap();
        matcher.add_token(long, TokenClass::Normal, ab.normal()).unwrap();
        let root = doc.root();
        matcher.substitute(&mut doc, root).unwrap();
        assert_eq!(doc.to_html(), "<p>long short</p>");
    }

    #[test]
    fn strategies_per_class() {
        assert_eq!(Strategy::for_class(TokenClass::Normal), Strategy::Direct);
        assert_eq!(Strategy::for_class(TokenClass::Static), Strategy::Direct);
        assert_eq!(Strategy::for_class(TokenClass::Html), Strategy::EscapedMarkup);
        assert_eq!(
            Strategy::for_class(TokenClass::Editable),
            Strategy::LiveBound { editor: true }
        );
    }
}
