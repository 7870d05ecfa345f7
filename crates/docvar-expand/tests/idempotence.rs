use docvar_expand::{replace_in_subtree, Document};
use docvar_registry::PlaceholderRegistry;
use docvar_test_utils::{registry_with, textbox};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const NAMES: [&str; 3] = ["A", "B", "C"];
const AFFIXES: [char; 5] = ['x', 's', 'i', 'd', 'e'];

fn token() -> impl Strategy<Value = String> {
    (0..NAMES.len(), 0..AFFIXES.len()).prop_map(|(n, a)| {
        let affix = AFFIXES[a];
        format!("{affix}{}{affix}", NAMES[n])
    })
}

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{1,6}",
        token(),
        token().prop_map(|t| format!("<b>{t}</b>")),
        token().prop_map(|t| format!(r#"<a href="/{t}/">{t}</a>"#)),
    ]
}

fn page() -> impl Strategy<Value = String> {
    proptest::collection::vec(fragment(), 0..10).prop_map(|parts| format!("<div>{}</div>", parts.concat()))
}

/// Values may hold tokens of any placeholder, their own included
fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z<>&\" ]{0,5}",
        token(),
        (token(), "[a-z ]{0,3}", token()).prop_map(|(a, gap, b)| format!("{a}{gap}{b}")),
    ]
}

fn values() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(value(), NAMES.len())
}

fn expand_twice(registry: &mut PlaceholderRegistry, markup: &str) -> (String, String) {
    let mut doc = Document::parse(markup);
    let root = doc.root();
    replace_in_subtree(&mut doc, root, registry).unwrap();
    let once = doc.to_html();
    replace_in_subtree(&mut doc, root, registry).unwrap();
    (once, doc.to_html())
}

proptest! {
    #[test]
    fn prop_second_pass_is_a_no_op(markup in page(), values in values(), inner_html in any::<bool>()) {
        let placeholders = NAMES
            .iter()
            .zip(&values)
            .map(|(name, value)| {
                let mut p = textbox(name, value);
                p.allow_inner_html = inner_html;
                p
            })
            .collect();
        let mut registry = registry_with(placeholders);
        let mut doc = Document::parse(&markup);
        let root = doc.root();

        let first = replace_in_subtree(&mut doc, root, &mut registry).unwrap();
        let once = doc.to_html();
        let counts: Vec<usize> = registry.iter().map(|p| p.count_on_page).collect();

        let second = replace_in_subtree(&mut doc, root, &mut registry).unwrap();
        prop_assert_eq!(doc.to_html(), once);
        prop_assert_eq!(first.bindings, second.bindings);
        let recounted: Vec<usize> = registry.iter().map(|p| p.count_on_page).collect();
        prop_assert_eq!(counts, recounted);
    }
}

#[test]
fn sample_page_expands_fully() {
    let mut registry = registry_with(vec![
        textbox("HOST", "example.com"),
        textbox("URL", "https://example.com/"),
    ]);
    registry.get_mut("URL").unwrap().allow_inner_html = true;
    let mut doc = Document::parse(r#"<p>Open <a href="iURLi">dURLd</a> on xHOSTx.</p>"#);
    let root = doc.root();
    let report = replace_in_subtree(&mut doc, root, &mut registry).unwrap();

    assert_eq!(
        doc.to_html(),
        r#"<p>Open <a href="https://example.com/"><span class="placeholder-value" data-placeholder="URL">https://example.com/</span></a> on example.com.</p>"#
    );
    assert_eq!(report.used, vec!["HOST", "URL"]);
    assert!(registry.get("HOST").unwrap().reload_on_change);
}

#[test]
fn self_reference_is_written_once() {
    let mut registry = registry_with(vec![textbox("LOOP", "before xLOOPx after")]);
    let (once, twice) = expand_twice(&mut registry, "<p>xLOOPx</p>");
    assert_eq!(once, "<p>before xLOOPx after</p>");
    assert_eq!(twice, once);
    assert_eq!(registry.get("LOOP").unwrap().count_on_page, 1);
}

#[test]
fn leaf_value_keeps_foreign_token() {
    let mut leaf = textbox("LEAF", "xOTHERx");
    leaf.allow_recursive = false;
    let mut registry = registry_with(vec![textbox("OTHER", "other"), leaf]);
    let (once, twice) = expand_twice(&mut registry, "<p>xLEAFx and dLEAFd</p>");
    assert_eq!(
        once,
        r#"<p>xOTHERx and <span class="placeholder-value" data-placeholder="LEAF">xOTHERx</span></p>"#
    );
    assert_eq!(twice, once);
    assert_eq!(registry.get("OTHER").unwrap().count_on_page, 0);
    assert_eq!(registry.get("LEAF").unwrap().count_on_page, 2);
}

#[test]
fn attribute_value_with_token_is_written_once() {
    let mut link = textbox("LINK", "/iLINKi/");
    link.allow_inner_html = true;
    let mut registry = registry_with(vec![link]);
    let (once, twice) = expand_twice(&mut registry, r#"<a href="iLINKi">iLINKi</a>"#);
    assert_eq!(once, r#"<a href="/iLINKi/">/iLINKi/</a>"#);
    assert_eq!(twice, once);
}
