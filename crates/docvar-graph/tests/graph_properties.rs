use docvar_graph::DependencyGraph;
use docvar_registry::{PlaceholderRegistry, TokenClass};
use docvar_test_utils::{registry_with, textbox};
use proptest::prelude::*;

fn name(i: usize) -> String {
    format!("N{i}")
}

/// Values built from filler words and references to other placeholders
fn build_registry(values: &[(String, Vec<usize>)]) -> PlaceholderRegistry {
    let placeholders = values
        .iter()
        .enumerate()
        .map(|(i, (filler, refs))| {
            let mut value = filler.clone();
            for r in refs {
                value.push_str(&format!("x{}x", name(*r)));
                value.push_str(filler);
            }
            textbox(&name(i), &value)
        })
        .collect();
    registry_with(placeholders)
}

fn contains_foreign_token(registry: &PlaceholderRegistry, owner: &str, text: &str) -> bool {
    registry
        .iter()
        .filter(|p| p.name != owner)
        .any(|p| TokenClass::ALL.into_iter().any(|c| p.tokens.get(c).is_match(text)))
}

proptest! {
    #[test]
    fn prop_acyclic_references_reach_fixed_point(
        specs in proptest::collection::vec(("[a-m ]{0,4}", proptest::collection::vec(0..8usize, 0..3)), 1..8)
    ) {
        // only reference earlier placeholders so no cycle can form
        let values: Vec<(String, Vec<usize>)> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (filler, refs))| {
                let refs = if i == 0 { Vec::new() } else { refs.into_iter().map(|r| r % i).collect() };
                (filler, refs)
            })
            .collect();
        let mut registry = build_registry(&values);
        let (graph, errors) = DependencyGraph::build(&mut registry);
        prop_assert!(errors.is_empty());
        prop_assert!(!graph.has_cycle());

        for p in registry.iter() {
            prop_assert!(!contains_foreign_token(&registry, &p.name, &p.expanded_value));
        }
    }

    #[test]
    fn prop_arbitrary_references_stay_acyclic(
        specs in proptest::collection::vec(("[a-m]{0,3}", proptest::collection::vec(0..6usize, 0..3)), 1..6),
        edits in proptest::collection::vec((0..6usize, proptest::collection::vec(0..6usize, 0..3)), 0..6)
    ) {
        let count = specs.len();
        let values: Vec<(String, Vec<usize>)> = specs
            .into_iter()
            .map(|(filler, refs)| (filler, refs.into_iter().map(|r| r % count).collect()))
            .collect();
        let mut registry = build_registry(&values);
        let (mut graph, _) = DependencyGraph::build(&mut registry);
        prop_assert!(!graph.has_cycle());

        for (target, refs) in edits {
            let target = name(target % count);
            let value: String = refs.iter().map(|r| format!("x{}x", name(r % count))).collect();
            registry.get_mut(&target).unwrap().current_value = value;
            // a cycle is reported, never left in place
            let _ = graph.on_value_changed(&mut registry, &target);
            prop_assert!(!graph.has_cycle());
        }
    }
}

#[test]
fn mutual_references_terminate_with_defined_values() {
    let mut registry = registry_with(vec![textbox("A", "a"), textbox("B", "b")]);
    let (mut graph, _) = DependencyGraph::build(&mut registry);

    registry.get_mut("A").unwrap().current_value = "a+xBx".to_string();
    graph.on_value_changed(&mut registry, "A").unwrap();
    registry.get_mut("B").unwrap().current_value = "b+xAx".to_string();
    assert!(graph.on_value_changed(&mut registry, "B").is_err());

    assert!(!graph.has_cycle());
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(registry.get("A").unwrap().expanded_value, "a+b+xAx");
    assert_eq!(registry.get("B").unwrap().expanded_value, "b+xAx");
}
