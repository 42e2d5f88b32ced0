// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use shape_grammars::context::Context;
use shape_grammars::context::DisplayWithContext;
use shape_grammars::heap::HeapConfiguration;
use shape_grammars::heap::HeapConfigurationError;

use crate::test_grammars::list;
use crate::util::selector_edges;

#[test]
fn can_build_heap_configurations() {
    let mut ctx = Context::new();
    let node = ctx.add_node_type("Node");
    let next = ctx.add_selector_label("next");
    let list = list::list(&mut ctx);

    let mut heap = HeapConfiguration::new();
    let mut nodes = Vec::new();
    heap.builder(&ctx)
        .add_nodes(node, 3, &mut nodes)
        .add_selector(nodes[0], next, nodes[1])
        .and_then(|b| b.add_nonterminal_edge(list, &[nodes[1], nodes[2]]))
        .and_then(|b| b.add_variable_edge("x", nodes[0]))
        .and_then(|b| b.set_external(nodes[2]))
        .and_then(|b| b.build())
        .expect("Cannot build heap configuration");

    assert_eq!(heap.count_nodes(), 3);
    assert_eq!(heap.count_selector_edges(), 1);
    assert_eq!(heap.count_nonterminal_edges(), 1);
    assert_eq!(heap.count_variable_edges(), 1);
    assert_eq!(heap.external_nodes(), &[nodes[2]]);
    assert_eq!(heap.external_index_of(nodes[2]), Some(0));
    assert_eq!(heap.variable_target_of("x"), Some(nodes[0]));
    assert_eq!(heap.selector_target_of(nodes[0], next), Some(nodes[1]));
    assert!(heap.has_selector_named(&ctx, nodes[0], "next"));
    assert!(!heap.has_selector_named(&ctx, nodes[1], "next"));
    assert_eq!(heap.successor_nodes_of(nodes[0]), vec![nodes[1]]);
    assert_eq!(heap.predecessor_nodes_of(nodes[1]), vec![nodes[0]]);
    assert_eq!(heap.attached_nonterminal_edges_of(nodes[2]).count(), 1);
    assert_eq!(heap.attached_nonterminal_edges_of(nodes[0]).count(), 0);
    assert_eq!(
        heap.display(&ctx).to_string(),
        "nodes: [1:Node, 2:Node, 3:Node] externals: [3] selectors: [1-next->2] \
         nonterminals: [List(2,3)] variables: [x->1]"
    );
}

#[test]
fn cannot_violate_structural_invariants() {
    let mut ctx = Context::new();
    let node = ctx.add_node_type("Node");
    let next = ctx.add_selector_label("next");
    let list = list::list(&mut ctx);

    let mut heap = HeapConfiguration::new();
    let mut nodes = Vec::new();
    let mut builder = heap.builder(&ctx);
    builder.add_nodes(node, 2, &mut nodes);
    builder
        .add_selector(nodes[0], next, nodes[1])
        .and_then(|b| b.add_variable_edge("x", nodes[0]))
        .and_then(|b| b.set_external(nodes[0]))
        .expect("Cannot build heap configuration");

    assert_eq!(
        builder.add_selector(nodes[0], next, nodes[0]).err(),
        Some(HeapConfigurationError::DuplicateSelector {
            node: nodes[0].as_u32(),
            label: next.as_u32(),
        })
    );
    assert_eq!(
        builder.add_variable_edge("x", nodes[1]).err(),
        Some(HeapConfigurationError::DuplicateVariable("x".to_string()))
    );
    assert_eq!(
        builder.add_nonterminal_edge(list, &[nodes[0]]).err(),
        Some(HeapConfigurationError::RankMismatch {
            expected: 2,
            actual: 1
        })
    );
    assert_eq!(
        builder.set_external(nodes[0]).err(),
        Some(HeapConfigurationError::AlreadyExternal(nodes[0].as_u32()))
    );
    assert_eq!(
        builder.unset_external(nodes[1]).err(),
        Some(HeapConfigurationError::NotExternal(nodes[1].as_u32()))
    );
    assert_eq!(
        builder.remove_node(nodes[0]).err(),
        Some(HeapConfigurationError::ExternalNode(nodes[0].as_u32()))
    );
    assert_eq!(
        builder.remove_isolated_node(nodes[1]).err(),
        Some(HeapConfigurationError::NodeNotIsolated(nodes[1].as_u32()))
    );
    builder.build().expect("Heap configuration is no longer valid");
    drop(builder);

    // Failed operations leave the heap configuration untouched.
    assert_eq!(heap.count_nodes(), 2);
    assert_eq!(heap.count_selector_edges(), 1);
    assert_eq!(heap.count_nonterminal_edges(), 0);
    assert_eq!(heap.count_external_nodes(), 1);
}

#[test]
fn can_remove_nodes_with_incident_edges() {
    let mut ctx = Context::new();
    let node = ctx.add_node_type("Node");
    let next = ctx.add_selector_label("next");
    let list = list::list(&mut ctx);

    let mut heap = HeapConfiguration::new();
    let mut nodes = Vec::new();
    heap.builder(&ctx)
        .add_nodes(node, 4, &mut nodes)
        .add_selector(nodes[0], next, nodes[1])
        .and_then(|b| b.add_selector(nodes[1], next, nodes[2]))
        .and_then(|b| b.add_nonterminal_edge(list, &[nodes[1], nodes[3]]))
        .and_then(|b| b.add_variable_edge("y", nodes[1]))
        .and_then(|b| b.remove_node(nodes[1]))
        .and_then(|b| b.remove_isolated_node(nodes[3]))
        .and_then(|b| b.build())
        .expect("Cannot remove nodes");

    assert_eq!(heap.count_nodes(), 2);
    assert!(!heap.contains_node(nodes[1]));
    assert!(!heap.contains_node(nodes[3]));
    assert_eq!(heap.count_selector_edges(), 0);
    assert_eq!(heap.count_nonterminal_edges(), 0);
    assert_eq!(heap.count_variable_edges(), 0);
}

#[test]
fn can_edit_selectors() {
    let mut ctx = Context::new();
    let node = ctx.add_node_type("Node");
    let next = ctx.add_selector_label("next");
    let prev = ctx.add_selector_label("prev");

    let mut heap = HeapConfiguration::new();
    let mut nodes = Vec::new();
    heap.builder(&ctx)
        .add_nodes(node, 2, &mut nodes)
        .add_selector(nodes[0], next, nodes[1])
        .and_then(|b| b.add_selector(nodes[1], next, nodes[0]))
        .and_then(|b| b.replace_selector(nodes[1], next, prev))
        .and_then(|b| b.remove_selector(nodes[0], next))
        .and_then(|b| b.build())
        .expect("Cannot edit selectors");
    assert_eq!(
        selector_edges(&ctx, &heap),
        vec![format!("{}.prev -> {}", nodes[1].as_u32(), nodes[0].as_u32())]
    );

    assert_eq!(
        heap.builder(&ctx).remove_selector(nodes[0], next).err(),
        Some(HeapConfigurationError::SelectorNotFound {
            node: nodes[0].as_u32(),
            label: next.as_u32(),
        })
    );
}

#[test]
fn can_replace_nonterminal_edges_in_place() {
    let mut ctx = Context::new();
    let heap = list::abstract_list(&mut ctx);
    let rule = list::recursive_rule(&mut ctx);
    let edge = heap.nonterminal_edges().next().expect("Missing nonterminal edge");

    let mut replaced = heap.clone();
    replaced
        .builder(&ctx)
        .replace_nonterminal_edge(edge, &rule)
        .and_then(|b| b.build())
        .expect("Cannot replace nonterminal edge");

    // Externals of the rule are identified with the tentacles; the rest are fresh nodes.
    assert_eq!(
        replaced.count_nodes(),
        heap.count_nodes() + rule.count_nodes() - rule.count_external_nodes()
    );
    assert_eq!(
        replaced.count_nonterminal_edges(),
        heap.count_nonterminal_edges() - 1 + rule.count_nonterminal_edges()
    );
    assert_eq!(
        replaced.count_selector_edges(),
        heap.count_selector_edges() + rule.count_selector_edges()
    );
    assert!(!replaced.contains_nonterminal_edge(edge));
    let root = replaced.variable_target_of("x").expect("Missing variable");
    assert!(replaced.has_selector_named(&ctx, root, "next"));
}

#[test]
fn cannot_replace_nonterminal_edges_with_mismatched_rules() {
    let mut ctx = Context::new();
    let mut heap = list::abstract_list(&mut ctx);
    let edge = heap.nonterminal_edges().next().expect("Missing nonterminal edge");
    let node = ctx.add_node_type("Node");
    let mut rule = HeapConfiguration::new();
    let mut nodes = Vec::new();
    rule.builder(&ctx)
        .add_nodes(node, 1, &mut nodes)
        .set_external(nodes[0])
        .and_then(|b| b.build())
        .expect("Cannot build rule");

    assert_eq!(
        heap.builder(&ctx).replace_nonterminal_edge(edge, &rule).err(),
        Some(HeapConfigurationError::ExternalCountMismatch {
            expected: 2,
            actual: 1
        })
    );
    assert!(heap.contains_nonterminal_edge(edge));
}

#[test]
fn can_merge_external_nodes() {
    let mut ctx = Context::new();
    let node = ctx.add_node_type("Node");
    let left = ctx.add_selector_label("left");
    let right = ctx.add_selector_label("right");

    let mut heap = HeapConfiguration::new();
    let mut nodes = Vec::new();
    heap.builder(&ctx)
        .add_nodes(node, 3, &mut nodes)
        .add_selector(nodes[0], left, nodes[1])
        .and_then(|b| b.add_selector(nodes[0], right, nodes[2]))
        .and_then(|b| b.set_external(nodes[0]))
        .and_then(|b| b.set_external(nodes[1]))
        .and_then(|b| b.set_external(nodes[2]))
        .and_then(|b| b.merge_externals(&[0, 1, 1]))
        .and_then(|b| b.build())
        .expect("Cannot merge externals");

    assert_eq!(heap.count_nodes(), 2);
    assert_eq!(heap.external_nodes(), &[nodes[0], nodes[1]]);
    assert_eq!(heap.selector_target_of(nodes[0], left), Some(nodes[1]));
    assert_eq!(heap.selector_target_of(nodes[0], right), Some(nodes[1]));
}

#[test]
fn cannot_merge_external_nodes_with_gaps() {
    let mut ctx = Context::new();
    let node = ctx.add_node_type("Node");
    let mut heap = HeapConfiguration::new();
    let mut nodes = Vec::new();
    let mut builder = heap.builder(&ctx);
    builder.add_nodes(node, 2, &mut nodes);
    builder
        .set_external(nodes[0])
        .and_then(|b| b.set_external(nodes[1]))
        .expect("Cannot set externals");
    assert!(matches!(
        builder.merge_externals(&[0, 2]),
        Err(HeapConfigurationError::InvalidExternalMapping(_))
    ));
    assert_eq!(
        builder.merge_externals(&[0]).err(),
        Some(HeapConfigurationError::ExternalCountMismatch {
            expected: 2,
            actual: 1
        })
    );
}
