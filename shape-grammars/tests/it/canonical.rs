// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use std::collections::HashSet;

use shape_grammars::arena::Handle;
use shape_grammars::canonical::is_isomorphic;
use shape_grammars::canonical::signature;
use shape_grammars::context::Context;
use shape_grammars::context::Nonterminal;
use shape_grammars::heap::HeapConfiguration;

use crate::test_grammars::list;

/// A singly linked list with one node per entry of `order`, with `x` pointing at its head.
fn linked_list(ctx: &mut Context, order: &[usize]) -> HeapConfiguration {
    let node = ctx.add_node_type("Node");
    let next = ctx.add_selector_label("next");
    let mut heap = HeapConfiguration::new();
    let mut created = Vec::new();
    let mut builder = heap.builder(ctx);
    builder.add_nodes(node, order.len(), &mut created);
    // created[order[i]] is the i-th element of the list.
    for window in order.windows(2) {
        builder
            .add_selector(created[window[0]], next, created[window[1]])
            .expect("Cannot add selector");
    }
    builder
        .add_variable_edge("x", created[order[0]])
        .and_then(|b| b.build())
        .expect("Cannot build list");
    heap
}

#[test]
fn isomorphic_configurations_are_equal() {
    let mut ctx = Context::new();
    let forwards = linked_list(&mut ctx, &[0, 1, 2, 3]);
    let shuffled = linked_list(&mut ctx, &[2, 0, 3, 1]);
    assert!(is_isomorphic(&forwards, &shuffled));
    assert_eq!(signature(&forwards), signature(&shuffled));
    assert_eq!(forwards, shuffled);

    let mut set = HashSet::new();
    set.insert(forwards);
    assert!(!set.insert(shuffled));
}

#[test]
fn clones_are_equal() {
    let mut ctx = Context::new();
    let heap = list::abstract_list(&mut ctx);
    assert_eq!(heap.clone(), heap);
    assert_eq!(signature(&heap.clone()), signature(&heap));
}

#[test]
fn different_configurations_are_not_equal() {
    let mut ctx = Context::new();
    let short = linked_list(&mut ctx, &[0, 1, 2]);
    let long = linked_list(&mut ctx, &[0, 1, 2, 3]);
    assert_ne!(short, long);

    // Same shape, but the variable points at the tail.
    let forwards = linked_list(&mut ctx, &[0, 1, 2]);
    let mut moved = forwards.clone();
    let head = moved.variable_target_of("x").expect("Missing variable");
    let variable = moved.variable_with("x").expect("Missing variable");
    let tail = moved
        .nodes()
        .find(|node| *node != head && moved.selector_edges_of(*node).is_empty())
        .expect("Missing tail");
    moved
        .builder(&ctx)
        .remove_variable_edge(variable)
        .and_then(|b| b.add_variable_edge("x", tail))
        .and_then(|b| b.build())
        .expect("Cannot move variable");
    assert_ne!(forwards, moved);
}

#[test]
fn nonterminal_labels_and_external_order_are_significant() {
    let mut ctx = Context::new();
    let node = ctx.add_node_type("Node");
    let list = list::list(&mut ctx);
    let other = ctx
        .add_nonterminal("Other", 2, &[])
        .expect("Cannot add nonterminal");

    let build = |label: Handle<Nonterminal>, swap_externals: bool| {
        let mut heap = HeapConfiguration::new();
        let mut nodes = Vec::new();
        let (first, second) = if swap_externals { (1, 0) } else { (0, 1) };
        heap.builder(&ctx)
            .add_nodes(node, 2, &mut nodes)
            .add_nonterminal_edge(label, &[nodes[0], nodes[1]])
            .and_then(|b| b.set_external(nodes[first]))
            .and_then(|b| b.set_external(nodes[second]))
            .and_then(|b| b.build())
            .expect("Cannot build heap configuration");
        heap
    };
    assert_eq!(build(list, false), build(list, false));
    assert_ne!(build(list, false), build(other, false));
    assert_ne!(build(list, false), build(list, true));
}
