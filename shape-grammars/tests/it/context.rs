// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use shape_grammars::context::Context;
use shape_grammars::context::ContextError;
use shape_grammars::context::DisplayWithContext;
use shape_grammars::index::IndexSymbol;

#[test]
fn can_intern_node_types_and_selectors() {
    let mut ctx = Context::new();
    let node1 = ctx.add_node_type("Node");
    let node2 = ctx.add_node_type("Node");
    let null = ctx.add_node_type("NULL");
    assert_eq!(node1, node2);
    assert_ne!(node1, null);
    assert_eq!(ctx.node_type("Node"), Some(node1));
    assert_eq!(ctx.node_type("missing"), None);

    let next1 = ctx.add_selector_label("next");
    let next2 = ctx.add_selector_label("next");
    assert_eq!(next1, next2);
    assert_eq!(ctx.selector_label("next"), Some(next1));
    assert_eq!(ctx[next1].name(), "next");
}

#[test]
fn can_distinguish_annotated_selectors() {
    let mut ctx = Context::new();
    let left = ctx.add_selector_label("left");
    let left_plus = ctx.add_annotated_selector_label("left", "+1");
    let left_minus = ctx.add_annotated_selector_label("left", "-1");
    assert_ne!(left, left_plus);
    assert_ne!(left_plus, left_minus);
    assert_eq!(left_plus, ctx.add_annotated_selector_label("left", "+1"));
    assert!(ctx[left_plus].has_name("left"));
    assert!(!ctx[left_plus].has_name("right"));
    assert_eq!(ctx[left_plus].annotation(), Some("+1"));
    assert_eq!(left_plus.display(&ctx).to_string(), "left[+1]");
    assert_eq!(left.display(&ctx).to_string(), "left");
    // Lookup by name only finds the plain label.
    assert_eq!(ctx.selector_label("left"), Some(left));
}

#[test]
fn can_intern_nonterminals() {
    let mut ctx = Context::new();
    let list = ctx.add_nonterminal("List", 2, &[]).unwrap();
    assert_eq!(ctx[list].rank(), 2);
    assert_eq!(ctx[list].reduction_tentacles(), &[false, false]);
    assert_eq!(ctx.add_nonterminal("List", 2, &[true, true]), Ok(list));
    // Reduction tentacles of the existing nonterminal are kept.
    assert!(!ctx[list].is_reduction_tentacle(0));

    let tree = ctx.add_nonterminal("Tree", 2, &[false, true]).unwrap();
    assert!(ctx[tree].is_reduction_tentacle(1));
    assert_eq!(ctx.nonterminal("Tree"), Some(tree));
    assert_eq!(ctx.iter_nonterminals().collect::<Vec<_>>(), vec![list, tree]);
}

#[test]
fn cannot_redefine_nonterminal_rank() {
    let mut ctx = Context::new();
    ctx.add_nonterminal("List", 2, &[]).unwrap();
    assert_eq!(
        ctx.add_nonterminal("List", 3, &[]),
        Err(ContextError::NonterminalRankMismatch {
            name: "List".to_string(),
            existing: 2,
            requested: 3,
        })
    );
    assert!(matches!(
        ctx.add_nonterminal("Tree", 2, &[true]),
        Err(ContextError::ReductionTentacleMismatch { .. })
    ));
}

#[test]
fn can_intern_index_symbols() {
    let mut ctx = Context::new();
    let s = ctx.add_concrete_symbol("s", false);
    let z = ctx.add_concrete_symbol("Z", true);
    let x1 = ctx.add_abstract_symbol("X");
    let x2 = ctx.add_abstract_symbol("X");
    assert!(s.is_concrete() && !s.is_bottom());
    assert!(z.is_concrete() && z.is_bottom());
    assert!(x1.is_abstract());
    assert_eq!(x1, x2);
    assert_eq!(ctx.abstract_symbol("X"), x1.as_abstract());
    assert_eq!(IndexSymbol::Variable.display(&ctx).to_string(), "()");
    assert_eq!(z.display(&ctx).to_string(), "Z");
}
