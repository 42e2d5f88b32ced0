// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use shape_grammars::context::Context;
use shape_grammars::index::NonterminalLabel;
use shape_grammars::materialization::DefaultGrammarResponse;
use shape_grammars::materialization::DefaultGrammarResponseApplier;
use shape_grammars::materialization::GrammarResponse;
use shape_grammars::materialization::GrammarResponseApplier;
use shape_grammars::materialization::IndexMaterializationStrategy;
use shape_grammars::materialization::IndexedGrammarResponseApplier;
use shape_grammars::materialization::IndexedMaterializationRuleManager;
use shape_grammars::materialization::MaterializationAndRuleResponse;
use shape_grammars::materialization::MaterializationError;
use shape_grammars::materialization::MaterializationRuleManager;

use crate::test_grammars::balanced_tree;
use crate::test_grammars::list;
use crate::util::init_logging;
use crate::util::nonterminal_labels;

#[test]
fn default_applier_applies_every_rule() {
    let mut ctx = Context::new();
    let heap = list::abstract_list(&mut ctx);
    let edge = heap.nonterminal_edges().next().expect("Missing nonterminal edge");
    let response = GrammarResponse::Default(DefaultGrammarResponse {
        rules: vec![list::base_rule(&mut ctx), list::recursive_rule(&mut ctx)],
    });
    let results = DefaultGrammarResponseApplier::new()
        .apply_grammar_response_to(&ctx, &heap, edge, &response)
        .expect("Cannot apply response");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].count_nonterminal_edges(), 0);
    assert_eq!(results[0].count_nodes(), 2);
    assert_eq!(results[1].count_nonterminal_edges(), 1);
    assert_eq!(results[1].count_nodes(), 3);

    let empty = GrammarResponse::Default(DefaultGrammarResponse::default());
    assert_eq!(
        DefaultGrammarResponseApplier::new()
            .apply_grammar_response_to(&ctx, &heap, edge, &empty)
            .expect("Cannot apply response"),
        vec![]
    );
}

#[test]
fn default_applier_refuses_indexed_responses() {
    let mut ctx = Context::new();
    let heap = list::abstract_list(&mut ctx);
    let edge = heap.nonterminal_edges().next().expect("Missing nonterminal edge");
    let response = GrammarResponse::Indexed(MaterializationAndRuleResponse::default());
    assert_eq!(
        DefaultGrammarResponseApplier::new().apply_grammar_response_to(
            &ctx, &heap, edge, &response
        ),
        Err(MaterializationError::WrongResponseType {
            expected: "default",
            found: "indexed",
        })
    );
}

#[test]
fn indexed_applier_unrolls_before_applying_rules() {
    let mut ctx = Context::new();
    let symbols = balanced_tree::symbols(&mut ctx);
    let grammar = balanced_tree::new(&mut ctx);
    let index_grammar = balanced_tree::index_grammar(&mut ctx);
    let heap = balanced_tree::abstract_tree(&mut ctx, &[symbols.x]);
    let edge = heap.nonterminal_edges().next().expect("Missing nonterminal edge");
    let label = NonterminalLabel::from(balanced_tree::t(&mut ctx, &[symbols.x]));

    let mut manager = IndexedMaterializationRuleManager::new(&grammar, &index_grammar);
    let response = manager
        .get_rules_for(&ctx, &label, 0, "left")
        .expect("Cannot get rules");
    let applier = IndexedGrammarResponseApplier::new(
        IndexMaterializationStrategy::for_index_grammar(&index_grammar),
    );
    let results = applier
        .apply_grammar_response_to(&ctx, &heap, edge, response)
        .expect("Cannot apply response");
    assert_eq!(results.len(), 2);

    // T[Z] became a leaf.
    let root = results[0].variable_target_of("x").expect("Missing variable");
    assert_eq!(results[0].count_nodes(), 2);
    assert!(results[0].has_selector_named(&ctx, root, "left"));
    assert!(results[0].has_selector_named(&ctx, root, "right"));
    assert_eq!(nonterminal_labels(&ctx, &results[0]), Vec::<String>::new());

    // T[s,X] became an inner node with two T[X] subtrees.
    let root = results[1].variable_target_of("x").expect("Missing variable");
    assert_eq!(results[1].count_nodes(), 4);
    assert!(results[1].has_selector_named(&ctx, root, "left"));
    assert_eq!(
        nonterminal_labels(&ctx, &results[1]),
        vec!["T[X]".to_string(), "T[X]".to_string()]
    );
}

#[test]
fn indexed_applier_applies_default_responses() {
    let mut ctx = Context::new();
    let heap = list::abstract_list(&mut ctx);
    let edge = heap.nonterminal_edges().next().expect("Missing nonterminal edge");
    let response = GrammarResponse::Default(DefaultGrammarResponse {
        rules: vec![list::base_rule(&mut ctx)],
    });
    let results = IndexedGrammarResponseApplier::new(IndexMaterializationStrategy::new())
        .apply_grammar_response_to(&ctx, &heap, edge, &response)
        .expect("Cannot apply response");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].count_nonterminal_edges(), 0);
}

#[test]
fn indexed_applier_skips_impossible_unrollings() {
    init_logging();
    let mut ctx = Context::new();
    let symbols = balanced_tree::symbols(&mut ctx);
    let index_grammar = balanced_tree::index_grammar(&mut ctx);
    let heap = balanced_tree::abstract_tree(&mut ctx, &[symbols.x]);
    let edge = heap.nonterminal_edges().next().expect("Missing nonterminal edge");
    let leaf = balanced_tree::leaf_rule(&mut ctx);
    let unknown = ctx.add_abstract_symbol("W").as_abstract();
    let applier = IndexedGrammarResponseApplier::new(
        IndexMaterializationStrategy::for_index_grammar(&index_grammar),
    );

    // No abstract symbol to unroll.
    let response = GrammarResponse::Indexed(MaterializationAndRuleResponse {
        abstract_symbol: None,
        materializations: vec![(vec![symbols.z], vec![leaf.clone()])],
    });
    let results = applier
        .apply_grammar_response_to(&ctx, &heap, edge, &response)
        .expect("Cannot apply response");
    assert!(results.is_empty());

    // An abstract symbol without productions, next to a group that needs no unrolling.
    let response = GrammarResponse::Indexed(MaterializationAndRuleResponse {
        abstract_symbol: unknown,
        materializations: vec![
            (vec![symbols.z], vec![leaf.clone()]),
            (vec![], vec![leaf]),
        ],
    });
    let results = applier
        .apply_grammar_response_to(&ctx, &heap, edge, &response)
        .expect("Cannot apply response");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].count_nonterminal_edges(), 0);
}
