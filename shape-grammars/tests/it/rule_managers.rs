// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use shape_grammars::context::Context;
use shape_grammars::index::NonterminalLabel;
use shape_grammars::materialization::DefaultMaterializationRuleManager;
use shape_grammars::materialization::GrammarResponse;
use shape_grammars::materialization::IndexedMaterializationRuleManager;
use shape_grammars::materialization::MaterializationAndRuleResponse;
use shape_grammars::materialization::MaterializationRuleManager;

use crate::test_grammars::balanced_tree;
use crate::test_grammars::list;
use crate::util::nonterminal_labels;

fn expect_indexed(response: &GrammarResponse) -> &MaterializationAndRuleResponse {
    match response {
        GrammarResponse::Indexed(response) => response,
        GrammarResponse::Default(_) => panic!("Expected an indexed response"),
    }
}

#[test]
fn default_manager_returns_flat_responses() {
    let mut ctx = Context::new();
    let grammar = list::new(&mut ctx);
    let list = NonterminalLabel::from(list::list(&mut ctx));
    let base = list::base_rule(&mut ctx);
    let recursive = list::recursive_rule(&mut ctx);
    let mut manager = DefaultMaterializationRuleManager::new(&grammar);

    let response = manager
        .get_rules_for(&ctx, &list, 0, "next")
        .expect("Cannot get rules");
    assert_eq!(response.kind(), "default");
    match response {
        GrammarResponse::Default(response) => {
            assert_eq!(response.rules, vec![base, recursive]);
        }
        GrammarResponse::Indexed(_) => panic!("Expected a default response"),
    }

    let response = manager
        .get_rules_for(&ctx, &list, 1, "next")
        .expect("Cannot get rules");
    assert!(response.is_empty());
}

#[test]
fn default_manager_answers_the_same_with_and_without_caching() {
    let mut ctx = Context::new();
    let grammar = list::new(&mut ctx);
    let list = NonterminalLabel::from(list::list(&mut ctx));
    let mut manager = DefaultMaterializationRuleManager::new(&grammar);
    let count = |response: &GrammarResponse| match response {
        GrammarResponse::Default(response) => response.rules.len(),
        GrammarResponse::Indexed(_) => usize::MAX,
    };

    let mut get = |tentacle| {
        manager
            .get_rules_for(&ctx, &list, tentacle, "next")
            .map(count)
            .expect("Cannot get rules")
    };
    let first = get(0);
    let again = get(0);
    let other = get(1);
    manager.set_cache_requests(false);
    let uncached = manager
        .get_rules_for(&ctx, &list, 0, "next")
        .map(count)
        .expect("Cannot get rules");
    assert_eq!((first, again, other, uncached), (2, 2, 0, 2));
}

#[test]
fn indexed_manager_groups_rules_by_unrolling() {
    let mut ctx = Context::new();
    let symbols = balanced_tree::symbols(&mut ctx);
    let grammar = balanced_tree::new(&mut ctx);
    let index_grammar = balanced_tree::index_grammar(&mut ctx);
    let tree = NonterminalLabel::from(balanced_tree::t(&mut ctx, &[symbols.x]));
    let mut manager = IndexedMaterializationRuleManager::new(&grammar, &index_grammar);

    let response = manager
        .get_rules_for(&ctx, &tree, 0, "left")
        .expect("Cannot get rules");
    assert_eq!(response.kind(), "indexed");
    let response = expect_indexed(response);
    assert_eq!(response.abstract_symbol, symbols.x.as_abstract());
    let suffixes = response
        .materializations
        .iter()
        .map(|(suffix, _)| suffix.clone())
        .collect::<Vec<_>>();
    assert_eq!(suffixes, vec![vec![symbols.z], vec![symbols.s, symbols.x]]);

    let leaves = response.rules_for(&[symbols.z]);
    assert_eq!(leaves.len(), 1);
    assert_eq!(nonterminal_labels(&ctx, &leaves[0]), Vec::<String>::new());

    // The index variable of the inner rule is bound to X.
    let inner = response.rules_for(&[symbols.s, symbols.x]);
    assert_eq!(inner.len(), 1);
    assert_eq!(
        nonterminal_labels(&ctx, &inner[0]),
        vec!["T[X]".to_string(), "T[X]".to_string()]
    );
    assert!(response.rules_for(&[symbols.c]).is_empty());
}

#[test]
fn indexed_manager_instantiates_without_unrolling() {
    let mut ctx = Context::new();
    let symbols = balanced_tree::symbols(&mut ctx);
    let grammar = balanced_tree::new(&mut ctx);
    let index_grammar = balanced_tree::index_grammar(&mut ctx);
    let mut manager = IndexedMaterializationRuleManager::new(&grammar, &index_grammar);

    let concrete = NonterminalLabel::from(balanced_tree::t(
        &mut ctx,
        &[symbols.s, symbols.s, symbols.z],
    ));
    let response = manager
        .get_rules_for(&ctx, &concrete, 0, "right")
        .expect("Cannot get rules");
    let response = expect_indexed(response);
    assert_eq!(response.abstract_symbol, None);
    assert_eq!(response.materializations.len(), 1);
    let (suffix, rules) = &response.materializations[0];
    assert!(suffix.is_empty());
    assert_eq!(
        nonterminal_labels(&ctx, &rules[0]),
        vec!["T[s,Z]".to_string(), "T[s,Z]".to_string()]
    );

    // Z only matches the leaf rule, and it needs no unrolling.
    let leaf = NonterminalLabel::from(balanced_tree::t(&mut ctx, &[symbols.z]));
    let response = manager
        .get_rules_for(&ctx, &leaf, 0, "left")
        .expect("Cannot get rules");
    let response = expect_indexed(response);
    assert_eq!(response.materializations.len(), 1);
    assert_eq!(response.rules_for(&[]).len(), 1);
}

#[test]
fn indexed_manager_drops_unmatchable_rules() {
    let mut ctx = Context::new();
    let symbols = balanced_tree::symbols(&mut ctx);
    let grammar = balanced_tree::new(&mut ctx);
    let index_grammar = balanced_tree::index_grammar(&mut ctx);
    let mut manager = IndexedMaterializationRuleManager::new(&grammar, &index_grammar);

    // Y unrolls into s and C, and no rule ends in C.
    let other = NonterminalLabel::from(balanced_tree::t(&mut ctx, &[symbols.y]));
    let response = manager
        .get_rules_for(&ctx, &other, 0, "left")
        .expect("Cannot get rules");
    let response = expect_indexed(response);
    assert_eq!(response.materializations.len(), 1);
    assert_eq!(response.rules_for(&[symbols.s, symbols.y]).len(), 1);

    let mismatched = NonterminalLabel::from(balanced_tree::t(&mut ctx, &[symbols.c]));
    let response = manager
        .get_rules_for(&ctx, &mismatched, 0, "left")
        .expect("Cannot get rules");
    assert!(response.is_empty());
}

#[test]
fn indexed_manager_answers_plain_requests_like_the_default_manager() {
    let mut ctx = Context::new();
    let grammar = list::new(&mut ctx);
    let index_grammar = balanced_tree::index_grammar(&mut ctx);
    let list = NonterminalLabel::from(list::list(&mut ctx));
    let mut manager = IndexedMaterializationRuleManager::new(&grammar, &index_grammar);
    let response = manager
        .get_rules_for(&ctx, &list, 0, "next")
        .expect("Cannot get rules");
    match response {
        GrammarResponse::Default(response) => assert_eq!(response.rules.len(), 2),
        GrammarResponse::Indexed(_) => panic!("Expected a default response"),
    }
}
