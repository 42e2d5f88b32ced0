// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Finds the grammar rules that can resolve a violation point.

use fxhash::FxHashMap;

use crate::context::Context;
use crate::grammar::Grammar;
use crate::heap::HeapConfiguration;
use crate::index::NonterminalLabel;
use crate::materialization::GrammarRequest;

/// The rules found for one request, grouped by left-hand side, in grammar order.
pub type ResolvedRules<'g> = Vec<(&'g NonterminalLabel, Vec<&'g HeapConfiguration>)>;

/// Looks up grammar rules that create a selector at a particular tentacle.
pub struct ViolationPointResolver<'g> {
    grammar: &'g Grammar,
    cache: FxHashMap<GrammarRequest, ResolvedRules<'g>>,
    cache_requests: bool,
}

impl<'g> ViolationPointResolver<'g> {
    pub fn new(grammar: &'g Grammar) -> ViolationPointResolver<'g> {
        ViolationPointResolver {
            grammar,
            cache: FxHashMap::default(),
            cache_requests: true,
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Turns memoization of responses on or off.  Turning it off drops every cached response.
    pub fn set_cache_requests(&mut self, cache_requests: bool) {
        self.cache_requests = cache_requests;
        if !cache_requests {
            self.cache.clear();
        }
    }

    /// Returns, for every left-hand side that has the same underlying nonterminal as
    /// `nonterminal`, the right-hand sides whose external node at position `tentacle` has an
    /// outgoing selector named `selector`.  Left-hand sides without any such rule are omitted, so
    /// an empty result means that no rule can resolve the violation point.
    ///
    /// Indices are not compared here; rule managers for indexed grammars filter the result.
    pub fn get_rules_creating_selector_for(
        &mut self,
        ctx: &Context,
        nonterminal: &NonterminalLabel,
        tentacle: usize,
        selector: &str,
    ) -> ResolvedRules<'g> {
        let request = GrammarRequest::new(nonterminal, tentacle, selector);
        if let Some(cached) = self.cache.get(&request) {
            return cached.clone();
        }
        let grammar = self.grammar;
        let mut result = Vec::new();
        for (lhs, rules) in grammar.rules_with_nonterminal(nonterminal.nonterminal()) {
            let matching = rules
                .iter()
                .filter(|rule| creates_selector_at(ctx, rule, tentacle, selector))
                .collect::<Vec<_>>();
            if !matching.is_empty() {
                result.push((lhs, matching));
            }
        }
        if self.cache_requests {
            self.cache.insert(request, result.clone());
        }
        result
    }
}

fn creates_selector_at(
    ctx: &Context,
    rule: &HeapConfiguration,
    tentacle: usize,
    selector: &str,
) -> bool {
    rule.external_node_at(tentacle)
        .map_or(false, |node| rule.has_selector_named(ctx, node, selector))
}
