// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Turns violation-point queries into grammar responses.

use fxhash::FxHashMap;

use crate::context::Context;
use crate::grammar::Grammar;
use crate::heap::HeapConfiguration;
use crate::index::IndexGrammar;
use crate::index::IndexSymbol;
use crate::index::IndexedNonterminal;
use crate::index::NonterminalLabel;
use crate::materialization::resolver::ResolvedRules;
use crate::materialization::DefaultGrammarResponse;
use crate::materialization::GrammarRequest;
use crate::materialization::GrammarResponse;
use crate::materialization::IndexMatcher;
use crate::materialization::MaterializationAndRuleResponse;
use crate::materialization::MaterializationError;
use crate::materialization::ViolationPointResolver;

/// Finds the rules that can create a selector at a tentacle of a nonterminal edge.
pub trait MaterializationRuleManager {
    /// Returns the rules that create a selector named `selector` at tentacle `tentacle` of an edge
    /// labeled `nonterminal`.  An empty response means that the violation point cannot be
    /// resolved via this edge.
    fn get_rules_for(
        &mut self,
        ctx: &Context,
        nonterminal: &NonterminalLabel,
        tentacle: usize,
        selector: &str,
    ) -> Result<&GrammarResponse, MaterializationError>;

    /// Turns memoization of responses on or off.
    fn set_cache_requests(&mut self, cache_requests: bool);
}

// Responses are always stored in the map, so that we can hand out references to them.  Without
// caching, the map only ever holds the most recent response.
struct ResponseCache {
    responses: FxHashMap<GrammarRequest, GrammarResponse>,
    cache_requests: bool,
}

impl ResponseCache {
    fn new() -> ResponseCache {
        ResponseCache {
            responses: FxHashMap::default(),
            cache_requests: true,
        }
    }

    fn get_or_insert_with<F>(
        &mut self,
        request: GrammarRequest,
        compute: F,
    ) -> Result<&GrammarResponse, MaterializationError>
    where
        F: FnOnce() -> Result<GrammarResponse, MaterializationError>,
    {
        if !self.responses.contains_key(&request) {
            if !self.cache_requests {
                self.responses.clear();
            }
            let response = compute()?;
            self.responses.insert(request.clone(), response);
        }
        Ok(&self.responses[&request])
    }
}

fn flatten(rules: ResolvedRules<'_>) -> DefaultGrammarResponse {
    DefaultGrammarResponse {
        rules: rules
            .into_iter()
            .flat_map(|(_, rules)| rules.into_iter().cloned())
            .collect(),
    }
}

//-------------------------------------------------------------------------------------------------
// Default rule manager

/// A rule manager for grammars without indices.  Its responses contain every rule that the
/// resolver finds, regardless of left-hand side.
pub struct DefaultMaterializationRuleManager<'g> {
    resolver: ViolationPointResolver<'g>,
    cache: ResponseCache,
}

impl<'g> DefaultMaterializationRuleManager<'g> {
    pub fn new(grammar: &'g Grammar) -> DefaultMaterializationRuleManager<'g> {
        DefaultMaterializationRuleManager {
            resolver: ViolationPointResolver::new(grammar),
            cache: ResponseCache::new(),
        }
    }
}

impl<'g> MaterializationRuleManager for DefaultMaterializationRuleManager<'g> {
    fn get_rules_for(
        &mut self,
        ctx: &Context,
        nonterminal: &NonterminalLabel,
        tentacle: usize,
        selector: &str,
    ) -> Result<&GrammarResponse, MaterializationError> {
        let request = GrammarRequest::new(nonterminal, tentacle, selector);
        let resolver = &mut self.resolver;
        self.cache.get_or_insert_with(request, || {
            let rules =
                resolver.get_rules_creating_selector_for(ctx, nonterminal, tentacle, selector);
            Ok(GrammarResponse::Default(flatten(rules)))
        })
    }

    fn set_cache_requests(&mut self, cache_requests: bool) {
        self.resolver.set_cache_requests(cache_requests);
        self.cache.cache_requests = cache_requests;
    }
}

//-------------------------------------------------------------------------------------------------
// Indexed rule manager

/// A rule manager for indexed grammars.  Requests for plain nonterminals are answered like the
/// default rule manager does.
///
/// For an indexed nonterminal, only left-hand sides whose index can match the nonterminal's are
/// considered.  Their rules are grouped by the unrolling of the nonterminal's final abstract
/// symbol that the match requires, and the index variable of each rule is bound to the part of
/// the nonterminal's index that the left-hand side leaves open.
pub struct IndexedMaterializationRuleManager<'g, G: ?Sized> {
    resolver: ViolationPointResolver<'g>,
    matcher: IndexMatcher<'g, G>,
    cache: ResponseCache,
}

impl<'g, G> IndexedMaterializationRuleManager<'g, G>
where
    G: IndexGrammar + ?Sized,
{
    pub fn new(
        grammar: &'g Grammar,
        index_grammar: &'g G,
    ) -> IndexedMaterializationRuleManager<'g, G> {
        IndexedMaterializationRuleManager {
            resolver: ViolationPointResolver::new(grammar),
            matcher: IndexMatcher::new(index_grammar),
            cache: ResponseCache::new(),
        }
    }
}

impl<'g, G> MaterializationRuleManager for IndexedMaterializationRuleManager<'g, G>
where
    G: IndexGrammar + ?Sized,
{
    fn get_rules_for(
        &mut self,
        ctx: &Context,
        nonterminal: &NonterminalLabel,
        tentacle: usize,
        selector: &str,
    ) -> Result<&GrammarResponse, MaterializationError> {
        let request = GrammarRequest::new(nonterminal, tentacle, selector);
        let resolver = &mut self.resolver;
        let matcher = &mut self.matcher;
        self.cache.get_or_insert_with(request, || {
            let rules =
                resolver.get_rules_creating_selector_for(ctx, nonterminal, tentacle, selector);
            match nonterminal {
                NonterminalLabel::Plain(_) => Ok(GrammarResponse::Default(flatten(rules))),
                NonterminalLabel::Indexed(to_replace) => {
                    let response = indexed_response(ctx, matcher, to_replace, rules)?;
                    Ok(GrammarResponse::Indexed(response))
                }
            }
        })
    }

    fn set_cache_requests(&mut self, cache_requests: bool) {
        self.resolver.set_cache_requests(cache_requests);
        self.cache.cache_requests = cache_requests;
    }
}

fn indexed_response<G>(
    ctx: &Context,
    matcher: &mut IndexMatcher<'_, G>,
    to_replace: &IndexedNonterminal,
    rules: ResolvedRules<'_>,
) -> Result<MaterializationAndRuleResponse, MaterializationError>
where
    G: IndexGrammar + ?Sized,
{
    let mut response = MaterializationAndRuleResponse {
        abstract_symbol: to_replace
            .index()
            .last_symbol()
            .and_then(IndexSymbol::as_abstract),
        materializations: Vec::new(),
    };
    for (lhs, rules) in rules {
        let lhs = match lhs.as_indexed() {
            Some(lhs) => lhs,
            None => continue,
        };
        if !matcher.can_match(to_replace, lhs) {
            continue;
        }
        let (_, materialization) = matcher.get_materialization_rule(to_replace, lhs);
        let instantiation = matcher.get_necessary_instantiation(to_replace, lhs);
        let mut instantiated = Vec::with_capacity(rules.len());
        for rule in rules {
            instantiated.push(instantiate(ctx, rule, &instantiation)?);
        }
        response.add_rules(materialization, instantiated);
    }
    Ok(response)
}

/// Returns a copy of `rule` in which every index that ends in the index variable has the
/// variable replaced by `instantiation`.
fn instantiate(
    ctx: &Context,
    rule: &HeapConfiguration,
    instantiation: &[IndexSymbol],
) -> Result<HeapConfiguration, MaterializationError> {
    let mut result = rule.clone();
    if instantiation.is_empty() {
        return Ok(result);
    }
    let edges = rule
        .nonterminal_edges()
        .filter_map(|edge| match rule.label_of(edge) {
            Some(NonterminalLabel::Indexed(indexed))
                if indexed.index().ends_with(IndexSymbol::Variable) =>
            {
                Some((edge, indexed.with_prolonged_index_by(instantiation)))
            }
            _ => None,
        })
        .collect::<Vec<_>>();
    {
        let mut builder = result.builder(ctx);
        for (edge, label) in edges {
            builder.replace_nonterminal(edge, label)?;
        }
    }
    Ok(result)
}
