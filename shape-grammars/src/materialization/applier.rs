// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Applies grammar responses to heap configurations.

use crate::arena::Handle;
use crate::context::Context;
use crate::heap::HeapConfiguration;
use crate::heap::NonterminalEdge;
use crate::materialization::graph_materializer::get_materialized_clone_with;
use crate::materialization::GrammarResponse;
use crate::materialization::IndexMaterializationStrategy;
use crate::materialization::MaterializationAndRuleResponse;
use crate::materialization::MaterializationError;

/// Realizes a grammar response as the heap configurations it describes.
pub trait GrammarResponseApplier {
    /// Returns one heap configuration for every rule in `response`, each of which is a copy of
    /// `heap` in which `edge` has been replaced by that rule.
    fn apply_grammar_response_to(
        &self,
        ctx: &Context,
        heap: &HeapConfiguration,
        edge: Handle<NonterminalEdge>,
        response: &GrammarResponse,
    ) -> Result<Vec<HeapConfiguration>, MaterializationError>;
}

/// Applies responses of default rule managers.  Refuses indexed responses.
#[derive(Clone, Debug, Default)]
pub struct DefaultGrammarResponseApplier;

impl DefaultGrammarResponseApplier {
    pub fn new() -> DefaultGrammarResponseApplier {
        DefaultGrammarResponseApplier
    }
}

impl GrammarResponseApplier for DefaultGrammarResponseApplier {
    fn apply_grammar_response_to(
        &self,
        ctx: &Context,
        heap: &HeapConfiguration,
        edge: Handle<NonterminalEdge>,
        response: &GrammarResponse,
    ) -> Result<Vec<HeapConfiguration>, MaterializationError> {
        let response = match response {
            GrammarResponse::Default(response) => response,
            GrammarResponse::Indexed(_) => {
                return Err(MaterializationError::WrongResponseType {
                    expected: "default",
                    found: response.kind(),
                })
            }
        };
        apply_rules(ctx, heap, edge, &response.rules)
    }
}

fn apply_rules(
    ctx: &Context,
    heap: &HeapConfiguration,
    edge: Handle<NonterminalEdge>,
    rules: &[HeapConfiguration],
) -> Result<Vec<HeapConfiguration>, MaterializationError> {
    let mut result = Vec::with_capacity(rules.len());
    for rule in rules {
        result.push(get_materialized_clone_with(ctx, heap, edge, rule)?);
    }
    Ok(result)
}

/// Applies responses of indexed rule managers.  Before the rules of each group are applied, the
/// group's index unrolling is applied to the whole heap configuration.  Default responses are
/// applied like the default applier does.
#[derive(Clone, Debug, Default)]
pub struct IndexedGrammarResponseApplier {
    index_materialization: IndexMaterializationStrategy,
    default_applier: DefaultGrammarResponseApplier,
}

impl IndexedGrammarResponseApplier {
    pub fn new(
        index_materialization: IndexMaterializationStrategy,
    ) -> IndexedGrammarResponseApplier {
        IndexedGrammarResponseApplier {
            index_materialization,
            default_applier: DefaultGrammarResponseApplier::new(),
        }
    }

    fn apply_indexed_response(
        &self,
        ctx: &Context,
        heap: &HeapConfiguration,
        edge: Handle<NonterminalEdge>,
        response: &MaterializationAndRuleResponse,
    ) -> Result<Vec<HeapConfiguration>, MaterializationError> {
        let mut result = Vec::new();
        for (suffix, rules) in &response.materializations {
            let unrolled = match (response.abstract_symbol, suffix.is_empty()) {
                (_, true) => Ok(heap.clone()),
                (Some(abstract_symbol), false) => self
                    .index_materialization
                    .get_materialized_clone_with(ctx, heap, abstract_symbol, suffix),
                (None, false) => Err(MaterializationError::CannotMaterialize(
                    "unrolling requested for an index without an abstract symbol".to_string(),
                )),
            };
            let unrolled = match unrolled {
                Ok(unrolled) => unrolled,
                Err(MaterializationError::CannotMaterialize(reason)) => {
                    log::error!("Skipping index unrolling: {}", reason);
                    continue;
                }
                Err(err) => return Err(err),
            };
            result.extend(apply_rules(ctx, &unrolled, edge, rules)?);
        }
        Ok(result)
    }
}

impl GrammarResponseApplier for IndexedGrammarResponseApplier {
    fn apply_grammar_response_to(
        &self,
        ctx: &Context,
        heap: &HeapConfiguration,
        edge: Handle<NonterminalEdge>,
        response: &GrammarResponse,
    ) -> Result<Vec<HeapConfiguration>, MaterializationError> {
        match response {
            GrammarResponse::Default(_) => self
                .default_applier
                .apply_grammar_response_to(ctx, heap, edge, response),
            GrammarResponse::Indexed(response) => {
                self.apply_indexed_response(ctx, heap, edge, response)
            }
        }
    }
}
