// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Unrolls abstract index symbols throughout a heap configuration.

use fxhash::FxHashSet;

use crate::arena::Handle;
use crate::context::AbstractSymbol;
use crate::context::Context;
use crate::heap::HeapConfiguration;
use crate::index::IndexGrammar;
use crate::index::IndexSymbol;
use crate::index::NonterminalLabel;
use crate::materialization::MaterializationError;

/// Replaces an abstract index symbol by a suffix in every edge that ends in it.
#[derive(Clone, Debug, Default)]
pub struct IndexMaterializationStrategy {
    known_symbols: Option<FxHashSet<Handle<AbstractSymbol>>>,
}

impl IndexMaterializationStrategy {
    /// Creates a strategy that accepts every abstract symbol.
    pub fn new() -> IndexMaterializationStrategy {
        IndexMaterializationStrategy::default()
    }

    /// Creates a strategy that refuses to unroll abstract symbols that `index_grammar` has no
    /// production for.
    pub fn for_index_grammar<G>(index_grammar: &G) -> IndexMaterializationStrategy
    where
        G: IndexGrammar + ?Sized,
    {
        IndexMaterializationStrategy {
            known_symbols: Some(index_grammar.abstract_symbols().into_iter().collect()),
        }
    }

    /// Returns a copy of `heap` in which the final symbol of every indexed nonterminal edge
    /// whose index ends in `abstract_symbol` has been replaced by `suffix`.  All other edges are
    /// copied unchanged.  An empty suffix leaves the heap unchanged.
    ///
    /// Fails with `CannotMaterialize` if `abstract_symbol` is not known to the index grammar, or
    /// if no edge of `heap` ends in it.
    pub fn get_materialized_clone_with(
        &self,
        ctx: &Context,
        heap: &HeapConfiguration,
        abstract_symbol: Handle<AbstractSymbol>,
        suffix: &[IndexSymbol],
    ) -> Result<HeapConfiguration, MaterializationError> {
        if suffix.is_empty() {
            return Ok(heap.clone());
        }
        let symbol_name = || ctx[abstract_symbol].name().to_string();
        if let Some(known_symbols) = &self.known_symbols {
            if !known_symbols.contains(&abstract_symbol) {
                return Err(MaterializationError::CannotMaterialize(format!(
                    "abstract symbol {} has no index production",
                    symbol_name()
                )));
            }
        }

        let target = IndexSymbol::Abstract(abstract_symbol);
        let edges = heap
            .nonterminal_edges()
            .filter_map(|edge| match heap.label_of(edge) {
                Some(NonterminalLabel::Indexed(indexed)) if indexed.index().ends_with(target) => {
                    Some((edge, indexed.with_prolonged_index_by(suffix)))
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        if edges.is_empty() {
            return Err(MaterializationError::CannotMaterialize(format!(
                "no nonterminal edge ends in abstract symbol {}",
                symbol_name()
            )));
        }
        copious_debugging!(
            "Unrolling {} by {} symbols in {} edges",
            symbol_name(),
            suffix.len(),
            edges.len()
        );

        let mut result = heap.clone();
        {
            let mut builder = result.builder(ctx);
            for (edge, label) in edges {
                builder.replace_nonterminal(edge, label)?;
            }
        }
        Ok(result)
    }
}
