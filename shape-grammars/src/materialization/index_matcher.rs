// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Compares the indices of two indexed nonterminals.
//!
//! Every query takes two nonterminals: a _materializable_ one, usually the label of an edge in
//! the heap configuration being materialized, and an _instantiable_ one, usually the left-hand
//! side of a grammar rule.  The materializable index may end in an abstract symbol, which can be
//! unrolled using the productions of an [`IndexGrammar`][] until it lines up with the
//! instantiable index.  The instantiable index may end in the index variable, which is bound to
//! whatever remains of the materializable index.
//!
//! [`IndexGrammar`]: ../../index/trait.IndexGrammar.html

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::arena::Handle;
use crate::context::AbstractSymbol;
use crate::index::IndexGrammar;
use crate::index::IndexSymbol;
use crate::index::IndexedNonterminal;

#[derive(Clone, Debug, Default)]
struct IndexMatch {
    // The symbols that replace the final symbol of the materializable index.
    materialization: SmallVec<[IndexSymbol; 4]>,
    // The symbols that the index variable of the instantiable index is bound to.
    instantiation: SmallVec<[IndexSymbol; 4]>,
}

/// Decides whether indices are compatible.  Results are memoized, so reuse a matcher as long as
/// its index grammar does not change.
pub struct IndexMatcher<'g, G: ?Sized> {
    index_grammar: &'g G,
    cache: FxHashMap<(IndexedNonterminal, IndexedNonterminal), Option<IndexMatch>>,
}

impl<'g, G> IndexMatcher<'g, G>
where
    G: IndexGrammar + ?Sized,
{
    pub fn new(index_grammar: &'g G) -> IndexMatcher<'g, G> {
        IndexMatcher {
            index_grammar,
            cache: FxHashMap::default(),
        }
    }

    pub fn index_grammar(&self) -> &'g G {
        self.index_grammar
    }

    /// Returns whether the two indices can be made to agree by unrolling the final abstract
    /// symbol of `materializable` and binding the index variable of `instantiable`.  Only two
    /// different concrete symbols at the same position, or an abstract symbol that the index
    /// grammar cannot unroll into the desired concrete symbol, rule out a match.
    pub fn can_match(
        &mut self,
        materializable: &IndexedNonterminal,
        instantiable: &IndexedNonterminal,
    ) -> bool {
        self.get_match(materializable, instantiable).is_some()
    }

    pub fn needs_materialization(
        &mut self,
        materializable: &IndexedNonterminal,
        instantiable: &IndexedNonterminal,
    ) -> bool {
        self.get_match(materializable, instantiable)
            .map_or(false, |m| !m.materialization.is_empty())
    }

    /// Returns the abstract symbol to unroll, and the symbols to replace it with.  Returns `None`
    /// and an empty suffix if no unrolling is needed, or if the indices cannot match at all.
    pub fn get_materialization_rule(
        &mut self,
        materializable: &IndexedNonterminal,
        instantiable: &IndexedNonterminal,
    ) -> (Option<Handle<AbstractSymbol>>, Vec<IndexSymbol>) {
        match self.get_match(materializable, instantiable) {
            Some(m) if !m.materialization.is_empty() => (
                materializable
                    .index()
                    .last_symbol()
                    .and_then(IndexSymbol::as_abstract),
                m.materialization.to_vec(),
            ),
            _ => (None, Vec::new()),
        }
    }

    pub fn needs_instantiation(
        &mut self,
        materializable: &IndexedNonterminal,
        instantiable: &IndexedNonterminal,
    ) -> bool {
        self.get_match(materializable, instantiable)
            .map_or(false, |m| !m.instantiation.is_empty())
    }

    /// Returns the symbols that the index variable of `instantiable` has to be bound to.
    pub fn get_necessary_instantiation(
        &mut self,
        materializable: &IndexedNonterminal,
        instantiable: &IndexedNonterminal,
    ) -> Vec<IndexSymbol> {
        self.get_match(materializable, instantiable)
            .map(|m| m.instantiation.to_vec())
            .unwrap_or_default()
    }

    fn get_match(
        &mut self,
        materializable: &IndexedNonterminal,
        instantiable: &IndexedNonterminal,
    ) -> Option<&IndexMatch> {
        let key = (materializable.clone(), instantiable.clone());
        if !self.cache.contains_key(&key) {
            let computed = compute_match(self.index_grammar, materializable, instantiable);
            self.cache.insert(key.clone(), computed);
        }
        self.cache.get(&key).and_then(Option::as_ref)
    }
}

fn compute_match<G>(
    index_grammar: &G,
    materializable: &IndexedNonterminal,
    instantiable: &IndexedNonterminal,
) -> Option<IndexMatch>
where
    G: IndexGrammar + ?Sized,
{
    if !materializable.has_same_label(instantiable) {
        return None;
    }
    let left = materializable.index().symbols();
    let right = instantiable.index().symbols();
    let mut result = IndexMatch::default();
    for position in 0..left.len().max(right.len()) {
        // Past the end of the materializable index, its final symbol has been replaced by the
        // materialization, whose first symbol lines up with that final symbol.
        let materializable_symbol = if position < left.len() {
            left[position]
        } else {
            *result.materialization.get(position + 1 - left.len())?
        };
        let instantiable_symbol = right
            .get(position)
            .copied()
            .unwrap_or(IndexSymbol::Variable);

        if materializable_symbol == instantiable_symbol {
            continue;
        }
        match (materializable_symbol, instantiable_symbol) {
            (_, IndexSymbol::Variable) => result.instantiation.push(materializable_symbol),
            (IndexSymbol::Abstract(abstract_symbol), desired) if desired.is_concrete() => {
                let production = index_grammar.rule_creating_symbol_for(abstract_symbol, desired)?;
                result.materialization.pop();
                result.materialization.extend_from_slice(production);
            }
            (found, desired) if found.is_concrete() && desired.is_concrete() => return None,
            // Abstract symbols on the instantiable side, or two different abstract symbols, do
            // not constrain the match.
            _ => {}
        }
    }
    Some(result)
}
