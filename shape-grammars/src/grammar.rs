// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Hyperedge replacement grammars.
//!
//! A [`Grammar`][] maps nonterminal labels (its left-hand sides) to the heap configurations that
//! may replace an edge with that label (its right-hand sides).  Every right-hand side has exactly
//! as many external nodes as its left-hand side has tentacles.  Grammars are built once, using a
//! [`GrammarBuilder`][], and are immutable afterwards.  Rules keep the order in which they were
//! added, so every algorithm that iterates over a grammar is deterministic.
//!
//! [`Grammar`]: struct.Grammar.html
//! [`GrammarBuilder`]: struct.GrammarBuilder.html

use fxhash::FxHashMap;
use thiserror::Error;

use crate::arena::Handle;
use crate::context::Context;
use crate::context::Nonterminal;
use crate::heap::HeapConfiguration;
use crate::heap::HeapConfigurationError;
use crate::index::NonterminalLabel;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GrammarError {
    #[error("rule for nonterminal {nonterminal} has {actual} external nodes, but the nonterminal has rank {expected}")]
    ExternalCountMismatch {
        nonterminal: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    InvalidRule(#[from] HeapConfigurationError),
}

/// A right-hand side in which some external nodes have been merged.
#[derive(Clone, Debug)]
pub struct CollapsedHeapConfiguration {
    rule: usize,
    collapsed: HeapConfiguration,
    external_mapping: Vec<usize>,
}

impl CollapsedHeapConfiguration {
    /// The position of the original right-hand side among the rules of its left-hand side.
    pub fn rule(&self) -> usize {
        self.rule
    }

    pub fn collapsed(&self) -> &HeapConfiguration {
        &self.collapsed
    }

    /// The mapping passed to `merge_externals` to produce the collapsed right-hand side.
    pub fn external_mapping(&self) -> &[usize] {
        &self.external_mapping
    }
}

/// An immutable hyperedge replacement grammar.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    rules: Vec<(NonterminalLabel, Vec<HeapConfiguration>)>,
    collapsed_rules: FxHashMap<NonterminalLabel, Vec<CollapsedHeapConfiguration>>,
}

impl Grammar {
    pub fn builder(ctx: &Context) -> GrammarBuilder<'_> {
        GrammarBuilder {
            ctx,
            rules: Vec::new(),
            collapse: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the total number of rules.
    pub fn count_rules(&self) -> usize {
        self.rules.iter().map(|(_, rhs)| rhs.len()).sum()
    }

    pub fn left_hand_sides(&self) -> impl Iterator<Item = &NonterminalLabel> + '_ {
        self.rules.iter().map(|(lhs, _)| lhs)
    }

    /// Returns the right-hand sides of exactly this left-hand side.
    pub fn right_hand_sides_for(&self, lhs: &NonterminalLabel) -> &[HeapConfiguration] {
        self.rules
            .iter()
            .find(|(candidate, _)| candidate == lhs)
            .map(|(_, rhs)| rhs.as_slice())
            .unwrap_or(&[])
    }

    /// Returns every left-hand side whose underlying nonterminal is `nonterminal`, regardless of
    /// its index, together with its right-hand sides.
    pub fn rules_with_nonterminal(
        &self,
        nonterminal: Handle<Nonterminal>,
    ) -> impl Iterator<Item = (&NonterminalLabel, &[HeapConfiguration])> + '_ {
        self.rules
            .iter()
            .filter(move |(lhs, _)| lhs.nonterminal() == nonterminal)
            .map(|(lhs, rhs)| (lhs, rhs.as_slice()))
    }

    /// Returns the collapsed right-hand sides of a left-hand side.  Empty unless the grammar was
    /// built with [`GrammarBuilder::update_collapsed_rules`][].
    ///
    /// [`GrammarBuilder::update_collapsed_rules`]: struct.GrammarBuilder.html#method.update_collapsed_rules
    pub fn collapsed_right_hand_sides_for(
        &self,
        lhs: &NonterminalLabel,
    ) -> &[CollapsedHeapConfiguration] {
        self.collapsed_rules
            .get(lhs)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

//-------------------------------------------------------------------------------------------------
// Building grammars

pub struct GrammarBuilder<'a> {
    ctx: &'a Context,
    rules: Vec<(NonterminalLabel, Vec<HeapConfiguration>)>,
    collapse: bool,
}

impl<'a> GrammarBuilder<'a> {
    /// Adds a rule.  `rhs` must have one external node per tentacle of `lhs`.
    pub fn add_rule<L>(
        &mut self,
        lhs: L,
        rhs: HeapConfiguration,
    ) -> Result<&mut Self, GrammarError>
    where
        L: Into<NonterminalLabel>,
    {
        let lhs = lhs.into();
        let expected = lhs.rank(self.ctx);
        if rhs.count_external_nodes() != expected {
            return Err(GrammarError::ExternalCountMismatch {
                nonterminal: ctx_name(self.ctx, &lhs),
                expected,
                actual: rhs.count_external_nodes(),
            });
        }
        match self.rules.iter_mut().find(|(candidate, _)| *candidate == lhs) {
            Some((_, rules)) => rules.push(rhs),
            None => self.rules.push((lhs, vec![rhs])),
        }
        Ok(self)
    }

    pub fn add_rules<L, I>(&mut self, lhs: L, rhs: I) -> Result<&mut Self, GrammarError>
    where
        L: Into<NonterminalLabel>,
        I: IntoIterator<Item = HeapConfiguration>,
    {
        let lhs = lhs.into();
        for rhs in rhs {
            self.add_rule(lhs.clone(), rhs)?;
        }
        Ok(self)
    }

    /// Adds every rule of an existing grammar.
    pub fn add_grammar(&mut self, grammar: &Grammar) -> Result<&mut Self, GrammarError> {
        for (lhs, rhs) in &grammar.rules {
            self.add_rules(lhs.clone(), rhs.iter().cloned())?;
        }
        Ok(self)
    }

    /// Requests that the built grammar also contain the collapsed version of each rule.
    pub fn update_collapsed_rules(&mut self) -> &mut Self {
        self.collapse = true;
        self
    }

    pub fn build(&mut self) -> Result<Grammar, GrammarError> {
        let rules = std::mem::take(&mut self.rules);
        let mut collapsed_rules = FxHashMap::default();
        if self.collapse {
            for (lhs, rhs) in &rules {
                let reduction_tentacles = self.ctx[lhs.nonterminal()].reduction_tentacles();
                let mut collapsed = Vec::new();
                for (rule, heap) in rhs.iter().enumerate() {
                    for partition in external_partitions(heap, reduction_tentacles) {
                        let mut merged = heap.clone();
                        merged.builder(self.ctx).merge_externals(&partition)?;
                        collapsed.push(CollapsedHeapConfiguration {
                            rule,
                            collapsed: merged,
                            external_mapping: partition,
                        });
                    }
                }
                collapsed_rules.insert(lhs.clone(), collapsed);
            }
        }
        Ok(Grammar {
            rules,
            collapsed_rules,
        })
    }
}

fn ctx_name(ctx: &Context, lhs: &NonterminalLabel) -> String {
    ctx[lhs.nonterminal()].name().to_string()
}

//-------------------------------------------------------------------------------------------------
// Partitioning external nodes

/// Computes every way of merging the external nodes of `heap` that identifies at least two of
/// them.  Each result maps old external positions to new ones.  Only nodes of the same type are
/// merged, each group contains at most one non-reduction tentacle, and partitions that differ
/// only in the numbering of their groups are reported once.
pub fn external_partitions(
    heap: &HeapConfiguration,
    reduction_tentacles: &[bool],
) -> Vec<Vec<usize>> {
    let count_old = heap.count_external_nodes();
    let mut partitions = Vec::new();
    if count_old < 2 {
        return partitions;
    }
    let mut chosen = Vec::with_capacity(count_old);
    generate_partitions(
        heap,
        reduction_tentacles,
        count_old - 1,
        &mut chosen,
        &mut partitions,
    );
    partitions
}

fn generate_partitions(
    heap: &HeapConfiguration,
    reduction_tentacles: &[bool],
    count_new: usize,
    chosen: &mut Vec<usize>,
    partitions: &mut Vec<Vec<usize>>,
) {
    let count_old = heap.count_external_nodes();
    if chosen.len() >= count_old {
        let max = chosen.iter().copied().max().unwrap_or(0);
        if (0..=max).all(|position| chosen.contains(&position))
            && !partitions
                .iter()
                .any(|existing| same_partition(existing, chosen))
        {
            partitions.push(chosen.clone());
        }
        return;
    }
    let position = chosen.len();
    for group in 0..count_new {
        if let Some(first) = chosen.iter().position(|g| *g == group) {
            let first_type = heap.external_node_at(first).and_then(|n| heap.node_type_of(n));
            let this_type = heap
                .external_node_at(position)
                .and_then(|n| heap.node_type_of(n));
            if first_type != this_type {
                continue;
            }
            let is_reduction =
                |tentacle: usize| reduction_tentacles.get(tentacle).copied().unwrap_or(false);
            if !is_reduction(position)
                && chosen
                    .iter()
                    .enumerate()
                    .any(|(other, g)| *g == group && !is_reduction(other))
            {
                continue;
            }
        }
        chosen.push(group);
        generate_partitions(heap, reduction_tentacles, count_new, chosen, partitions);
        chosen.pop();
    }
}

/// Two mappings describe the same partition if one is a consistent renaming of the other.
fn same_partition(left: &[usize], right: &[usize]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut renaming = FxHashMap::default();
    let mut used = FxHashMap::default();
    for (l, r) in left.iter().zip(right) {
        match renaming.get(l) {
            Some(existing) if existing != r => return false,
            Some(_) => {}
            None => {
                if used.insert(*r, *l).is_some() {
                    return false;
                }
                renaming.insert(*l, *r);
            }
        }
    }
    true
}
