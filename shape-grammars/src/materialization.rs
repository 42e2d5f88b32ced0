// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Materializes nonterminal edges so that requested selectors become visible.
//!
//! When an analysis needs to follow `x.next`, but the node that `x` points to has no `next`
//! selector, the selector might still be hidden behind one of the nonterminal edges attached to
//! that node.  A (`x`, `next`) pair like this is a _violation point_.  Materialization resolves a
//! violation point in four steps:
//!
//!   1. The [`ViolationPointResolver`][] finds the grammar rules whose right-hand side creates a
//!      `next` selector at the external node that corresponds to the tentacle.
//!
//!   2. A [`MaterializationRuleManager`][] turns those rules into a [`GrammarResponse`][].  For
//!      indexed grammars, the response also records how abstract index symbols have to be
//!      unrolled, and binds the index variable of each rule.
//!
//!   3. A [`GrammarResponseApplier`][] applies the response, producing one heap configuration per
//!      applicable rule.  It uses [`get_materialized_clone_with`][] to perform the actual
//!      hyperedge replacement, and an [`IndexMaterializationStrategy`][] to unroll indices.
//!
//!   4. The [`GeneralMaterializationStrategy`][] drives the process, repeating it for each new
//!      heap configuration until every violation point has been resolved.
//!
//! [`ViolationPointResolver`]: resolver/struct.ViolationPointResolver.html
//! [`MaterializationRuleManager`]: rule_manager/trait.MaterializationRuleManager.html
//! [`GrammarResponse`]: enum.GrammarResponse.html
//! [`GrammarResponseApplier`]: applier/trait.GrammarResponseApplier.html
//! [`get_materialized_clone_with`]: graph_materializer/fn.get_materialized_clone_with.html
//! [`IndexMaterializationStrategy`]: index_materialization/struct.IndexMaterializationStrategy.html
//! [`GeneralMaterializationStrategy`]: strategy/struct.GeneralMaterializationStrategy.html

use thiserror::Error;

use crate::arena::Handle;
use crate::context::AbstractSymbol;
use crate::heap::HeapConfiguration;
use crate::heap::HeapConfigurationError;
use crate::index::IndexSymbol;
use crate::index::NonterminalLabel;
use crate::CancellationError;

pub mod applier;
pub mod graph_materializer;
pub mod index_materialization;
pub mod index_matcher;
pub mod resolver;
pub mod rule_manager;
pub mod strategy;
pub mod violation_points;

pub use applier::DefaultGrammarResponseApplier;
pub use applier::GrammarResponseApplier;
pub use applier::IndexedGrammarResponseApplier;
pub use index_materialization::IndexMaterializationStrategy;
pub use index_matcher::IndexMatcher;
pub use resolver::ViolationPointResolver;
pub use rule_manager::DefaultMaterializationRuleManager;
pub use rule_manager::IndexedMaterializationRuleManager;
pub use rule_manager::MaterializationRuleManager;
pub use strategy::GeneralMaterializationStrategy;
pub use strategy::MaterializationConfig;
pub use strategy::ProgramState;
pub use violation_points::ViolationPoints;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MaterializationError {
    #[error(transparent)]
    InvalidArgument(#[from] HeapConfigurationError),
    #[error("expected a {expected} grammar response, but got a {found} one")]
    WrongResponseType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("cannot materialize: {0}")]
    CannotMaterialize(String),
    #[error(transparent)]
    Cancelled(#[from] CancellationError),
}

//-------------------------------------------------------------------------------------------------
// Requests and responses

/// Asks for the rules that create selector `selector` at tentacle `tentacle` of an edge labeled
/// `nonterminal`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GrammarRequest {
    pub nonterminal: NonterminalLabel,
    pub tentacle: usize,
    pub selector: String,
}

impl GrammarRequest {
    pub fn new(nonterminal: &NonterminalLabel, tentacle: usize, selector: &str) -> GrammarRequest {
        GrammarRequest {
            nonterminal: nonterminal.clone(),
            tentacle,
            selector: selector.to_string(),
        }
    }
}

/// The rules that a rule manager found for a request.
#[derive(Clone, Debug)]
pub enum GrammarResponse {
    Default(DefaultGrammarResponse),
    Indexed(MaterializationAndRuleResponse),
}

impl GrammarResponse {
    /// Describes the shape of this response in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            GrammarResponse::Default(_) => "default",
            GrammarResponse::Indexed(_) => "indexed",
        }
    }

    /// Returns whether the response contains no rule at all.
    pub fn is_empty(&self) -> bool {
        match self {
            GrammarResponse::Default(response) => response.rules.is_empty(),
            GrammarResponse::Indexed(response) => response
                .materializations
                .iter()
                .all(|(_, rules)| rules.is_empty()),
        }
    }
}

/// A flat list of right-hand sides, each of which can directly replace the edge.
#[derive(Clone, Debug, Default)]
pub struct DefaultGrammarResponse {
    pub rules: Vec<HeapConfiguration>,
}

/// Right-hand sides grouped by the index unrolling they require.
///
/// Before any of the rules in a group can be applied, every edge of the heap configuration whose
/// index ends in `abstract_symbol` has to have that symbol replaced by the group's suffix.  An
/// empty suffix requires no unrolling.
#[derive(Clone, Debug, Default)]
pub struct MaterializationAndRuleResponse {
    pub abstract_symbol: Option<Handle<AbstractSymbol>>,
    pub materializations: Vec<(Vec<IndexSymbol>, Vec<HeapConfiguration>)>,
}

impl MaterializationAndRuleResponse {
    /// Adds rules to the group of a suffix, creating the group if needed.  Groups keep the order
    /// in which their suffixes were first seen.
    pub fn add_rules<I>(&mut self, suffix: Vec<IndexSymbol>, rules: I)
    where
        I: IntoIterator<Item = HeapConfiguration>,
    {
        match self
            .materializations
            .iter_mut()
            .find(|(existing, _)| *existing == suffix)
        {
            Some((_, existing)) => existing.extend(rules),
            None => self.materializations.push((suffix, rules.into_iter().collect())),
        }
    }

    pub fn rules_for(&self, suffix: &[IndexSymbol]) -> &[HeapConfiguration] {
        self.materializations
            .iter()
            .find(|(existing, _)| existing.as_slice() == suffix)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or(&[])
    }
}
