// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Indices: symbolic stacks attached to the nonterminal edges of indexed grammars.
//!
//! An indexed nonterminal is a plain [`Nonterminal`][] together with an [`Index`][], a sequence of
//! [`IndexSymbol`][]s read from start to end.  Concrete symbols record one level of unbounded
//! recursion (the depth of a balanced tree, say); a bottom symbol terminates the index.  An
//! abstract symbol at the end of an index stands for an unknown but fixed sequence of concrete
//! symbols, and is _materialized_ by unrolling it according to an [`IndexGrammar`][].  The single
//! index variable appears only in grammar rules, where it stands for whatever suffix the edge
//! being replaced happens to carry, and is _instantiated_ when a rule is applied.
//!
//! Indices are immutable values: every operation that "changes" one returns a new index.
//!
//! [`Nonterminal`]: ../context/struct.Nonterminal.html
//! [`Index`]: struct.Index.html
//! [`IndexSymbol`]: enum.IndexSymbol.html
//! [`IndexGrammar`]: trait.IndexGrammar.html

use fxhash::FxHashMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::arena::Handle;
use crate::context::AbstractSymbol;
use crate::context::ConcreteSymbol;
use crate::context::Context;
use crate::context::DisplayWithContext;
use crate::context::Nonterminal;

//-------------------------------------------------------------------------------------------------
// Index symbols

/// One symbol of an index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum IndexSymbol {
    /// A concrete symbol that does not terminate the index.
    Concrete(Handle<ConcreteSymbol>),
    /// A concrete symbol that terminates the index.
    Bottom(Handle<ConcreteSymbol>),
    /// An abstract symbol, to be unrolled by an index grammar.
    Abstract(Handle<AbstractSymbol>),
    /// The index variable.  There is exactly one.
    Variable,
}

impl IndexSymbol {
    /// Returns whether this is a concrete symbol, bottom or not.
    pub fn is_concrete(self) -> bool {
        matches!(self, IndexSymbol::Concrete(_) | IndexSymbol::Bottom(_))
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, IndexSymbol::Bottom(_))
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, IndexSymbol::Abstract(_))
    }

    pub fn is_variable(self) -> bool {
        matches!(self, IndexSymbol::Variable)
    }

    /// Returns the abstract symbol, if this is one.
    pub fn as_abstract(self) -> Option<Handle<AbstractSymbol>> {
        match self {
            IndexSymbol::Abstract(symbol) => Some(symbol),
            _ => None,
        }
    }
}

impl DisplayWithContext for IndexSymbol {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IndexSymbol::Concrete(symbol) | IndexSymbol::Bottom(symbol) => {
                write!(f, "{}", ctx[*symbol].name())
            }
            IndexSymbol::Abstract(symbol) => write!(f, "{}", ctx[*symbol].name()),
            IndexSymbol::Variable => write!(f, "()"),
        }
    }
}

//-------------------------------------------------------------------------------------------------
// Indices

/// An ordered sequence of index symbols.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Index {
    symbols: SmallVec<[IndexSymbol; 8]>,
}

impl Index {
    /// Creates a new, empty index.
    pub fn new() -> Index {
        Index::default()
    }

    pub fn from_symbols<I>(symbols: I) -> Index
    where
        I: IntoIterator<Item = IndexSymbol>,
    {
        Index {
            symbols: symbols.into_iter().collect(),
        }
    }

    pub fn symbols(&self) -> &[IndexSymbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<IndexSymbol> {
        self.symbols.get(position).copied()
    }

    /// Returns the final symbol of this index, if it is not empty.
    pub fn last_symbol(&self) -> Option<IndexSymbol> {
        self.symbols.last().copied()
    }

    /// Returns whether this index starts with the given symbols.
    pub fn starts_with(&self, prefix: &[IndexSymbol]) -> bool {
        self.symbols.starts_with(prefix)
    }

    /// Returns whether the final symbol of this index is `symbol`.
    pub fn ends_with(&self, symbol: IndexSymbol) -> bool {
        self.last_symbol() == Some(symbol)
    }

    /// Returns whether this index is fully concrete: it ends in a bottom symbol, and contains no
    /// abstract symbol and no variable.
    pub fn has_concrete_index(&self) -> bool {
        self.last_symbol().map_or(false, IndexSymbol::is_bottom)
            && self.symbols.iter().all(|symbol| symbol.is_concrete())
    }

    /// Returns whether the two indices consist of exactly the same symbols.
    pub fn matches_exactly(&self, other: &Index) -> bool {
        self.symbols == other.symbols
    }

    /// Returns a copy of this index without its final symbol.
    pub fn with_shortened(&self) -> Index {
        let mut symbols = self.symbols.clone();
        symbols.pop();
        Index { symbols }
    }

    /// Returns a copy of this index with `symbol` appended.
    pub fn with_prolonged(&self, symbol: IndexSymbol) -> Index {
        let mut symbols = self.symbols.clone();
        symbols.push(symbol);
        Index { symbols }
    }

    /// Returns a copy of this index in which a trailing abstract symbol or variable has been
    /// replaced by `suffix`.  If the index does not end in one, `suffix` is simply appended.
    pub fn with_prolonged_by(&self, suffix: &[IndexSymbol]) -> Index {
        let mut symbols = self.symbols.clone();
        if let Some(last) = symbols.last() {
            if !last.is_concrete() {
                symbols.pop();
            }
        }
        symbols.extend_from_slice(suffix);
        Index { symbols }
    }
}

impl DisplayWithContext for Index {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}]",
            self.symbols
                .iter()
                .format_with(",", |symbol, f| f(&symbol.display(ctx)))
        )
    }
}

//-------------------------------------------------------------------------------------------------
// Nonterminal labels

/// A nonterminal together with an index.  The index is part of the identity: two indexed
/// nonterminals with the same underlying nonterminal but different indices label different
/// edges.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IndexedNonterminal {
    nonterminal: Handle<Nonterminal>,
    index: Index,
}

impl IndexedNonterminal {
    pub fn new(nonterminal: Handle<Nonterminal>, index: Index) -> IndexedNonterminal {
        IndexedNonterminal { nonterminal, index }
    }

    pub fn nonterminal(&self) -> Handle<Nonterminal> {
        self.nonterminal
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Returns whether `other` has the same underlying nonterminal, regardless of the indices.
    pub fn has_same_label(&self, other: &IndexedNonterminal) -> bool {
        self.nonterminal == other.nonterminal
    }

    pub fn with_index(&self, index: Index) -> IndexedNonterminal {
        IndexedNonterminal {
            nonterminal: self.nonterminal,
            index,
        }
    }

    pub fn with_shortened_index(&self) -> IndexedNonterminal {
        self.with_index(self.index.with_shortened())
    }

    pub fn with_prolonged_index(&self, symbol: IndexSymbol) -> IndexedNonterminal {
        self.with_index(self.index.with_prolonged(symbol))
    }

    pub fn with_prolonged_index_by(&self, suffix: &[IndexSymbol]) -> IndexedNonterminal {
        self.with_index(self.index.with_prolonged_by(suffix))
    }
}

impl DisplayWithContext for IndexedNonterminal {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            ctx[self.nonterminal].name(),
            self.index.display(ctx)
        )
    }
}

/// The label of a nonterminal edge.  Grammars may freely mix plain and indexed nonterminals.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NonterminalLabel {
    Plain(Handle<Nonterminal>),
    Indexed(IndexedNonterminal),
}

impl NonterminalLabel {
    /// Returns the underlying nonterminal.
    pub fn nonterminal(&self) -> Handle<Nonterminal> {
        match self {
            NonterminalLabel::Plain(nonterminal) => *nonterminal,
            NonterminalLabel::Indexed(indexed) => indexed.nonterminal,
        }
    }

    pub fn rank(&self, ctx: &Context) -> usize {
        ctx[self.nonterminal()].rank()
    }

    pub fn as_indexed(&self) -> Option<&IndexedNonterminal> {
        match self {
            NonterminalLabel::Plain(_) => None,
            NonterminalLabel::Indexed(indexed) => Some(indexed),
        }
    }

    /// Returns whether `other` has the same underlying nonterminal, regardless of any indices.
    pub fn has_same_label(&self, other: &NonterminalLabel) -> bool {
        self.nonterminal() == other.nonterminal()
    }
}

impl From<Handle<Nonterminal>> for NonterminalLabel {
    fn from(nonterminal: Handle<Nonterminal>) -> NonterminalLabel {
        NonterminalLabel::Plain(nonterminal)
    }
}

impl From<IndexedNonterminal> for NonterminalLabel {
    fn from(indexed: IndexedNonterminal) -> NonterminalLabel {
        NonterminalLabel::Indexed(indexed)
    }
}

impl DisplayWithContext for NonterminalLabel {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            NonterminalLabel::Plain(nonterminal) => nonterminal.display_with(ctx, f),
            NonterminalLabel::Indexed(indexed) => indexed.display_with(ctx, f),
        }
    }
}

//-------------------------------------------------------------------------------------------------
// Index grammars

/// Describes how abstract index symbols unroll into concrete ones.
pub trait IndexGrammar {
    /// Returns the symbols that replace `abstract_symbol` in the production whose first symbol is
    /// `desired`, if there is one.
    fn rule_creating_symbol_for(
        &self,
        abstract_symbol: Handle<AbstractSymbol>,
        desired: IndexSymbol,
    ) -> Option<&[IndexSymbol]>;

    fn can_create_symbol_for(
        &self,
        abstract_symbol: Handle<AbstractSymbol>,
        desired: IndexSymbol,
    ) -> bool {
        self.rule_creating_symbol_for(abstract_symbol, desired)
            .is_some()
    }

    /// Returns every abstract symbol that has at least one production.
    fn abstract_symbols(&self) -> Vec<Handle<AbstractSymbol>>;
}

// Right-hand sides of one abstract symbol, keyed by the concrete symbol they start with.
type Productions = FxHashMap<IndexSymbol, SmallVec<[IndexSymbol; 2]>>;

/// An index grammar whose productions all have the shape `X -> c X'` or `X -> c`, with `c`
/// concrete.  Since every production starts with a distinct concrete symbol, the production that
/// yields a desired symbol is unique.
#[derive(Clone, Debug, Default)]
pub struct RightRegularIndexGrammar {
    productions: FxHashMap<Handle<AbstractSymbol>, Productions>,
}

impl RightRegularIndexGrammar {
    pub fn new() -> RightRegularIndexGrammar {
        RightRegularIndexGrammar::default()
    }

    /// The grammar `X -> s X | Z` and `Y -> s Y | C`, where `Z` and `C` are bottom symbols.  This
    /// is sufficient for balanced binary trees.
    pub fn balanced(ctx: &mut Context) -> RightRegularIndexGrammar {
        let x = ctx.add_abstract_symbol("X");
        let y = ctx.add_abstract_symbol("Y");
        let s = ctx.add_concrete_symbol("s", false);
        let z = ctx.add_concrete_symbol("Z", true);
        let c = ctx.add_concrete_symbol("C", true);
        let mut grammar = RightRegularIndexGrammar::new();
        grammar.add_production(x, s, Some(x));
        grammar.add_production(x, z, None);
        grammar.add_production(y, s, Some(y));
        grammar.add_production(y, c, None);
        grammar
    }

    /// Adds the production `abstract_symbol -> first rest`.  Productions that start with a symbol
    /// that is not concrete, or whose left-hand side is not abstract, are ignored.
    pub fn add_production(
        &mut self,
        abstract_symbol: IndexSymbol,
        first: IndexSymbol,
        rest: Option<IndexSymbol>,
    ) {
        let abstract_symbol = match abstract_symbol.as_abstract() {
            Some(abstract_symbol) => abstract_symbol,
            None => {
                log::warn!("ignoring index production with a non-abstract left-hand side");
                return;
            }
        };
        if !first.is_concrete() {
            log::warn!("ignoring index production that does not start with a concrete symbol");
            return;
        }
        let mut rhs = SmallVec::new();
        rhs.push(first);
        rhs.extend(rest);
        self.productions
            .entry(abstract_symbol)
            .or_default()
            .insert(first, rhs);
    }
}

impl IndexGrammar for RightRegularIndexGrammar {
    fn rule_creating_symbol_for(
        &self,
        abstract_symbol: Handle<AbstractSymbol>,
        desired: IndexSymbol,
    ) -> Option<&[IndexSymbol]> {
        self.productions
            .get(&abstract_symbol)
            .and_then(|productions| productions.get(&desired))
            .map(|rhs| rhs.as_slice())
    }

    fn abstract_symbols(&self) -> Vec<Handle<AbstractSymbol>> {
        self.productions.keys().copied().sorted().collect()
    }
}
