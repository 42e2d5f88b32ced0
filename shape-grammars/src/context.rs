// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Interned vocabulary shared by heap configurations and grammars.
//!
//! Node types, selector labels, nonterminals, and index symbols are all identified by name.  We
//! never store those names inside of a heap configuration; instead, a [`Context`][] interns each
//! name once and hands out a [`Handle`][] for it.  Two handles from the same context are equal
//! exactly when the names (and, where relevant, the extra data such as a nonterminal's rank) are
//! equal, so comparing and hashing vocabulary is an integer operation.
//!
//! Interning requires `&mut Context`.  Every algorithm in this crate only reads from the context,
//! so once you have interned your vocabulary you can share the context freely.
//!
//! [`Context`]: struct.Context.html
//! [`Handle`]: ../arena/struct.Handle.html

use std::fmt::Display;
use std::ops::Index;

use fxhash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::arena::Arena;
use crate::arena::Handle;
use crate::index::IndexSymbol;

//-------------------------------------------------------------------------------------------------
// Vocabulary

/// The type of a node.  Types are opaque tags; the selectors that are legal for a node of a given
/// type are determined by the surrounding analysis, not by us.
pub struct NodeType {
    name: Box<str>,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The label of a selector edge, with an optional annotation.
///
/// Annotations are used by indexed grammars to record local balancing information (for instance,
/// `left[+1]`).  They are part of the label's identity, but are ignored when we ask whether a
/// selector with a given _name_ exists.
pub struct SelectorLabel {
    name: Box<str>,
    annotation: Option<Box<str>>,
}

impl SelectorLabel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Returns whether this label has the given base name, regardless of its annotation.
    pub fn has_name(&self, name: &str) -> bool {
        &*self.name == name
    }
}

/// A nonterminal of a hyperedge replacement grammar.
pub struct Nonterminal {
    name: Box<str>,
    reduction_tentacles: SmallVec<[bool; 4]>,
}

impl Nonterminal {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of tentacles of every edge labeled with this nonterminal.
    pub fn rank(&self) -> usize {
        self.reduction_tentacles.len()
    }

    /// Reduction tentacles are tentacles that never lead to an outgoing selector of the attached
    /// node.  They are only needed by canonicalization.
    pub fn is_reduction_tentacle(&self, tentacle: usize) -> bool {
        self.reduction_tentacles
            .get(tentacle)
            .copied()
            .unwrap_or(false)
    }

    pub fn reduction_tentacles(&self) -> &[bool] {
        &self.reduction_tentacles
    }
}

/// A concrete index symbol.  Bottom symbols terminate an index.
pub struct ConcreteSymbol {
    name: Box<str>,
    is_bottom: bool,
}

impl ConcreteSymbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bottom(&self) -> bool {
        self.is_bottom
    }
}

/// An abstract index symbol, standing for an unknown but fixed sequence of concrete symbols.
pub struct AbstractSymbol {
    name: Box<str>,
}

impl AbstractSymbol {
    pub fn name(&self) -> &str {
        &self.name
    }
}

//-------------------------------------------------------------------------------------------------
// Context

/// Errors that can occur while interning vocabulary.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ContextError {
    /// The nonterminal was already interned with a different rank.
    #[error("nonterminal `{name}` already has rank {existing}, cannot redeclare it with rank {requested}")]
    NonterminalRankMismatch {
        name: String,
        existing: usize,
        requested: usize,
    },
    /// The reduction tentacle marks do not cover every tentacle.
    #[error("nonterminal `{name}` has rank {rank} but {marks} reduction tentacle marks")]
    ReductionTentacleMismatch {
        name: String,
        rank: usize,
        marks: usize,
    },
}

/// Owns all of the interned vocabulary of an analysis.
#[derive(Default)]
pub struct Context {
    node_types: Arena<NodeType>,
    node_type_handles: FxHashMap<Box<str>, Handle<NodeType>>,
    selector_labels: Arena<SelectorLabel>,
    selector_label_handles: FxHashMap<(Box<str>, Option<Box<str>>), Handle<SelectorLabel>>,
    nonterminals: Arena<Nonterminal>,
    nonterminal_handles: FxHashMap<Box<str>, Handle<Nonterminal>>,
    concrete_symbols: Arena<ConcreteSymbol>,
    concrete_symbol_handles: FxHashMap<(Box<str>, bool), Handle<ConcreteSymbol>>,
    abstract_symbols: Arena<AbstractSymbol>,
    abstract_symbol_handles: FxHashMap<Box<str>, Handle<AbstractSymbol>>,
}

impl Context {
    /// Creates a new, empty context.
    pub fn new() -> Context {
        Context::default()
    }

    /// Adds a node type to the context, returning the existing handle if the type is already
    /// known.
    pub fn add_node_type(&mut self, name: &str) -> Handle<NodeType> {
        if let Some(handle) = self.node_type_handles.get(name) {
            return *handle;
        }
        let handle = self.node_types.add(NodeType { name: name.into() });
        self.node_type_handles.insert(name.into(), handle);
        handle
    }

    pub fn node_type(&self, name: &str) -> Option<Handle<NodeType>> {
        self.node_type_handles.get(name).copied()
    }

    /// Adds a plain selector label to the context.
    pub fn add_selector_label(&mut self, name: &str) -> Handle<SelectorLabel> {
        self.intern_selector_label(name, None)
    }

    /// Adds an annotated selector label to the context.  `left` annotated with `+1` is a
    /// different label than plain `left`, but both have the name `left`.
    pub fn add_annotated_selector_label(
        &mut self,
        name: &str,
        annotation: &str,
    ) -> Handle<SelectorLabel> {
        self.intern_selector_label(name, Some(annotation))
    }

    fn intern_selector_label(
        &mut self,
        name: &str,
        annotation: Option<&str>,
    ) -> Handle<SelectorLabel> {
        let key = (Box::<str>::from(name), annotation.map(Box::<str>::from));
        if let Some(handle) = self.selector_label_handles.get(&key) {
            return *handle;
        }
        let handle = self.selector_labels.add(SelectorLabel {
            name: key.0.clone(),
            annotation: key.1.clone(),
        });
        self.selector_label_handles.insert(key, handle);
        handle
    }

    /// Returns the plain selector label with the given name, if it has been interned.
    pub fn selector_label(&self, name: &str) -> Option<Handle<SelectorLabel>> {
        self.selector_label_handles
            .get(&(Box::<str>::from(name), None))
            .copied()
    }

    /// Adds a nonterminal to the context.  `reduction_tentacles` has one entry per tentacle; the
    /// rank of the nonterminal is its length.
    ///
    /// Nonterminals are identified by name alone.  Re-adding a known name with the same rank
    /// returns the existing handle (and keeps the existing reduction tentacle marks); re-adding it
    /// with a different rank is an error.
    pub fn add_nonterminal(
        &mut self,
        name: &str,
        rank: usize,
        reduction_tentacles: &[bool],
    ) -> Result<Handle<Nonterminal>, ContextError> {
        if let Some(handle) = self.nonterminal_handles.get(name) {
            let existing = self.nonterminals[*handle].rank();
            if existing != rank {
                return Err(ContextError::NonterminalRankMismatch {
                    name: name.to_string(),
                    existing,
                    requested: rank,
                });
            }
            return Ok(*handle);
        }
        let reduction_tentacles = match reduction_tentacles.len() {
            0 => std::iter::repeat(false).take(rank).collect(),
            marks if marks == rank => reduction_tentacles.iter().copied().collect(),
            marks => {
                return Err(ContextError::ReductionTentacleMismatch {
                    name: name.to_string(),
                    rank,
                    marks,
                })
            }
        };
        let handle = self.nonterminals.add(Nonterminal {
            name: name.into(),
            reduction_tentacles,
        });
        self.nonterminal_handles.insert(name.into(), handle);
        Ok(handle)
    }

    pub fn nonterminal(&self, name: &str) -> Option<Handle<Nonterminal>> {
        self.nonterminal_handles.get(name).copied()
    }

    /// Adds a concrete index symbol to the context.
    pub fn add_concrete_symbol(&mut self, name: &str, is_bottom: bool) -> IndexSymbol {
        let key = (Box::<str>::from(name), is_bottom);
        let handle = match self.concrete_symbol_handles.get(&key) {
            Some(handle) => *handle,
            None => {
                let handle = self.concrete_symbols.add(ConcreteSymbol {
                    name: name.into(),
                    is_bottom,
                });
                self.concrete_symbol_handles.insert(key, handle);
                handle
            }
        };
        if is_bottom {
            IndexSymbol::Bottom(handle)
        } else {
            IndexSymbol::Concrete(handle)
        }
    }

    /// Adds an abstract index symbol to the context.  Abstract symbols are interned by name, so
    /// two abstract symbols with the same name are the same symbol.
    pub fn add_abstract_symbol(&mut self, name: &str) -> IndexSymbol {
        IndexSymbol::Abstract(self.intern_abstract_symbol(name))
    }

    fn intern_abstract_symbol(&mut self, name: &str) -> Handle<AbstractSymbol> {
        if let Some(handle) = self.abstract_symbol_handles.get(name) {
            return *handle;
        }
        let handle = self.abstract_symbols.add(AbstractSymbol { name: name.into() });
        self.abstract_symbol_handles.insert(name.into(), handle);
        handle
    }

    pub fn abstract_symbol(&self, name: &str) -> Option<Handle<AbstractSymbol>> {
        self.abstract_symbol_handles.get(name).copied()
    }

    pub fn iter_nonterminals(&self) -> impl Iterator<Item = Handle<Nonterminal>> + '_ {
        self.nonterminals.iter().map(|(handle, _)| handle)
    }
}

impl Index<Handle<NodeType>> for Context {
    type Output = NodeType;
    #[inline(always)]
    fn index(&self, handle: Handle<NodeType>) -> &NodeType {
        &self.node_types[handle]
    }
}

impl Index<Handle<SelectorLabel>> for Context {
    type Output = SelectorLabel;
    #[inline(always)]
    fn index(&self, handle: Handle<SelectorLabel>) -> &SelectorLabel {
        &self.selector_labels[handle]
    }
}

impl Index<Handle<Nonterminal>> for Context {
    type Output = Nonterminal;
    #[inline(always)]
    fn index(&self, handle: Handle<Nonterminal>) -> &Nonterminal {
        &self.nonterminals[handle]
    }
}

impl Index<Handle<ConcreteSymbol>> for Context {
    type Output = ConcreteSymbol;
    #[inline(always)]
    fn index(&self, handle: Handle<ConcreteSymbol>) -> &ConcreteSymbol {
        &self.concrete_symbols[handle]
    }
}

impl Index<Handle<AbstractSymbol>> for Context {
    type Output = AbstractSymbol;
    #[inline(always)]
    fn index(&self, handle: Handle<AbstractSymbol>) -> &AbstractSymbol {
        &self.abstract_symbols[handle]
    }
}

//-------------------------------------------------------------------------------------------------
// Displaying

/// Implemented by values that need a [`Context`][] to render their names.
///
/// [`Context`]: struct.Context.html
pub trait DisplayWithContext {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result;

    /// Returns a `Display` implementation for this value.
    fn display<'a>(&'a self, ctx: &'a Context) -> DisplayWrapper<'a, Self> {
        DisplayWrapper { value: self, ctx }
    }
}

#[doc(hidden)]
pub struct DisplayWrapper<'a, D: ?Sized> {
    value: &'a D,
    ctx: &'a Context,
}

impl<'a, D> Display for DisplayWrapper<'a, D>
where
    D: DisplayWithContext + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.value.display_with(self.ctx, f)
    }
}

impl DisplayWithContext for Handle<NodeType> {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", ctx[*self].name())
    }
}

impl DisplayWithContext for Handle<SelectorLabel> {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = &ctx[*self];
        match label.annotation() {
            Some(annotation) => write!(f, "{}[{}]", label.name(), annotation),
            None => write!(f, "{}", label.name()),
        }
    }
}

impl DisplayWithContext for Handle<Nonterminal> {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", ctx[*self].name())
    }
}
