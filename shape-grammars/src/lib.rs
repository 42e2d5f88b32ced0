// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Shape grammars describe the possible shapes of a program's heap using _hyperedge replacement
//! grammars_.  A heap is represented as a [_heap configuration_][heap]: a hypergraph whose nodes
//! are heap objects, whose _selector edges_ are the fields that point from one object to
//! another, and whose _variable edges_ are the program variables that point into the heap.  In
//! addition, a heap configuration can contain _nonterminal edges_: hyperedges that connect an
//! ordered tuple of nodes (the edge's _tentacles_) and that stand for some unknown subgraph that
//! can be derived from the nonterminal using a [grammar][].
//!
//! [heap]: heap/index.html
//! [grammar]: grammar/index.html
//!
//! An abstract heap therefore describes a whole set of concrete heaps at once.  A shape analysis
//! works on abstract heaps, but has to look at concrete structure whenever the program accesses
//! a field.  If a program dereferences `x.next`, but the node that `x` points to only has a
//! nonterminal edge attached to it, we have to _materialize_ that edge: replace it by each of
//! the right-hand sides of its nonterminal that create a `next` selector at the right tentacle.
//! The result is a list of heap configurations, which together describe the same set of concrete
//! heaps as the input, and in each of which `x.next` is directly visible.  The
//! [`materialization`][materialization] module implements this.
//!
//! [materialization]: materialization/index.html
//!
//! ## Indexed grammars
//!
//! Plain hyperedge replacement grammars cannot describe structures that have to be balanced,
//! such as balanced binary trees.  _Indexed_ nonterminals additionally carry an [index][]: a
//! stack of symbols that records, symbolically, how deep the remaining structure is.  An index
//! can end in an _abstract_ symbol, which stands for some unknown concrete continuation, or in
//! the _index variable_, which appears in grammar rules and is bound to whatever continuation
//! the edge being replaced has.  Materializing an indexed edge might require unrolling an
//! abstract symbol first, which is done consistently for every edge in the heap that shares that
//! symbol.
//!
//! [index]: index/index.html
//!
//! ## Interning
//!
//! Node types, selector labels, nonterminals, and index symbols are interned in a [`Context`][],
//! which hands out small, copyable [handles][] to them.  Every other data structure refers to
//! these handles, and every algorithm takes the context by shared reference.
//!
//! [`Context`]: context/struct.Context.html
//! [handles]: arena/struct.Handle.html

use std::time::{Duration, Instant};

use thiserror::Error;

#[macro_use]
mod debugging;
pub mod arena;
pub mod builder;
pub mod canonical;
pub mod context;
pub mod export;
pub mod grammar;
pub mod heap;
pub mod index;
pub mod materialization;
#[cfg(feature = "serde")]
pub mod serde;

/// Trait to signal that the execution is cancelled
pub trait CancellationFlag {
    fn check(&self, at: &'static str) -> Result<(), CancellationError>;
}

pub struct NoCancellation;
impl CancellationFlag for NoCancellation {
    fn check(&self, _at: &'static str) -> Result<(), CancellationError> {
        Ok(())
    }
}

pub struct CancelAfterDuration {
    limit: Duration,
    start: Instant,
}

impl CancelAfterDuration {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            start: Instant::now(),
        }
    }
}

impl CancellationFlag for CancelAfterDuration {
    fn check(&self, at: &'static str) -> Result<(), CancellationError> {
        if self.start.elapsed() > self.limit {
            return Err(CancellationError(at));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("Cancelled at \"{0}\"")]
pub struct CancellationError(pub &'static str);
