// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Hyperedge replacement on copies of heap configurations.

use crate::arena::Handle;
use crate::context::Context;
use crate::heap::HeapConfiguration;
use crate::heap::HeapConfigurationError;
use crate::heap::NonterminalEdge;

/// Returns a copy of `heap` in which `edge` has been replaced by `rule`.  Neither `heap` nor
/// `rule` is modified.  Handles of `heap` stay valid in the result, except for `edge` itself.
pub fn get_materialized_clone_with(
    ctx: &Context,
    heap: &HeapConfiguration,
    edge: Handle<NonterminalEdge>,
    rule: &HeapConfiguration,
) -> Result<HeapConfiguration, HeapConfigurationError> {
    let mut result = heap.clone();
    result
        .builder(ctx)
        .replace_nonterminal_edge(edge, rule)?
        .build()?;
    Ok(result)
}
