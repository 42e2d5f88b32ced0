// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Drives materialization until every violation point is resolved.
//!
//! Resolving one violation point can yield several heap configurations, each of which might
//! still contain other violation points, or might have gained new nonterminal edges that hide
//! the selectors we are looking for.  We keep a work list of states that still have to be
//! examined.  Each state is either finished (no violation point is left), replaced by the states
//! that materializing its first violation point produces, or dropped, if no rule can resolve its
//! first violation point.

use crate::arena::Handle;
use crate::context::Context;
use crate::heap::HeapConfiguration;
use crate::heap::Node;
use crate::materialization::GrammarResponseApplier;
use crate::materialization::MaterializationError;
use crate::materialization::MaterializationRuleManager;
use crate::materialization::ViolationPoints;
use crate::CancellationFlag;
use crate::NoCancellation;

/// A program state that carries a heap configuration.  Materialization only ever looks at the
/// heap, and creates new states by swapping in a materialized heap.
pub trait ProgramState: Clone {
    fn heap(&self) -> &HeapConfiguration;
    fn with_heap(&self, heap: HeapConfiguration) -> Self;
}

impl ProgramState for HeapConfiguration {
    fn heap(&self) -> &HeapConfiguration {
        self
    }

    fn with_heap(&self, heap: HeapConfiguration) -> Self {
        heap
    }
}

/// Configures a [`GeneralMaterializationStrategy`][].
///
/// [`GeneralMaterializationStrategy`]: struct.GeneralMaterializationStrategy.html
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MaterializationConfig {
    max_states: Option<usize>,
    max_work_per_phase: usize,
    cache_requests: bool,
}

impl Default for MaterializationConfig {
    fn default() -> Self {
        Self {
            max_states: None,
            max_work_per_phase: 64,
            cache_requests: true,
        }
    }
}

impl MaterializationConfig {
    pub fn max_states(&self) -> Option<usize> {
        self.max_states
    }

    /// Stops materializing once this many finished states have been produced.
    pub fn with_max_states(mut self, max_states: Option<usize>) -> Self {
        self.max_states = max_states;
        self
    }

    pub fn max_work_per_phase(&self) -> usize {
        self.max_work_per_phase
    }

    /// Sets how many work-list items are processed between cancellation checks.
    pub fn with_max_work_per_phase(mut self, max_work_per_phase: usize) -> Self {
        self.max_work_per_phase = max_work_per_phase.max(1);
        self
    }

    pub fn cache_requests(&self) -> bool {
        self.cache_requests
    }

    pub fn with_cache_requests(mut self, cache_requests: bool) -> Self {
        self.cache_requests = cache_requests;
        self
    }
}

/// Materializes a program state until every requested selector is directly visible.
pub struct GeneralMaterializationStrategy<M, A> {
    rule_manager: M,
    applier: A,
    config: MaterializationConfig,
}

impl<M, A> GeneralMaterializationStrategy<M, A>
where
    M: MaterializationRuleManager,
    A: GrammarResponseApplier,
{
    pub fn new(rule_manager: M, applier: A) -> Self {
        Self::with_config(rule_manager, applier, MaterializationConfig::default())
    }

    pub fn with_config(mut rule_manager: M, applier: A, config: MaterializationConfig) -> Self {
        rule_manager.set_cache_requests(config.cache_requests);
        Self {
            rule_manager,
            applier,
            config,
        }
    }

    pub fn config(&self) -> &MaterializationConfig {
        &self.config
    }

    /// Returns the states that result from materializing `state` until none of `points` is a
    /// violation point.  If `state` has no violation point, the result contains only `state`.
    /// States in which some violation point cannot be resolved are dropped, so the result might
    /// be empty.
    pub fn materialize<S>(
        &mut self,
        ctx: &Context,
        state: &S,
        points: &ViolationPoints,
    ) -> Result<Vec<S>, MaterializationError>
    where
        S: ProgramState,
    {
        self.materialize_with_cancellation(ctx, state, points, &NoCancellation)
    }

    pub fn materialize_with_cancellation<S>(
        &mut self,
        ctx: &Context,
        state: &S,
        points: &ViolationPoints,
        cancellation_flag: &dyn CancellationFlag,
    ) -> Result<Vec<S>, MaterializationError>
    where
        S: ProgramState,
    {
        let mut finished = Vec::new();
        let mut work_list = vec![state.clone()];
        let mut work_performed = 0;
        while let Some(current) = work_list.pop() {
            if work_performed >= self.config.max_work_per_phase {
                cancellation_flag.check("materializing violation points")?;
                work_performed = 0;
            }
            work_performed += 1;

            let (node, selector) = match get_actual_violation_point(ctx, current.heap(), points) {
                Some(violation_point) => violation_point,
                None => {
                    finished.push(current);
                    if self.config.max_states.map_or(false, |max| finished.len() >= max) {
                        log::warn!(
                            "Stopping materialization after {} states, {} still pending",
                            finished.len(),
                            work_list.len()
                        );
                        break;
                    }
                    continue;
                }
            };
            log::trace!(
                "Materializing selector {} ({} states pending)",
                selector,
                work_list.len()
            );

            let successors = self.resolve_violation_point(ctx, current.heap(), node, selector)?;
            if successors.is_empty() {
                log::debug!("No rule creates selector {}, dropping state", selector);
                continue;
            }
            // Reversed, so that successors are examined in rule order.
            for heap in successors.into_iter().rev() {
                work_list.push(current.with_heap(heap));
            }
        }
        Ok(finished)
    }

    /// Materializes the first nonterminal edge attached to `node` for which the grammar has
    /// rules that create `selector` at `node`.
    fn resolve_violation_point(
        &mut self,
        ctx: &Context,
        heap: &HeapConfiguration,
        node: Handle<Node>,
        selector: &str,
    ) -> Result<Vec<HeapConfiguration>, MaterializationError> {
        let edges = heap.attached_nonterminal_edges_of(node).collect::<Vec<_>>();
        for edge in edges {
            let label = match heap.label_of(edge) {
                Some(label) => label,
                None => continue,
            };
            let tentacle = match heap.attached_nodes_of(edge).iter().position(|n| *n == node) {
                Some(tentacle) => tentacle,
                None => continue,
            };
            let response = self
                .rule_manager
                .get_rules_for(ctx, label, tentacle, selector)?;
            if response.is_empty() {
                continue;
            }
            copious_debugging!(
                "Applying {} response to edge {} at tentacle {}",
                response.kind(),
                edge.as_u32(),
                tentacle
            );
            let result = self
                .applier
                .apply_grammar_response_to(ctx, heap, edge, response)?;
            if !result.is_empty() {
                return Ok(result);
            }
        }
        Ok(Vec::new())
    }
}

/// Returns the target node and selector of the first violation point in `points`: a variable
/// whose target does not have an outgoing selector with that name.  Variables that do not exist
/// in `heap` are skipped.
pub fn get_actual_violation_point<'p>(
    ctx: &Context,
    heap: &HeapConfiguration,
    points: &'p ViolationPoints,
) -> Option<(Handle<Node>, &'p str)> {
    for (variable, selector) in points.iter() {
        let target = match heap.variable_target_of(variable) {
            Some(target) => target,
            None => {
                log::debug!("Ignoring violation point at unknown variable {}", variable);
                continue;
            }
        };
        if !heap.has_selector_named(ctx, target, selector) {
            return Some((target, selector));
        }
    }
    None
}
