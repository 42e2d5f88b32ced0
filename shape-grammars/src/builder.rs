// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! The only way to modify a heap configuration.
//!
//! Every builder operation validates its arguments against the current state of the graph before
//! it changes anything.  If an operation returns an error, the heap configuration is exactly as it
//! was before the call.  Operations return `&mut Self` so that they can be chained:
//!
//! ```
//! # use shape_grammars::context::Context;
//! # use shape_grammars::heap::HeapConfiguration;
//! # fn main() -> Result<(), shape_grammars::heap::HeapConfigurationError> {
//! let mut ctx = Context::new();
//! let list = ctx.add_node_type("List");
//! let next = ctx.add_selector_label("next");
//!
//! let mut heap = HeapConfiguration::new();
//! let mut nodes = Vec::new();
//! heap.builder(&ctx)
//!     .add_nodes(list, 2, &mut nodes)
//!     .add_selector(nodes[0], next, nodes[1])?
//!     .set_external(nodes[0])?
//!     .set_external(nodes[1])?
//!     .build()?;
//! assert_eq!(heap.count_nodes(), 2);
//! # Ok(())
//! # }
//! ```

use fxhash::FxHashMap;
use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::arena::Handle;
use crate::context::Context;
use crate::context::NodeType;
use crate::context::SelectorLabel;
use crate::heap::HeapConfiguration;
use crate::heap::HeapConfigurationError;
use crate::heap::Node;
use crate::heap::NonterminalEdge;
use crate::heap::SelectorEdge;
use crate::heap::VariableEdge;
use crate::index::NonterminalLabel;

/// Modifies a heap configuration.  Created by [`HeapConfiguration::builder`][].
///
/// [`HeapConfiguration::builder`]: ../heap/struct.HeapConfiguration.html#method.builder
pub struct HeapConfigurationBuilder<'a> {
    heap: &'a mut HeapConfiguration,
    ctx: &'a Context,
}

impl<'a> HeapConfigurationBuilder<'a> {
    pub(crate) fn new(heap: &'a mut HeapConfiguration, ctx: &'a Context) -> Self {
        HeapConfigurationBuilder { heap, ctx }
    }

    /// Finishes building.  Verifies the structural invariants of the whole configuration, which
    /// every individual operation already maintains.
    pub fn build(&mut self) -> Result<(), HeapConfigurationError> {
        for (_, edge) in self.heap.nonterminal_edges.iter() {
            let expected = edge.label.rank(self.ctx);
            if edge.tentacles.len() != expected {
                return Err(HeapConfigurationError::RankMismatch {
                    expected,
                    actual: edge.tentacles.len(),
                });
            }
            for tentacle in &edge.tentacles {
                self.check_node(*tentacle)?;
            }
        }
        for (_, node) in self.heap.nodes.iter() {
            for edge in &node.selectors {
                self.check_node(edge.target)?;
            }
        }
        for (_, variable) in self.heap.variables.iter() {
            self.check_node(variable.target)?;
        }
        for external in &self.heap.externals {
            self.check_node(*external)?;
        }
        Ok(())
    }

    //---------------------------------------------------------------------------------------------
    // Validation

    fn check_node(&self, node: Handle<Node>) -> Result<(), HeapConfigurationError> {
        if self.heap.nodes.contains(node) {
            Ok(())
        } else {
            Err(HeapConfigurationError::NodeNotFound(node.as_u32()))
        }
    }

    fn check_nonterminal_edge(
        &self,
        edge: Handle<NonterminalEdge>,
    ) -> Result<&NonterminalEdge, HeapConfigurationError> {
        self.heap
            .nonterminal_edges
            .get(edge)
            .ok_or(HeapConfigurationError::NonterminalEdgeNotFound(edge.as_u32()))
    }

    fn check_tentacles(
        &self,
        label: &NonterminalLabel,
        tentacles: &[Handle<Node>],
    ) -> Result<(), HeapConfigurationError> {
        let expected = label.rank(self.ctx);
        if tentacles.len() != expected {
            return Err(HeapConfigurationError::RankMismatch {
                expected,
                actual: tentacles.len(),
            });
        }
        for tentacle in tentacles {
            self.check_node(*tentacle)?;
        }
        Ok(())
    }

    fn is_isolated(&self, node: Handle<Node>) -> bool {
        let has_outgoing = self
            .heap
            .nodes
            .get(node)
            .map_or(false, |node| !node.selectors.is_empty());
        !has_outgoing
            && self.heap.predecessor_nodes_of(node).is_empty()
            && self.heap.attached_variables_of(node).next().is_none()
            && self.heap.attached_nonterminal_edges_of(node).next().is_none()
    }

    //---------------------------------------------------------------------------------------------
    // Nodes

    /// Adds `count` fresh nodes of the given type, appending their handles (in creation order) to
    /// `out`.
    pub fn add_nodes(
        &mut self,
        node_type: Handle<NodeType>,
        count: usize,
        out: &mut Vec<Handle<Node>>,
    ) -> &mut Self {
        for _ in 0..count {
            out.push(self.heap.nodes.add(Node {
                node_type,
                selectors: SmallVec::new(),
            }));
        }
        self
    }

    /// Removes a node that has no incident selector, variable, or nonterminal edge, and that is
    /// not external.
    pub fn remove_isolated_node(
        &mut self,
        node: Handle<Node>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        self.check_node(node)?;
        if self.heap.is_external_node(node) {
            return Err(HeapConfigurationError::ExternalNode(node.as_u32()));
        }
        if !self.is_isolated(node) {
            return Err(HeapConfigurationError::NodeNotIsolated(node.as_u32()));
        }
        self.heap.nodes.remove(node);
        Ok(self)
    }

    /// Removes a node together with every selector, variable, and nonterminal edge incident to
    /// it.  External nodes must be unset first.
    pub fn remove_node(&mut self, node: Handle<Node>) -> Result<&mut Self, HeapConfigurationError> {
        self.check_node(node)?;
        if self.heap.is_external_node(node) {
            return Err(HeapConfigurationError::ExternalNode(node.as_u32()));
        }
        let variables = self.heap.attached_variables_of(node).collect::<Vec<_>>();
        for variable in variables {
            self.heap.variables.remove(variable);
        }
        let edges = self
            .heap
            .attached_nonterminal_edges_of(node)
            .collect::<Vec<_>>();
        for edge in edges {
            self.heap.nonterminal_edges.remove(edge);
        }
        let handles = self.heap.nodes.iter_handles().collect::<Vec<_>>();
        for handle in handles {
            if let Some(source) = self.heap.nodes.get_mut(handle) {
                source.selectors.retain(|edge| edge.target != node);
            }
        }
        self.heap.nodes.remove(node);
        Ok(self)
    }

    /// Changes the type of a node.
    pub fn replace_node_type(
        &mut self,
        node: Handle<Node>,
        node_type: Handle<NodeType>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        match self.heap.nodes.get_mut(node) {
            Some(node) => node.node_type = node_type,
            None => return Err(HeapConfigurationError::NodeNotFound(node.as_u32())),
        }
        Ok(self)
    }

    //---------------------------------------------------------------------------------------------
    // Selectors

    /// Adds a selector edge.  A node can have at most one outgoing selector with each label.
    pub fn add_selector(
        &mut self,
        from: Handle<Node>,
        label: Handle<SelectorLabel>,
        to: Handle<Node>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        self.check_node(to)?;
        let source = self
            .heap
            .nodes
            .get_mut(from)
            .ok_or(HeapConfigurationError::NodeNotFound(from.as_u32()))?;
        match source
            .selectors
            .binary_search_by_key(&label, |edge| edge.label)
        {
            Ok(_) => Err(HeapConfigurationError::DuplicateSelector {
                node: from.as_u32(),
                label: label.as_u32(),
            }),
            Err(position) => {
                source
                    .selectors
                    .insert(position, SelectorEdge { label, target: to });
                Ok(self)
            }
        }
    }

    /// Removes the outgoing selector of `from` with the given label.
    pub fn remove_selector(
        &mut self,
        from: Handle<Node>,
        label: Handle<SelectorLabel>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        let source = self
            .heap
            .nodes
            .get_mut(from)
            .ok_or(HeapConfigurationError::NodeNotFound(from.as_u32()))?;
        let position = source
            .selectors
            .binary_search_by_key(&label, |edge| edge.label)
            .map_err(|_| HeapConfigurationError::SelectorNotFound {
                node: from.as_u32(),
                label: label.as_u32(),
            })?;
        source.selectors.remove(position);
        Ok(self)
    }

    /// Relabels an outgoing selector of `from`, keeping its target.
    pub fn replace_selector(
        &mut self,
        from: Handle<Node>,
        old_label: Handle<SelectorLabel>,
        new_label: Handle<SelectorLabel>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        let target = self
            .heap
            .selector_target_of(from, old_label)
            .ok_or(HeapConfigurationError::SelectorNotFound {
                node: from.as_u32(),
                label: old_label.as_u32(),
            })?;
        if old_label == new_label {
            return Ok(self);
        }
        if self.heap.selector_target_of(from, new_label).is_some() {
            return Err(HeapConfigurationError::DuplicateSelector {
                node: from.as_u32(),
                label: new_label.as_u32(),
            });
        }
        self.remove_selector(from, old_label)?;
        self.add_selector(from, new_label, target)
    }

    //---------------------------------------------------------------------------------------------
    // External nodes

    /// Appends a node to the list of external nodes.
    pub fn set_external(
        &mut self,
        node: Handle<Node>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        self.check_node(node)?;
        if self.heap.is_external_node(node) {
            return Err(HeapConfigurationError::AlreadyExternal(node.as_u32()));
        }
        self.heap.externals.push(node);
        Ok(self)
    }

    /// Removes a node from the list of external nodes.  The external nodes after it move up one
    /// position.
    pub fn unset_external(
        &mut self,
        node: Handle<Node>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        self.check_node(node)?;
        let position = self
            .heap
            .external_index_of(node)
            .ok_or(HeapConfigurationError::NotExternal(node.as_u32()))?;
        self.heap.externals.remove(position);
        Ok(self)
    }

    //---------------------------------------------------------------------------------------------
    // Variables

    /// Adds a variable edge.  Variable names are unique.
    pub fn add_variable_edge(
        &mut self,
        name: &str,
        target: Handle<Node>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        self.check_node(target)?;
        if self.heap.variable_with(name).is_some() {
            return Err(HeapConfigurationError::DuplicateVariable(name.to_string()));
        }
        self.heap.variables.add(VariableEdge {
            name: name.into(),
            target,
        });
        Ok(self)
    }

    pub fn remove_variable_edge(
        &mut self,
        variable: Handle<VariableEdge>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        self.heap
            .variables
            .remove(variable)
            .ok_or(HeapConfigurationError::VariableNotFound(variable.as_u32()))?;
        Ok(self)
    }

    //---------------------------------------------------------------------------------------------
    // Nonterminal edges

    /// Adds a nonterminal edge attached to the given nodes, in order.
    pub fn add_nonterminal_edge<L>(
        &mut self,
        label: L,
        tentacles: &[Handle<Node>],
    ) -> Result<&mut Self, HeapConfigurationError>
    where
        L: Into<NonterminalLabel>,
    {
        self.add_nonterminal_edge_and_return_id(label, tentacles)?;
        Ok(self)
    }

    /// Adds a nonterminal edge attached to the given nodes, returning its handle.
    pub fn add_nonterminal_edge_and_return_id<L>(
        &mut self,
        label: L,
        tentacles: &[Handle<Node>],
    ) -> Result<Handle<NonterminalEdge>, HeapConfigurationError>
    where
        L: Into<NonterminalLabel>,
    {
        let label = label.into();
        self.check_tentacles(&label, tentacles)?;
        Ok(self.heap.nonterminal_edges.add(NonterminalEdge {
            label,
            tentacles: tentacles.iter().copied().collect(),
        }))
    }

    pub fn remove_nonterminal_edge(
        &mut self,
        edge: Handle<NonterminalEdge>,
    ) -> Result<&mut Self, HeapConfigurationError> {
        self.heap
            .nonterminal_edges
            .remove(edge)
            .ok_or(HeapConfigurationError::NonterminalEdgeNotFound(edge.as_u32()))?;
        Ok(self)
    }

    /// Relabels a nonterminal edge, keeping its handle and tentacles.  The new label must have
    /// the same rank.
    pub fn replace_nonterminal<L>(
        &mut self,
        edge: Handle<NonterminalEdge>,
        label: L,
    ) -> Result<&mut Self, HeapConfigurationError>
    where
        L: Into<NonterminalLabel>,
    {
        let label = label.into();
        let actual = self.check_nonterminal_edge(edge)?.tentacles.len();
        let expected = label.rank(self.ctx);
        if expected != actual {
            return Err(HeapConfigurationError::RankMismatch { expected, actual });
        }
        if let Some(edge) = self.heap.nonterminal_edges.get_mut(edge) {
            edge.label = label;
        }
        Ok(self)
    }

    /// Replaces a nonterminal edge by a copy of `rule`, performing hyperedge replacement in
    /// place.
    ///
    /// The external nodes of `rule` are identified, in order, with the tentacles of `edge`; every
    /// other node of `rule` becomes a fresh node of the same type.  All selector, nonterminal,
    /// and variable edges of `rule` are copied over under that identification, and `edge` itself
    /// is removed.  `rule` must have as many external nodes as `edge` has tentacles.
    pub fn replace_nonterminal_edge(
        &mut self,
        edge: Handle<NonterminalEdge>,
        rule: &HeapConfiguration,
    ) -> Result<&mut Self, HeapConfigurationError> {
        let tentacles = self.check_nonterminal_edge(edge)?.tentacles.clone();
        if rule.count_external_nodes() != tentacles.len() {
            return Err(HeapConfigurationError::ExternalCountMismatch {
                expected: tentacles.len(),
                actual: rule.count_external_nodes(),
            });
        }
        copious_debugging!(
            "Replacing nonterminal edge {} ({} rule nodes)",
            edge.as_u32(),
            rule.count_nodes()
        );

        // Rule externals alias existing tentacle nodes.  If two externals alias the same node, or
        // an external aliases a node that already has the selector, the copy would create a
        // duplicate selector.
        let aliases = rule
            .external_nodes()
            .iter()
            .copied()
            .zip(tentacles.iter().copied())
            .collect::<FxHashMap<_, _>>();
        let mut aliased_selectors = FxHashSet::default();
        for (rule_node, host_node) in rule.external_nodes().iter().zip(tentacles.iter()) {
            for selector in rule.selector_edges_of(*rule_node) {
                let existing = self.heap.selector_target_of(*host_node, selector.label);
                if existing.is_some() || !aliased_selectors.insert((*host_node, selector.label)) {
                    return Err(HeapConfigurationError::DuplicateSelector {
                        node: host_node.as_u32(),
                        label: selector.label.as_u32(),
                    });
                }
            }
        }
        let mut rule_variable_names = FxHashSet::default();
        for variable in rule.variable_edges() {
            let name = rule.name_of(variable).unwrap_or_default();
            if self.heap.variable_with(name).is_some() || !rule_variable_names.insert(name) {
                return Err(HeapConfigurationError::DuplicateVariable(name.to_string()));
            }
        }

        self.heap.nonterminal_edges.remove(edge);
        let mut mapping = aliases;
        for (rule_node, node) in rule.nodes.iter() {
            if !mapping.contains_key(&rule_node) {
                let fresh = self.heap.nodes.add(Node {
                    node_type: node.node_type,
                    selectors: SmallVec::new(),
                });
                mapping.insert(rule_node, fresh);
            }
        }
        for (rule_node, node) in rule.nodes.iter() {
            let source = mapping[&rule_node];
            for selector in &node.selectors {
                self.add_selector(source, selector.label, mapping[&selector.target])?;
            }
        }
        for (_, rule_edge) in rule.nonterminal_edges.iter() {
            self.heap.nonterminal_edges.add(NonterminalEdge {
                label: rule_edge.label.clone(),
                tentacles: rule_edge
                    .tentacles
                    .iter()
                    .map(|tentacle| mapping[tentacle])
                    .collect(),
            });
        }
        for (_, variable) in rule.variables.iter() {
            self.heap.variables.add(VariableEdge {
                name: variable.name.clone(),
                target: mapping[&variable.target],
            });
        }
        Ok(self)
    }

    //---------------------------------------------------------------------------------------------
    // Merging external nodes

    /// Collapses groups of external nodes.  `mapping[i]` is the new external position of the node
    /// that is currently external at position `i`; every position from 0 up to the largest value
    /// in `mapping` must be used.  All old external nodes that map to the same new position are
    /// merged into the first of them: their selectors (in both directions), tentacles, and
    /// variables are moved over, and the other nodes are removed.
    pub fn merge_externals(
        &mut self,
        mapping: &[usize],
    ) -> Result<&mut Self, HeapConfigurationError> {
        let old_externals = self.heap.externals.clone();
        if mapping.len() != old_externals.len() {
            return Err(HeapConfigurationError::ExternalCountMismatch {
                expected: old_externals.len(),
                actual: mapping.len(),
            });
        }
        let count_new = match mapping.iter().max() {
            Some(max) => max + 1,
            None => return Ok(self),
        };
        let mut representatives = vec![None; count_new];
        let mut merged_into = FxHashMap::default();
        for (old_position, new_position) in mapping.iter().enumerate() {
            let old_node = old_externals[old_position];
            match representatives[*new_position] {
                None => representatives[*new_position] = Some(old_node),
                Some(representative) => {
                    merged_into.insert(old_node, representative);
                }
            }
        }
        let mut new_externals = Vec::with_capacity(count_new);
        for (position, representative) in representatives.into_iter().enumerate() {
            match representative {
                Some(representative) => new_externals.push(representative),
                None => {
                    return Err(HeapConfigurationError::InvalidExternalMapping(format!(
                        "no external node is mapped to position {}",
                        position
                    )))
                }
            }
        }
        let mut merged_labels = FxHashSet::default();
        for (old_position, old_node) in old_externals.iter().enumerate() {
            let target = new_externals[mapping[old_position]];
            for label in self.heap.selector_labels_of(*old_node) {
                if !merged_labels.insert((target, label)) {
                    return Err(HeapConfigurationError::DuplicateSelector {
                        node: target.as_u32(),
                        label: label.as_u32(),
                    });
                }
            }
        }

        let rename = |node: Handle<Node>| merged_into.get(&node).copied().unwrap_or(node);
        for (old_node, representative) in &merged_into {
            let moved = self
                .heap
                .nodes
                .get_mut(*old_node)
                .map(|node| std::mem::take(&mut node.selectors))
                .unwrap_or_default();
            if let Some(representative) = self.heap.nodes.get_mut(*representative) {
                representative.selectors.extend(moved);
                representative.selectors.sort_by_key(|edge| edge.label);
            }
        }
        let handles = self.heap.nodes.iter_handles().collect::<Vec<_>>();
        for handle in handles {
            if let Some(node) = self.heap.nodes.get_mut(handle) {
                for edge in node.selectors.iter_mut() {
                    edge.target = rename(edge.target);
                }
            }
        }
        let edges = self.heap.nonterminal_edges.iter_handles().collect::<Vec<_>>();
        for edge in edges {
            if let Some(edge) = self.heap.nonterminal_edges.get_mut(edge) {
                for tentacle in edge.tentacles.iter_mut() {
                    *tentacle = rename(*tentacle);
                }
            }
        }
        let variables = self.heap.variables.iter_handles().collect::<Vec<_>>();
        for variable in variables {
            if let Some(variable) = self.heap.variables.get_mut(variable) {
                variable.target = rename(variable.target);
            }
        }
        for old_node in merged_into.keys() {
            self.heap.nodes.remove(*old_node);
        }
        self.heap.externals = new_externals;
        Ok(self)
    }
}
