// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Defines the structure of a heap configuration.
//!
//! A heap configuration is a typed hypergraph that represents one possible shape of a program's
//! heap.  It consists of:
//!
//!   - **_Nodes_**, each of which has a [`NodeType`][].  A node stands for one heap object.
//!
//!   - **_Selector edges_**, which are labeled, directed binary edges between nodes.  A node has
//!     at most one outgoing selector edge with any given [`SelectorLabel`][].
//!
//!   - **_Nonterminal edges_**, which are hyperedges labeled with a [`NonterminalLabel`][].  A
//!     nonterminal edge is attached to an ordered tuple of nodes (its _tentacles_), whose length is
//!     the rank of its nonterminal.  It stands for an as-yet-unexpanded subgraph, described by the
//!     rules of a [`Grammar`][].
//!
//!   - **_Variable edges_**, which are named pointers into the graph.  Names are unique.
//!
//!   - An ordered list of **_external nodes_**.  In the right-hand side of a grammar rule, the
//!     external nodes are identified, in order, with the tentacles of the edge being replaced.
//!
//! All of these live in [arenas][], and you refer to them via [`Handle`][]s.  Handles survive
//! cloning, so a handle to an edge of one configuration also refers to the corresponding edge of
//! any clone of it.
//!
//! The only way to change a heap configuration is via its [`builder`][], which validates every
//! operation before it touches the graph.
//!
//! Heap configurations compare (and hash) up to isomorphism: two configurations with the same
//! structure but different handle numbering are equal.  See the [`canonical`][] module.
//!
//! [`NodeType`]: ../context/struct.NodeType.html
//! [`SelectorLabel`]: ../context/struct.SelectorLabel.html
//! [`NonterminalLabel`]: ../index/enum.NonterminalLabel.html
//! [`Grammar`]: ../grammar/struct.Grammar.html
//! [arenas]: ../arena/index.html
//! [`Handle`]: ../arena/struct.Handle.html
//! [`builder`]: struct.HeapConfiguration.html#method.builder
//! [`canonical`]: ../canonical/index.html

use itertools::Itertools;
use smallvec::SmallVec;
use thiserror::Error;

use crate::arena::Arena;
use crate::arena::Handle;
use crate::builder::HeapConfigurationBuilder;
use crate::context::Context;
use crate::context::DisplayWithContext;
use crate::context::NodeType;
use crate::context::SelectorLabel;
use crate::index::NonterminalLabel;

//-------------------------------------------------------------------------------------------------
// Errors

/// Reasons why a builder refused an operation.  The heap configuration is never modified when an
/// operation fails.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HeapConfigurationError {
    #[error("node {0} does not exist")]
    NodeNotFound(u32),
    #[error("nonterminal edge {0} does not exist")]
    NonterminalEdgeNotFound(u32),
    #[error("variable edge {0} does not exist")]
    VariableNotFound(u32),
    #[error("node {node} has no outgoing selector with label {label}")]
    SelectorNotFound { node: u32, label: u32 },
    #[error("node {node} already has an outgoing selector with label {label}")]
    DuplicateSelector { node: u32, label: u32 },
    #[error("a variable named `{0}` already exists")]
    DuplicateVariable(String),
    #[error("expected {expected} tentacles but got {actual}")]
    RankMismatch { expected: usize, actual: usize },
    #[error("node {0} is not isolated")]
    NodeNotIsolated(u32),
    #[error("node {0} is already external")]
    AlreadyExternal(u32),
    #[error("node {0} is not external")]
    NotExternal(u32),
    #[error("node {0} is external and cannot be removed")]
    ExternalNode(u32),
    #[error("expected {expected} external nodes but got {actual}")]
    ExternalCountMismatch { expected: usize, actual: usize },
    #[error("invalid external node mapping: {0}")]
    InvalidExternalMapping(String),
}

//-------------------------------------------------------------------------------------------------
// Graph elements

/// A node of a heap configuration.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) node_type: Handle<NodeType>,
    // Sorted by label, so that we can binary search.
    pub(crate) selectors: SmallVec<[SelectorEdge; 4]>,
}

impl Node {
    pub fn node_type(&self) -> Handle<NodeType> {
        self.node_type
    }

    pub fn selectors(&self) -> &[SelectorEdge] {
        &self.selectors
    }

    pub(crate) fn selector(&self, label: Handle<SelectorLabel>) -> Option<Handle<Node>> {
        self.selectors
            .binary_search_by_key(&label, |edge| edge.label)
            .ok()
            .map(|position| self.selectors[position].target)
    }
}

/// An outgoing selector edge of a node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SelectorEdge {
    pub label: Handle<SelectorLabel>,
    pub target: Handle<Node>,
}

/// A nonterminal hyperedge.
#[derive(Clone, Debug)]
pub struct NonterminalEdge {
    pub(crate) label: NonterminalLabel,
    pub(crate) tentacles: SmallVec<[Handle<Node>; 4]>,
}

impl NonterminalEdge {
    pub fn label(&self) -> &NonterminalLabel {
        &self.label
    }

    pub fn tentacles(&self) -> &[Handle<Node>] {
        &self.tentacles
    }
}

/// A named pointer into the graph.
#[derive(Clone, Debug)]
pub struct VariableEdge {
    pub(crate) name: Box<str>,
    pub(crate) target: Handle<Node>,
}

impl VariableEdge {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Handle<Node> {
        self.target
    }
}

//-------------------------------------------------------------------------------------------------
// Heap configurations

/// A typed hypergraph representing one possible shape of a program's heap.
#[derive(Clone, Default)]
pub struct HeapConfiguration {
    pub(crate) nodes: Arena<Node>,
    pub(crate) nonterminal_edges: Arena<NonterminalEdge>,
    pub(crate) variables: Arena<VariableEdge>,
    pub(crate) externals: Vec<Handle<Node>>,
}

impl HeapConfiguration {
    /// Creates a new, empty heap configuration.
    pub fn new() -> HeapConfiguration {
        HeapConfiguration::default()
    }

    /// Returns a builder that can modify this heap configuration.  The builder borrows the
    /// configuration mutably, so there can only ever be one of them at a time.
    pub fn builder<'a>(&'a mut self, ctx: &'a Context) -> HeapConfigurationBuilder<'a> {
        HeapConfigurationBuilder::new(self, ctx)
    }

    // Nodes

    pub fn count_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the handles of all nodes, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = Handle<Node>> {
        self.nodes.iter_handles()
    }

    pub fn contains_node(&self, node: Handle<Node>) -> bool {
        self.nodes.contains(node)
    }

    pub fn node(&self, node: Handle<Node>) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn node_type_of(&self, node: Handle<Node>) -> Option<Handle<NodeType>> {
        self.nodes.get(node).map(|node| node.node_type)
    }

    /// Returns the variable edges that point at a node.
    pub fn attached_variables_of(
        &self,
        node: Handle<Node>,
    ) -> impl Iterator<Item = Handle<VariableEdge>> + '_ {
        self.variables
            .iter()
            .filter(move |(_, variable)| variable.target == node)
            .map(|(handle, _)| handle)
    }

    /// Returns the nonterminal edges that have at least one tentacle attached to a node.
    pub fn attached_nonterminal_edges_of(
        &self,
        node: Handle<Node>,
    ) -> impl Iterator<Item = Handle<NonterminalEdge>> + '_ {
        self.nonterminal_edges
            .iter()
            .filter(move |(_, edge)| edge.tentacles.contains(&node))
            .map(|(handle, _)| handle)
    }

    /// Returns the nonterminal edges that are attached to a node via at least one tentacle that
    /// is not a reduction tentacle.
    pub fn attached_nonterminal_edges_with_non_reduction_tentacle<'a>(
        &'a self,
        ctx: &'a Context,
        node: Handle<Node>,
    ) -> impl Iterator<Item = Handle<NonterminalEdge>> + 'a {
        self.nonterminal_edges
            .iter()
            .filter(move |(_, edge)| {
                let nonterminal = &ctx[edge.label.nonterminal()];
                edge.tentacles
                    .iter()
                    .enumerate()
                    .any(|(tentacle, attached)| {
                        *attached == node && !nonterminal.is_reduction_tentacle(tentacle)
                    })
            })
            .map(|(handle, _)| handle)
    }

    /// Returns the distinct targets of a node's outgoing selectors.
    pub fn successor_nodes_of(&self, node: Handle<Node>) -> Vec<Handle<Node>> {
        self.selector_edges_of(node)
            .iter()
            .map(|edge| edge.target)
            .unique()
            .collect()
    }

    /// Returns the distinct sources of selectors pointing at a node.
    pub fn predecessor_nodes_of(&self, node: Handle<Node>) -> Vec<Handle<Node>> {
        self.nodes
            .iter()
            .filter(|(_, source)| source.selectors.iter().any(|edge| edge.target == node))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Returns a node's outgoing selector edges, sorted by label.
    pub fn selector_edges_of(&self, node: Handle<Node>) -> &[SelectorEdge] {
        self.nodes
            .get(node)
            .map(|node| node.selectors.as_slice())
            .unwrap_or(&[])
    }

    pub fn selector_labels_of(
        &self,
        node: Handle<Node>,
    ) -> impl Iterator<Item = Handle<SelectorLabel>> + '_ {
        self.selector_edges_of(node).iter().map(|edge| edge.label)
    }

    pub fn selector_target_of(
        &self,
        node: Handle<Node>,
        label: Handle<SelectorLabel>,
    ) -> Option<Handle<Node>> {
        self.nodes.get(node).and_then(|node| node.selector(label))
    }

    /// Returns the target of the outgoing selector of `node` whose label has the given base name,
    /// ignoring annotations.
    pub fn selector_target_named(
        &self,
        ctx: &Context,
        node: Handle<Node>,
        name: &str,
    ) -> Option<Handle<Node>> {
        self.selector_edges_of(node)
            .iter()
            .find(|edge| ctx[edge.label].has_name(name))
            .map(|edge| edge.target)
    }

    /// Returns whether a node has an outgoing selector whose label has the given base name.
    pub fn has_selector_named(&self, ctx: &Context, node: Handle<Node>, name: &str) -> bool {
        self.selector_target_named(ctx, node, name).is_some()
    }

    pub fn count_selector_edges(&self) -> usize {
        self.nodes.iter().map(|(_, node)| node.selectors.len()).sum()
    }

    // External nodes

    pub fn count_external_nodes(&self) -> usize {
        self.externals.len()
    }

    pub fn external_nodes(&self) -> &[Handle<Node>] {
        &self.externals
    }

    pub fn external_node_at(&self, position: usize) -> Option<Handle<Node>> {
        self.externals.get(position).copied()
    }

    pub fn is_external_node(&self, node: Handle<Node>) -> bool {
        self.externals.contains(&node)
    }

    pub fn external_index_of(&self, node: Handle<Node>) -> Option<usize> {
        self.externals.iter().position(|external| *external == node)
    }

    // Nonterminal edges

    pub fn count_nonterminal_edges(&self) -> usize {
        self.nonterminal_edges.len()
    }

    pub fn nonterminal_edges(&self) -> impl Iterator<Item = Handle<NonterminalEdge>> {
        self.nonterminal_edges.iter_handles()
    }

    pub fn contains_nonterminal_edge(&self, edge: Handle<NonterminalEdge>) -> bool {
        self.nonterminal_edges.contains(edge)
    }

    pub fn nonterminal_edge(&self, edge: Handle<NonterminalEdge>) -> Option<&NonterminalEdge> {
        self.nonterminal_edges.get(edge)
    }

    pub fn label_of(&self, edge: Handle<NonterminalEdge>) -> Option<&NonterminalLabel> {
        self.nonterminal_edges.get(edge).map(|edge| &edge.label)
    }

    pub fn rank_of(&self, edge: Handle<NonterminalEdge>) -> Option<usize> {
        self.nonterminal_edges.get(edge).map(|edge| edge.tentacles.len())
    }

    pub fn attached_nodes_of(&self, edge: Handle<NonterminalEdge>) -> &[Handle<Node>] {
        self.nonterminal_edges
            .get(edge)
            .map(|edge| edge.tentacles.as_slice())
            .unwrap_or(&[])
    }

    // Variable edges

    pub fn count_variable_edges(&self) -> usize {
        self.variables.len()
    }

    pub fn variable_edges(&self) -> impl Iterator<Item = Handle<VariableEdge>> {
        self.variables.iter_handles()
    }

    pub fn contains_variable_edge(&self, variable: Handle<VariableEdge>) -> bool {
        self.variables.contains(variable)
    }

    /// Returns the variable edge with the given name.
    pub fn variable_with(&self, name: &str) -> Option<Handle<VariableEdge>> {
        self.variables
            .iter()
            .find(|(_, variable)| &*variable.name == name)
            .map(|(handle, _)| handle)
    }

    pub fn name_of(&self, variable: Handle<VariableEdge>) -> Option<&str> {
        self.variables.get(variable).map(|variable| variable.name())
    }

    pub fn target_of(&self, variable: Handle<VariableEdge>) -> Option<Handle<Node>> {
        self.variables.get(variable).map(|variable| variable.target)
    }

    /// Returns the node that the variable with the given name points at.
    pub fn variable_target_of(&self, name: &str) -> Option<Handle<Node>> {
        self.variable_with(name)
            .and_then(|variable| self.target_of(variable))
    }
}

impl std::fmt::Debug for HeapConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("HeapConfiguration")
            .field("nodes", &self.nodes.iter().collect::<Vec<_>>())
            .field(
                "nonterminal_edges",
                &self.nonterminal_edges.iter().collect::<Vec<_>>(),
            )
            .field("variables", &self.variables.iter().collect::<Vec<_>>())
            .field("externals", &self.externals)
            .finish()
    }
}

impl DisplayWithContext for HeapConfiguration {
    fn display_with(&self, ctx: &Context, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "nodes: [{}]",
            self.nodes.iter().format_with(", ", |(handle, node), f| f(
                &format_args!("{}:{}", handle.as_u32(), node.node_type.display(ctx))
            ))
        )?;
        write!(
            f,
            " externals: [{}]",
            self.externals.iter().map(|node| node.as_u32()).format(", ")
        )?;
        write!(
            f,
            " selectors: [{}]",
            self.nodes
                .iter()
                .flat_map(|(handle, node)| node.selectors.iter().map(move |edge| (handle, edge)))
                .format_with(", ", |(source, edge), f| f(&format_args!(
                    "{}-{}->{}",
                    source.as_u32(),
                    edge.label.display(ctx),
                    edge.target.as_u32()
                )))
        )?;
        write!(
            f,
            " nonterminals: [{}]",
            self.nonterminal_edges
                .iter()
                .format_with(", ", |(_, edge), f| f(&format_args!(
                    "{}({})",
                    edge.label.display(ctx),
                    edge.tentacles.iter().map(|node| node.as_u32()).format(",")
                )))
        )?;
        write!(
            f,
            " variables: [{}]",
            self.variables
                .iter()
                .format_with(", ", |(_, variable), f| f(&format_args!(
                    "{}->{}",
                    variable.name,
                    variable.target.as_u32()
                )))
        )
    }
}
