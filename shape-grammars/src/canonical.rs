// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Isomorphism-invariant equality and hashing for heap configurations.
//!
//! The handles inside of a heap configuration are an artifact of how it was built.  Two
//! configurations that differ only in their handle numbering describe the same heap, and must
//! compare equal and hash identically.
//!
//! We compute a _signature_ for each configuration using colour refinement: every node starts
//! with a colour derived from its type, its external position, and the variables pointing at it,
//! and is then repeatedly recoloured from the colours of its neighbourhood (selectors in both
//! directions, and the nonterminal edges it is attached to, including the tentacle position)
//! until the partition stops getting finer.  Isomorphic configurations always get the same
//! signature, so the signature is our hash.
//!
//! Different configurations can still share a signature, so equality confirms a signature match
//! with a backtracking isomorphism search.  The refined colours prune that search to candidate
//! nodes that are indistinguishable by refinement, which for heap-shaped graphs almost always
//! leaves a single candidate.

use std::hash::Hash;
use std::hash::Hasher;

use fxhash::FxHashMap;
use fxhash::FxHasher;
use itertools::Itertools;

use crate::arena::Handle;
use crate::arena::HandleSet;
use crate::arena::SupplementalArena;
use crate::context::SelectorLabel;
use crate::heap::HeapConfiguration;
use crate::heap::Node;
use crate::index::NonterminalLabel;

fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

//-------------------------------------------------------------------------------------------------
// Colour refinement

/// Incoming selectors of every node.  The heap only stores outgoing ones.
fn incoming_selectors(
    heap: &HeapConfiguration,
) -> SupplementalArena<Node, Vec<(Handle<Node>, Handle<SelectorLabel>)>> {
    let mut incoming = SupplementalArena::<Node, Vec<_>>::new();
    for (source, node) in heap.nodes.iter() {
        for edge in node.selectors() {
            incoming[edge.target].push((source, edge.label));
        }
    }
    incoming
}

fn initial_colours(heap: &HeapConfiguration) -> SupplementalArena<Node, u64> {
    let mut colours = SupplementalArena::new();
    for (handle, node) in heap.nodes.iter() {
        let variables = heap
            .attached_variables_of(handle)
            .filter_map(|variable| heap.name_of(variable))
            .sorted()
            .collect::<Vec<_>>();
        let colour = hash_of(&(
            node.node_type().as_u32(),
            heap.external_index_of(handle),
            variables,
            node.selectors().len(),
        ));
        colours.insert(handle, colour);
    }
    colours
}

fn count_classes(heap: &HeapConfiguration, colours: &SupplementalArena<Node, u64>) -> usize {
    heap.nodes
        .iter()
        .map(|(handle, _)| colours[handle])
        .unique()
        .count()
}

/// Refines node colours until the partition they induce is stable.
pub(crate) fn refined_colours(heap: &HeapConfiguration) -> SupplementalArena<Node, u64> {
    let incoming = incoming_selectors(heap);
    let edge_labels = heap
        .nonterminal_edges
        .iter()
        .map(|(handle, edge)| (handle, hash_of(edge.label())))
        .collect::<Vec<_>>();
    let mut colours = initial_colours(heap);
    let mut classes = count_classes(heap, &colours);
    for _ in 0..heap.count_nodes() {
        let mut next = SupplementalArena::new();
        for (handle, node) in heap.nodes.iter() {
            let mut neighbourhood = Vec::new();
            for edge in node.selectors() {
                neighbourhood.push((0u8, edge.label.as_u32() as u64, 0usize, colours[edge.target]));
            }
            if let Some(sources) = incoming.get(handle) {
                for (source, label) in sources {
                    neighbourhood.push((1u8, label.as_u32() as u64, 0usize, colours[*source]));
                }
            }
            for (edge, label) in &edge_labels {
                let tentacles = heap.attached_nodes_of(*edge);
                let tentacle_colours =
                    hash_of(&tentacles.iter().map(|t| colours[*t]).collect::<Vec<_>>());
                for (position, _) in tentacles.iter().enumerate().filter(|(_, t)| **t == handle) {
                    neighbourhood.push((2u8, *label, position, tentacle_colours));
                }
            }
            neighbourhood.sort_unstable();
            next.insert(handle, hash_of(&(colours[handle], neighbourhood)));
        }
        let next_classes = count_classes(heap, &next);
        colours = next;
        if next_classes == classes {
            break;
        }
        classes = next_classes;
    }
    colours
}

/// Returns an isomorphism-invariant signature of a heap configuration.
pub fn signature(heap: &HeapConfiguration) -> u64 {
    let colours = refined_colours(heap);
    signature_with(heap, &colours)
}

fn signature_with(heap: &HeapConfiguration, colours: &SupplementalArena<Node, u64>) -> u64 {
    let node_colours = heap
        .nodes
        .iter()
        .map(|(handle, _)| colours[handle])
        .sorted()
        .collect::<Vec<_>>();
    let edges = heap
        .nonterminal_edges
        .iter()
        .map(|(_, edge)| {
            hash_of(&(
                edge.label(),
                edge.tentacles().iter().map(|t| colours[*t]).collect::<Vec<_>>(),
            ))
        })
        .sorted()
        .collect::<Vec<_>>();
    let externals = heap
        .external_nodes()
        .iter()
        .map(|node| colours[*node])
        .collect::<Vec<_>>();
    hash_of(&(
        heap.count_selector_edges(),
        heap.count_variable_edges(),
        node_colours,
        edges,
        externals,
    ))
}

//-------------------------------------------------------------------------------------------------
// Isomorphism

struct Search<'a> {
    left: &'a HeapConfiguration,
    right: &'a HeapConfiguration,
    left_colours: SupplementalArena<Node, u64>,
    right_colours: SupplementalArena<Node, u64>,
    left_incoming: SupplementalArena<Node, Vec<(Handle<Node>, Handle<SelectorLabel>)>>,
    right_incoming: SupplementalArena<Node, Vec<(Handle<Node>, Handle<SelectorLabel>)>>,
    mapping: FxHashMap<Handle<Node>, Handle<Node>>,
    used: HandleSet<Node>,
}

impl<'a> Search<'a> {
    fn assign(&mut self, left: Handle<Node>, right: Handle<Node>) -> bool {
        if let Some(existing) = self.mapping.get(&left) {
            return *existing == right;
        }
        if self.used.contains(right) || !self.is_compatible(left, right) {
            return false;
        }
        self.mapping.insert(left, right);
        self.used.add(right);
        true
    }

    fn unassign(&mut self, left: Handle<Node>) {
        if let Some(right) = self.mapping.remove(&left) {
            self.used.remove(right);
        }
    }

    fn incoming_count(
        incoming: &SupplementalArena<Node, Vec<(Handle<Node>, Handle<SelectorLabel>)>>,
        node: Handle<Node>,
    ) -> usize {
        incoming.get(node).map_or(0, Vec::len)
    }

    /// Checks that mapping `left` to `right` agrees with every selector whose other end has
    /// already been mapped.
    fn is_compatible(&self, left: Handle<Node>, right: Handle<Node>) -> bool {
        if self.left_colours.get(left) != self.right_colours.get(right)
            || self.left.node_type_of(left) != self.right.node_type_of(right)
        {
            return false;
        }
        let left_out = self.left.selector_edges_of(left);
        if left_out.len() != self.right.selector_edges_of(right).len()
            || Self::incoming_count(&self.left_incoming, left)
                != Self::incoming_count(&self.right_incoming, right)
        {
            return false;
        }
        let image = |node: Handle<Node>| {
            if node == left {
                Some(right)
            } else {
                self.mapping.get(&node).copied()
            }
        };
        for edge in left_out {
            let expected = self.right.selector_target_of(right, edge.label);
            match (image(edge.target), expected) {
                (_, None) => return false,
                (Some(target), Some(actual)) if target != actual => return false,
                _ => {}
            }
        }
        if let Some(sources) = self.left_incoming.get(left) {
            for (source, label) in sources {
                if let Some(source) = image(*source) {
                    if self.right.selector_target_of(source, *label) != Some(right) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn edges_match(&self) -> bool {
        let mut remaining = FxHashMap::<(&NonterminalLabel, Vec<Handle<Node>>), usize>::default();
        for (_, edge) in self.right.nonterminal_edges.iter() {
            *remaining
                .entry((edge.label(), edge.tentacles().to_vec()))
                .or_default() += 1;
        }
        for (_, edge) in self.left.nonterminal_edges.iter() {
            let tentacles = edge
                .tentacles()
                .iter()
                .map(|t| self.mapping.get(t).copied())
                .collect::<Option<Vec<_>>>();
            let tentacles = match tentacles {
                Some(tentacles) => tentacles,
                None => return false,
            };
            match remaining.get_mut(&(edge.label(), tentacles)) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return false,
            }
        }
        true
    }

    fn extend(&mut self, order: &[Handle<Node>]) -> bool {
        let (left, rest) = match order.split_first() {
            Some(split) => split,
            None => return self.edges_match(),
        };
        if self.mapping.contains_key(left) {
            return self.extend(rest);
        }
        let colour = self.left_colours.get(*left).copied();
        let candidates = self
            .right
            .nodes
            .iter()
            .map(|(handle, _)| handle)
            .filter(|candidate| self.right_colours.get(*candidate).copied() == colour)
            .collect::<Vec<_>>();
        for candidate in candidates {
            if self.assign(*left, candidate) {
                if self.extend(rest) {
                    return true;
                }
                self.unassign(*left);
            }
        }
        false
    }
}

/// Returns whether two heap configurations are isomorphic: whether there is a bijection between
/// their nodes that preserves node types, selectors, nonterminal edges (labels and tentacle
/// order), variables, and the order of external nodes.
pub fn is_isomorphic(left: &HeapConfiguration, right: &HeapConfiguration) -> bool {
    if left.count_nodes() != right.count_nodes()
        || left.count_nonterminal_edges() != right.count_nonterminal_edges()
        || left.count_variable_edges() != right.count_variable_edges()
        || left.count_external_nodes() != right.count_external_nodes()
        || left.count_selector_edges() != right.count_selector_edges()
    {
        return false;
    }
    let left_colours = refined_colours(left);
    let right_colours = refined_colours(right);
    if signature_with(left, &left_colours) != signature_with(right, &right_colours) {
        return false;
    }
    let mut search = Search {
        left,
        right,
        left_colours,
        right_colours,
        left_incoming: incoming_selectors(left),
        right_incoming: incoming_selectors(right),
        mapping: FxHashMap::default(),
        used: HandleSet::new(),
    };

    // External nodes and variables pin down part of the mapping up front.
    let pinned = left
        .external_nodes()
        .iter()
        .copied()
        .zip(right.external_nodes().iter().copied())
        .collect::<Vec<_>>();
    for (l, r) in pinned {
        if !search.assign(l, r) {
            return false;
        }
    }
    for variable in left.variable_edges() {
        let name = left.name_of(variable).unwrap_or_default();
        let targets = (left.target_of(variable), right.variable_target_of(name));
        match targets {
            (Some(l), Some(r)) => {
                if !search.assign(l, r) {
                    return false;
                }
            }
            _ => return false,
        }
    }

    // Most distinctive colour classes first.
    let mut class_sizes = FxHashMap::<u64, usize>::default();
    for (handle, _) in left.nodes.iter() {
        *class_sizes.entry(search.left_colours[handle]).or_default() += 1;
    }
    let order = left
        .nodes
        .iter()
        .map(|(handle, _)| handle)
        .sorted_by_key(|handle| (class_sizes[&search.left_colours[*handle]], *handle))
        .collect::<Vec<_>>();
    search.extend(&order)
}

impl PartialEq for HeapConfiguration {
    fn eq(&self, other: &HeapConfiguration) -> bool {
        is_isomorphic(self, other)
    }
}

impl Eq for HeapConfiguration {}

impl Hash for HeapConfiguration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        signature(self).hash(state);
    }
}
