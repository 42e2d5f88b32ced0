// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Serializable, handle-free copies of heap configurations.
//!
//! Handles only make sense together with the [`Context`][] that created them, so the types in
//! this module refer to node types, selector labels, nonterminals, and index symbols by name
//! instead.  Nodes are identified by the raw value of their handle in the original heap
//! configuration.
//!
//! [`Context`]: ../context/struct.Context.html

use fxhash::FxHashMap;
use thiserror::Error;

use crate::arena::Handle;
use crate::context::Context;
use crate::context::ContextError;
use crate::heap::HeapConfigurationError;
use crate::index::Index;
use crate::index::IndexedNonterminal;
use crate::index::NonterminalLabel;

#[derive(Clone, Debug, Default, Eq, PartialEq, ::serde::Deserialize, ::serde::Serialize)]
pub struct HeapConfiguration {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub externals: Vec<u32>,
    #[serde(default)]
    pub nonterminals: Vec<NonterminalEdge>,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Clone, Debug, Eq, PartialEq, ::serde::Deserialize, ::serde::Serialize)]
pub struct Node {
    pub id: u32,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub selectors: Vec<Selector>,
}

#[derive(Clone, Debug, Eq, PartialEq, ::serde::Deserialize, ::serde::Serialize)]
pub struct Selector {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub target: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, ::serde::Deserialize, ::serde::Serialize)]
pub struct NonterminalEdge {
    pub label: String,
    #[serde(default)]
    pub reduction_tentacles: Vec<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<IndexSymbol>>,
    pub tentacles: Vec<u32>,
}

#[derive(Clone, Debug, Eq, PartialEq, ::serde::Deserialize, ::serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexSymbol {
    Concrete { name: String },
    Bottom { name: String },
    Abstract { name: String },
    Variable,
}

#[derive(Clone, Debug, Eq, PartialEq, ::serde::Deserialize, ::serde::Serialize)]
pub struct Variable {
    pub name: String,
    pub target: u32,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("node `{0}` is defined more than once")]
    DuplicateNode(u32),
    #[error("failed to locate node `{0}`")]
    NodeNotFound(u32),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    HeapConfiguration(#[from] HeapConfigurationError),
}

impl HeapConfiguration {
    pub fn from_heap(ctx: &Context, heap: &crate::heap::HeapConfiguration) -> Self {
        let nodes = heap
            .nodes()
            .filter_map(|handle| {
                let node = heap.node(handle)?;
                Some(Node {
                    id: handle.as_u32(),
                    node_type: ctx[node.node_type()].name().to_string(),
                    selectors: node
                        .selectors()
                        .iter()
                        .map(|edge| Selector {
                            label: ctx[edge.label].name().to_string(),
                            annotation: ctx[edge.label].annotation().map(str::to_string),
                            target: edge.target.as_u32(),
                        })
                        .collect(),
                })
            })
            .collect();
        let nonterminals = heap
            .nonterminal_edges()
            .filter_map(|handle| {
                let edge = heap.nonterminal_edge(handle)?;
                let nonterminal = &ctx[edge.label().nonterminal()];
                Some(NonterminalEdge {
                    label: nonterminal.name().to_string(),
                    reduction_tentacles: nonterminal.reduction_tentacles().to_vec(),
                    index: edge.label().as_indexed().map(|indexed| {
                        indexed
                            .index()
                            .symbols()
                            .iter()
                            .map(|symbol| IndexSymbol::from_symbol(ctx, *symbol))
                            .collect()
                    }),
                    tentacles: edge.tentacles().iter().map(|node| node.as_u32()).collect(),
                })
            })
            .collect();
        let variables = heap
            .variable_edges()
            .filter_map(|handle| {
                Some(Variable {
                    name: heap.name_of(handle)?.to_string(),
                    target: heap.target_of(handle)?.as_u32(),
                })
            })
            .collect();
        Self {
            nodes,
            externals: heap.external_nodes().iter().map(|n| n.as_u32()).collect(),
            nonterminals,
            variables,
        }
    }

    /// Interns every name in `ctx` and rebuilds the heap configuration.  Node handles in the
    /// result do not necessarily match the serialized node ids.
    pub fn load_into(&self, ctx: &mut Context) -> Result<crate::heap::HeapConfiguration, Error> {
        let mut node_types = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            node_types.push(ctx.add_node_type(&node.node_type));
        }
        let mut selector_labels = Vec::new();
        for node in &self.nodes {
            for selector in &node.selectors {
                selector_labels.push(match &selector.annotation {
                    Some(annotation) => {
                        ctx.add_annotated_selector_label(&selector.label, annotation)
                    }
                    None => ctx.add_selector_label(&selector.label),
                });
            }
        }
        let mut labels = Vec::with_capacity(self.nonterminals.len());
        for edge in &self.nonterminals {
            let nonterminal = ctx.add_nonterminal(
                &edge.label,
                edge.tentacles.len(),
                &edge.reduction_tentacles,
            )?;
            labels.push(match &edge.index {
                Some(symbols) => {
                    let index = Index::from_symbols(
                        symbols.iter().map(|symbol| symbol.load_into(ctx)).collect::<Vec<_>>(),
                    );
                    NonterminalLabel::Indexed(IndexedNonterminal::new(nonterminal, index))
                }
                None => NonterminalLabel::Plain(nonterminal),
            });
        }

        let ctx: &Context = ctx;
        let mut heap = crate::heap::HeapConfiguration::new();
        let mut builder = heap.builder(ctx);
        let mut handles = FxHashMap::default();
        let mut created = Vec::new();
        for node_type in node_types {
            builder.add_nodes(node_type, 1, &mut created);
        }
        for (node, handle) in self.nodes.iter().zip(created) {
            if handles.insert(node.id, handle).is_some() {
                return Err(Error::DuplicateNode(node.id));
            }
        }
        let node = |id: u32| -> Result<Handle<crate::heap::Node>, Error> {
            handles.get(&id).copied().ok_or(Error::NodeNotFound(id))
        };
        let mut selector_labels = selector_labels.into_iter();
        for source in &self.nodes {
            for selector in &source.selectors {
                if let Some(label) = selector_labels.next() {
                    builder.add_selector(node(source.id)?, label, node(selector.target)?)?;
                }
            }
        }
        for id in &self.externals {
            builder.set_external(node(*id)?)?;
        }
        for (edge, label) in self.nonterminals.iter().zip(labels) {
            let tentacles = edge
                .tentacles
                .iter()
                .map(|id| node(*id))
                .collect::<Result<Vec<_>, _>>()?;
            builder.add_nonterminal_edge(label, &tentacles)?;
        }
        for variable in &self.variables {
            builder.add_variable_edge(&variable.name, node(variable.target)?)?;
        }
        builder.build()?;
        Ok(heap)
    }
}

impl IndexSymbol {
    fn from_symbol(ctx: &Context, symbol: crate::index::IndexSymbol) -> Self {
        match symbol {
            crate::index::IndexSymbol::Concrete(symbol) => IndexSymbol::Concrete {
                name: ctx[symbol].name().to_string(),
            },
            crate::index::IndexSymbol::Bottom(symbol) => IndexSymbol::Bottom {
                name: ctx[symbol].name().to_string(),
            },
            crate::index::IndexSymbol::Abstract(symbol) => IndexSymbol::Abstract {
                name: ctx[symbol].name().to_string(),
            },
            crate::index::IndexSymbol::Variable => IndexSymbol::Variable,
        }
    }

    fn load_into(&self, ctx: &mut Context) -> crate::index::IndexSymbol {
        match self {
            IndexSymbol::Concrete { name } => ctx.add_concrete_symbol(name, false),
            IndexSymbol::Bottom { name } => ctx.add_concrete_symbol(name, true),
            IndexSymbol::Abstract { name } => ctx.add_abstract_symbol(name),
            IndexSymbol::Variable => crate::index::IndexSymbol::Variable,
        }
    }
}
