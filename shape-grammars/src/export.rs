// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Exporting heap configurations for inspection.
//!
//! Rendering heap configurations for humans is left to other tools.  This module only defines
//! the [`HeapExporter`][] capability that hands named heap configurations to such a tool, plus
//! an exporter that collects JSON documents in memory (with the `serde` feature).
//!
//! [`HeapExporter`]: trait.HeapExporter.html

use thiserror::Error;

use crate::context::Context;
use crate::heap::HeapConfiguration;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ExportError {
    #[error("a heap configuration named `{0}` has already been exported")]
    DuplicateName(String),
    #[error("cannot serialize `{name}`: {reason}")]
    Serialization { name: String, reason: String },
}

/// Receives named heap configurations.
pub trait HeapExporter {
    fn export(
        &mut self,
        ctx: &Context,
        name: &str,
        heap: &HeapConfiguration,
    ) -> Result<(), ExportError>;
}

/// Discards everything.
pub struct NoExport;

impl HeapExporter for NoExport {
    fn export(
        &mut self,
        _ctx: &Context,
        _name: &str,
        _heap: &HeapConfiguration,
    ) -> Result<(), ExportError> {
        Ok(())
    }
}

/// Collects each exported heap configuration as a JSON document.  Names must be unique.
#[cfg(feature = "serde")]
#[derive(Debug, Default)]
pub struct JsonExporter {
    documents: Vec<(String, String)>,
}

#[cfg(feature = "serde")]
impl JsonExporter {
    pub fn new() -> JsonExporter {
        JsonExporter::default()
    }

    /// Returns the JSON document exported under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, document)| document.as_str())
    }

    /// Returns every exported (name, document) pair, in export order.
    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.documents
            .iter()
            .map(|(name, document)| (name.as_str(), document.as_str()))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(feature = "serde")]
impl HeapExporter for JsonExporter {
    fn export(
        &mut self,
        ctx: &Context,
        name: &str,
        heap: &HeapConfiguration,
    ) -> Result<(), ExportError> {
        if self.get(name).is_some() {
            return Err(ExportError::DuplicateName(name.to_string()));
        }
        let serialized = crate::serde::HeapConfiguration::from_heap(ctx, heap);
        let document =
            serde_json::to_string_pretty(&serialized).map_err(|err| ExportError::Serialization {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        self.documents.push((name.to_string(), document));
        Ok(())
    }
}
