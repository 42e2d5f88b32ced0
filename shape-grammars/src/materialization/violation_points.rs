// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use itertools::Itertools;

/// The selectors that have to be visible at each variable.  Variables and their selectors are
/// kept in insertion order, and each pair is recorded only once.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ViolationPoints {
    points: Vec<(String, Vec<String>)>,
}

impl ViolationPoints {
    pub fn new() -> ViolationPoints {
        ViolationPoints::default()
    }

    /// Returns a set containing only the pair (`variable`, `selector`).
    pub fn single(variable: &str, selector: &str) -> ViolationPoints {
        let mut points = ViolationPoints::new();
        points.add(variable, selector);
        points
    }

    pub fn add(&mut self, variable: &str, selector: &str) {
        match self.points.iter_mut().find(|(name, _)| name == variable) {
            Some((_, selectors)) => {
                if !selectors.iter().any(|existing| existing == selector) {
                    selectors.push(selector.to_string());
                }
            }
            None => self
                .points
                .push((variable.to_string(), vec![selector.to_string()])),
        }
    }

    pub fn add_all(&mut self, other: &ViolationPoints) {
        for (variable, selector) in other.iter() {
            self.add(variable, selector);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.points.iter().map(|(variable, _)| variable.as_str())
    }

    pub fn selectors_of<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.points
            .iter()
            .filter(move |(name, _)| name == variable)
            .flat_map(|(_, selectors)| selectors.iter().map(String::as_str))
    }

    /// Returns every (variable, selector) pair.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.points.iter().flat_map(|(variable, selectors)| {
            selectors
                .iter()
                .map(move |selector| (variable.as_str(), selector.as_str()))
        })
    }
}

impl Display for ViolationPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.iter()
                .format_with(", ", |(variable, selector), f| f(&format_args!(
                    "{}.{}",
                    variable, selector
                )))
        )
    }
}
