/*
 * reconcile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * N-way comparison of identifier-to-text mappings.
 */

//! Reconciliation of labeled mappings.
//!
//! A [`Comparison`] holds one primary mapping and any number of
//! secondaries. Every primary identifier is checked against each secondary:
//! a secondary that lacks it is recorded as missing, and a secondary whose
//! text still differs after the year-suffix collapse is recorded in a
//! [`Divergence`] together with the offset of the first differing char.
//!
//! Identifiers that only secondaries define are found through the union of
//! all key sets and recorded as missing from every mapping that lacks them.

use std::collections::BTreeSet;

use hashlink::LinkedHashMap;

use crate::error::{Error, Result};
use crate::normalize::collapse_year_suffix;

/// One source's identifier-to-text mapping. Insertion order is kept so
/// reports follow the source's order; redefining an identifier overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledMapping {
    label: String,
    entries: LinkedHashMap<String, String>,
}

impl LabeledMapping {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: LinkedHashMap::new(),
        }
    }

    pub fn from_entries<K, V>(label: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut mapping = Self::new(label);
        for (id, text) in entries {
            mapping.insert(id, text);
        }
        mapping
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Same entries under a different label.
    pub fn relabel(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn insert(&mut self, identifier: impl Into<String>, text: impl Into<String>) {
        self.entries.replace(identifier.into(), text.into());
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut String> {
        self.entries.get_mut(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// A secondary source's text for a divergent identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDiff {
    pub label: String,
    /// The secondary text after the year-suffix collapse.
    pub text: String,
    /// Char offset of the first difference from the primary text.
    pub first_diff_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub identifier: String,
    pub primary_text: String,
    pub per_source: Vec<SourceDiff>,
    /// Secondary labels lacking this identifier, reported with the divergence.
    pub absent_from: BTreeSet<String>,
}

/// Identifier to the labels of the mappings lacking it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingReport {
    entries: LinkedHashMap<String, BTreeSet<String>>,
}

impl MissingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, identifier: &str, label: &str) {
        match self.entries.get_mut(identifier) {
            Some(labels) => {
                labels.insert(label.to_string());
            }
            None => {
                self.entries
                    .insert(identifier.to_string(), BTreeSet::from([label.to_string()]));
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub primary_label: String,
    /// Width of the widest label, for aligned reporting.
    pub label_width: usize,
    pub divergences: Vec<Divergence>,
    pub missing: MissingReport,
}

impl Reconciliation {
    /// No divergences and nothing missing.
    pub fn is_clean(&self) -> bool {
        self.divergences.is_empty() && self.missing.is_empty()
    }

    pub fn divergent_identifiers(&self) -> impl Iterator<Item = &str> {
        self.divergences.iter().map(|d| d.identifier.as_str())
    }
}

/// A primary mapping, treated as ground truth, and the secondaries checked
/// against it.
#[derive(Debug, Clone)]
pub struct Comparison {
    primary: LabeledMapping,
    secondaries: Vec<LabeledMapping>,
}

impl Comparison {
    pub fn new(primary: LabeledMapping, secondaries: Vec<LabeledMapping>) -> Self {
        Self {
            primary,
            secondaries,
        }
    }

    /// The first mapping becomes the primary.
    pub fn from_mappings(mappings: Vec<LabeledMapping>) -> Result<Self> {
        let mut mappings = mappings.into_iter();
        let primary = mappings.next().ok_or(Error::NoComparison)?;
        Ok(Self::new(primary, mappings.collect()))
    }

    pub fn primary(&self) -> &LabeledMapping {
        &self.primary
    }

    pub fn secondaries(&self) -> &[LabeledMapping] {
        &self.secondaries
    }

    fn mappings(&self) -> impl Iterator<Item = &LabeledMapping> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    pub fn reconcile(&self) -> Reconciliation {
        let mut divergences = Vec::new();
        let mut missing = MissingReport::new();

        for (identifier, primary_text) in self.primary.iter() {
            let mut per_source = Vec::new();
            let mut absent_from = BTreeSet::new();

            for secondary in &self.secondaries {
                let Some(text) = secondary.get(identifier) else {
                    absent_from.insert(secondary.label().to_string());
                    continue;
                };
                if text == primary_text {
                    continue;
                }
                let collapsed = collapse_year_suffix(text);
                if collapsed != primary_text {
                    per_source.push(SourceDiff {
                        label: secondary.label().to_string(),
                        first_diff_offset: first_difference(primary_text, &collapsed),
                        text: collapsed,
                    });
                }
            }

            if !per_source.is_empty() {
                divergences.push(Divergence {
                    identifier: identifier.to_string(),
                    primary_text: primary_text.to_string(),
                    per_source,
                    absent_from,
                });
            } else {
                for label in &absent_from {
                    missing.add(identifier, label);
                }
            }
        }

        // Identifiers the primary lacks, across the union of all key sets.
        for mapping in &self.secondaries {
            for identifier in mapping.identifiers() {
                if self.primary.contains(identifier) {
                    continue;
                }
                for other in self.mappings().filter(|m| !m.contains(identifier)) {
                    missing.add(identifier, other.label());
                }
            }
        }

        Reconciliation {
            primary_label: self.primary.label().to_string(),
            label_width: self
                .mappings()
                .map(|m| m.label().chars().count())
                .max()
                .unwrap_or(0),
            divergences,
            missing,
        }
    }
}

/// Char offset of the first difference, or the shorter length when one
/// text is a prefix of the other.
pub fn first_difference(primary: &str, secondary: &str) -> usize {
    primary
        .chars()
        .zip(secondary.chars())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| primary.chars().count().min(secondary.chars().count()))
}
