/*
 * exceptions.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Accepted differences that cannot be fixed in the BibTeX style.
 */

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reconcile::LabeledMapping;

/// How an exception rewrites an output.
#[derive(Debug, Clone)]
pub enum Rewrite {
    Literal { from: String, to: String },
    Pattern { regex: Regex, replacement: String },
}

impl Rewrite {
    fn apply(&self, text: &str) -> String {
        match self {
            Rewrite::Literal { from, to } => text.replace(from.as_str(), to),
            Rewrite::Pattern { regex, replacement } => {
                regex.replace_all(text, replacement.as_str()).into_owned()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Exception {
    pub ids: Vec<String>,
    pub rewrite: Rewrite,
}

/// An exception as written in `bibcheck.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionSpec {
    pub ids: Vec<String>,
    #[serde(flatten)]
    pub rewrite: RewriteSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewriteSpec {
    Literal { from: String, to: String },
    Pattern { pattern: String, replacement: String },
}

#[derive(Debug, Clone, Default)]
pub struct Exceptions {
    entries: Vec<Exception>,
}

impl Exceptions {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Title-casing and markup differences BibTeX cannot avoid.
    pub fn builtin() -> Self {
        let mut exceptions = Self::empty();
        exceptions.push_literal(
            &["crawford1965oim"],
            "Activation analysis: Proceedings",
            "Activation analysis: proceedings",
        );
        exceptions.push_literal(
            &["deneulin.dinerstein2010hms"],
            "Hope movements: Social",
            "Hope movements: social",
        );
        exceptions.push_literal(&["tkmmm2020ts"], "Tiger king: Murder", "Tiger king: murder");
        exceptions.push_literal(
            &[
                "devlin.etal2021ipp",
                "steward.etal2020eys",
                "liontou.etal2019dra",
                "cogley2020ccs",
                "clark2004euk",
                "gb.hc2024rpc",
            ],
            " \\textup{[Online]}}",
            "} [Online]",
        );
        exceptions.entries.push(Exception {
            ids: to_ids(&["gb.wa1735", "gb.pa2014", "gb.hmr2012"]),
            rewrite: Rewrite::Pattern {
                regex: Regex::new(r"\\emph\{(.*?) (\d{4})\}")
                    .expect("Invalid regex pattern for legislation year"),
                replacement: r"\emph{${1}} \emph{${2}}".to_string(),
            },
        });
        exceptions
    }

    pub fn push_literal(&mut self, ids: &[&str], from: &str, to: &str) {
        self.entries.push(Exception {
            ids: to_ids(ids),
            rewrite: Rewrite::Literal {
                from: from.to_string(),
                to: to.to_string(),
            },
        });
    }

    /// Append configured exceptions, compiling their patterns.
    pub fn extend_from_specs(&mut self, specs: &[ExceptionSpec]) -> Result<()> {
        for spec in specs {
            let rewrite = match &spec.rewrite {
                RewriteSpec::Literal { from, to } => Rewrite::Literal {
                    from: from.clone(),
                    to: to.clone(),
                },
                RewriteSpec::Pattern {
                    pattern,
                    replacement,
                } => Rewrite::Pattern {
                    regex: Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })?,
                    replacement: replacement.clone(),
                },
            };
            self.entries.push(Exception {
                ids: spec.ids.clone(),
                rewrite,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite the listed identifiers' texts in place.
    pub fn apply(&self, mapping: &mut LabeledMapping) {
        for exception in &self.entries {
            for id in &exception.ids {
                if let Some(text) = mapping.get_mut(id) {
                    *text = exception.rewrite.apply(text);
                }
            }
        }
    }
}

fn to_ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_literal_exception() {
        let mut outputs = LabeledMapping::from_entries(
            "Output",
            [
                ("tkmmm2020ts", "Tiger king: Murder, mayhem and madness."),
                ("other", "Tiger king: Murder."),
            ],
        );
        Exceptions::builtin().apply(&mut outputs);
        assert_eq!(
            outputs.get("tkmmm2020ts"),
            Some("Tiger king: murder, mayhem and madness.")
        );
        assert_eq!(outputs.get("other"), Some("Tiger king: Murder."));
    }

    #[test]
    fn test_builtin_online_marker() {
        let mut outputs = LabeledMapping::from_entries(
            "Output",
            [("clark2004euk", r"\emph{Title \textup{[Online]}}. Publisher.")],
        );
        Exceptions::builtin().apply(&mut outputs);
        assert_eq!(outputs.get("clark2004euk"), Some(r"\emph{Title} [Online]. Publisher."));
    }

    #[test]
    fn test_builtin_legislation_split() {
        let mut outputs = LabeledMapping::from_entries(
            "Output",
            [("gb.pa2014", r"\emph{Pensions Act 2014}, c.19.")],
        );
        Exceptions::builtin().apply(&mut outputs);
        assert_eq!(
            outputs.get("gb.pa2014"),
            Some(r"\emph{Pensions Act} \emph{2014}, c.19.")
        );
    }

    #[test]
    fn test_specs_extend_and_reject_bad_patterns() {
        let mut exceptions = Exceptions::empty();
        let specs = vec![
            ExceptionSpec {
                ids: vec!["a".to_string()],
                rewrite: RewriteSpec::Literal {
                    from: "X".to_string(),
                    to: "Y".to_string(),
                },
            },
            ExceptionSpec {
                ids: vec!["a".to_string()],
                rewrite: RewriteSpec::Pattern {
                    pattern: r"(\d+)-(\d+)".to_string(),
                    replacement: "${1}--${2}".to_string(),
                },
            },
        ];
        exceptions.extend_from_specs(&specs).unwrap();
        assert_eq!(exceptions.len(), 2);

        let mut outputs = LabeledMapping::from_entries("Output", [("a", "X pp.1-10")]);
        exceptions.apply(&mut outputs);
        assert_eq!(outputs.get("a"), Some("Y pp.1--10"));

        let bad = vec![ExceptionSpec {
            ids: vec!["a".to_string()],
            rewrite: RewriteSpec::Pattern {
                pattern: "(".to_string(),
                replacement: String::new(),
            },
        }];
        assert!(matches!(
            exceptions.extend_from_specs(&bad),
            Err(Error::InvalidPattern { .. })
        ));
    }
}
