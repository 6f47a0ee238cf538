/*
 * targets.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Extracts hand-authored target renderings from documentation sources.
 */

//! Target extraction.
//!
//! Two annotation styles carry the expected output:
//!
//! - Boxed examples in `.dtx` style documentation: a
//!   `\begin{bibexbox}...{id}` line opens the box and the expected text
//!   runs until `\tcblower`. Comment lines inside the box are skipped.
//! - Indented examples in the CSL test document: a line with `\cite{...}`
//!   markers queues identifiers, and each following paragraph (ended by a
//!   blank line) is the expected text of the next queued identifier.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::collapse_date_suffix;
use crate::reconcile::LabeledMapping;

const BOX_LOWER_HALF: &str = "\\tcblower";

static BOX_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\begin\{bibexbox\}(?:\[[^\]]*\])?(?:\{[^}]*\})*\{([^}]*)\}")
        .expect("Invalid regex pattern for bibexbox")
});

static CITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\cite\{([^}]*)\}").expect("Invalid regex pattern for cite"));

fn clean_line(line: &str) -> String {
    line.trim().replace("\\@", "").replace('~', " ")
}

fn finish_text(parts: &[String]) -> String {
    collapse_date_suffix(&parts.join(" "))
}

/// Targets from `bibexbox` environments.
pub fn extract_boxed_targets(source: &str, label: &str) -> LabeledMapping {
    let mut targets = LabeledMapping::new(label);
    let mut current: Option<(String, Vec<String>)> = None;

    for line in source.lines() {
        let Some((_, parts)) = current.as_mut() else {
            if let Some(caps) = BOX_START.captures(line) {
                current = Some((caps[1].to_string(), Vec::new()));
            }
            continue;
        };

        if line.starts_with('%') {
            continue;
        }

        if line.contains(BOX_LOWER_HALF) {
            if let Some((id, parts)) = current.take() {
                targets.insert(id, finish_text(&parts));
            }
            continue;
        }

        let cleaned = clean_line(line);
        if !cleaned.is_empty() {
            parts.push(cleaned);
        }
    }

    if let Some((id, parts)) = current {
        tracing::warn!(%id, "Example box not closed before end of file");
        targets.insert(id, finish_text(&parts));
    }

    targets
}

/// Targets from paragraphs following `\cite` lines.
pub fn extract_indented_targets(source: &str, label: &str) -> LabeledMapping {
    let mut targets = LabeledMapping::new(label);
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut parts: Vec<String> = Vec::new();

    let mut close = |queue: &mut VecDeque<String>, parts: &mut Vec<String>| {
        match queue.pop_front() {
            Some(id) => targets.insert(id, finish_text(parts)),
            None => tracing::warn!("Target paragraph without a cited identifier"),
        }
        parts.clear();
    };

    for line in source.lines() {
        let line = line.trim();

        if line.is_empty() {
            if !parts.is_empty() {
                close(&mut queue, &mut parts);
            }
            continue;
        }

        if queue.is_empty() {
            for caps in CITE.captures_iter(line) {
                queue.extend(
                    caps[1]
                        .split(',')
                        .map(str::trim)
                        .filter(|key| !key.is_empty())
                        .map(str::to_string),
                );
            }
            continue;
        }

        if line == "..." {
            continue;
        }

        parts.push(clean_line(line));
    }

    if !parts.is_empty() {
        close(&mut queue, &mut parts);
    }

    targets
}
