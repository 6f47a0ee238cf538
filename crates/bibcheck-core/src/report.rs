/*
 * report.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Console rendering of reconciliation findings.
 */

use crate::reconcile::{Divergence, Reconciliation};

pub const NO_DISCREPANCIES: &str = "No discrepancies found.";

/// Render findings as plain text.
pub fn render(result: &Reconciliation) -> String {
    render_with(result, str::to_string)
}

/// Render findings, styling each divergent identifier with `heading`.
pub fn render_with(result: &Reconciliation, heading: impl Fn(&str) -> String) -> String {
    let mut out = String::new();

    for divergence in &result.divergences {
        out.push_str(&heading(&divergence.identifier));
        out.push('\n');
        for line in divergence_lines(result, divergence) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }

    if result.is_clean() {
        out.push_str(NO_DISCREPANCIES);
        out.push('\n');
    }

    for line in missing_lines(result) {
        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// The body of one finding, without its heading.
pub fn divergence_lines(result: &Reconciliation, divergence: &Divergence) -> Vec<String> {
    let mut lines = vec![format!(
        "{:width$}: {}",
        result.primary_label,
        divergence.primary_text,
        width = result.label_width
    )];

    for source in &divergence.per_source {
        lines.push(format!("{}: {}", source.label, source.text));
        lines.push(marker_line(
            &source.label,
            &divergence.primary_text,
            source.first_diff_offset,
        ));
    }

    if !divergence.absent_from.is_empty() {
        let sources: Vec<&str> = divergence.absent_from.iter().map(String::as_str).collect();
        lines.push(format!("Not present in {}.", sources.join(" or ")));
    }

    lines
}

/// Dashes under the shared prefix and a caret under the first difference.
/// When the primary text is a prefix of the other, there is no caret.
pub fn marker_line(label: &str, primary: &str, offset: usize) -> String {
    let mut marker = " ".repeat(label.chars().count() + 2);
    marker.push_str(&"-".repeat(offset));
    if offset < primary.chars().count() {
        marker.push('^');
    }
    marker
}

pub fn missing_lines(result: &Reconciliation) -> Vec<String> {
    result
        .missing
        .iter()
        .map(|(identifier, labels)| {
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            let verb = if labels.len() == 1 { "is" } else { "are" };
            format!("{} {verb} missing ID {identifier}.", labels.join(" and "))
        })
        .collect()
}
