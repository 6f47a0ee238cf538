/*
 * csl.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * CSL output rendered by pandoc and citeproc-js.
 */

use anyhow::Result;
use tracing::info;

use bibcheck_core::align::pair_mappings;
use bibcheck_core::{Alignment, Comparison, Reconciliation};

use super::Session;

fn aligned(session: &mut Session) -> Result<Alignment> {
    let raw = session.paths.csl_raw_html.clone();
    let annotated = session.paths.csl_html.clone();
    let alignment = session.project.align_html(&raw, &annotated)?;
    info!(
        entries = alignment.pairs.len(),
        failures = alignment.failures().count(),
        "Aligned pandoc output"
    );
    Ok(alignment)
}

/// Only failed pairs are contrasted.
pub fn csl(session: &mut Session) -> Result<Reconciliation> {
    let (targets, outputs) = aligned(session)?.mappings(true);
    Ok(Comparison::new(targets, vec![outputs]).reconcile())
}

pub fn csl_impl(session: &mut Session) -> Result<Reconciliation> {
    let alignment = aligned(session)?;
    let (_, pandoc) = pair_mappings(&alignment.pairs, false, "Target", "Pandoc");

    let js = session.paths.csl_js_html.clone();
    let pairs = session.project.annotated_pairs(&js)?;
    let (_, citeproc_js) = pair_mappings(&pairs, false, "Target", "CiteprocJS");

    Ok(Comparison::new(pandoc, vec![citeproc_js]).reconcile())
}
