/*
 * latex.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * BibTeX and biblatex output against the .dtx example boxes.
 */

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use bibcheck_core::{Comparison, LabeledMapping, Reconciliation};

use super::Session;

fn dtx_targets(session: &Session, dtx: &Path) -> Result<LabeledMapping> {
    let targets = session
        .project
        .boxed_targets(dtx, "Target")
        .with_context(|| format!("Failed to extract targets from {}", dtx.display()))?;
    debug!(count = targets.len(), "Extracted targets");
    Ok(targets)
}

fn contrast(targets: LabeledMapping, outputs: LabeledMapping) -> Reconciliation {
    Comparison::new(targets, vec![outputs]).reconcile()
}

fn bibtex(session: &mut Session, bbl: &Path) -> Result<Reconciliation> {
    let targets = dtx_targets(session, &session.paths.bst_dtx)?;
    let outputs = session.project.interpreted_outputs(bbl, "Output")?;
    Ok(contrast(targets, outputs))
}

pub fn bst(session: &mut Session) -> Result<Reconciliation> {
    let bbl = session.paths.bst_bbl.clone();
    bibtex(session, &bbl)
}

pub fn bst_old(session: &mut Session) -> Result<Reconciliation> {
    let bbl = session.paths.bst_old_bbl.clone();
    bibtex(session, &bbl)
}

fn biblatex_against(session: &mut Session, bbi: &Path) -> Result<Reconciliation> {
    let targets = dtx_targets(session, &session.paths.biblatex_dtx)?;
    let outputs = session.project.normalized_outputs(bbi, "Output")?;
    Ok(contrast(targets, outputs))
}

pub fn biblatex(session: &mut Session) -> Result<Reconciliation> {
    let bbi = session.paths.biblatex_bbi.clone();
    biblatex_against(session, &bbi)
}

/// The compatibility run reads the database generated for BibTeX.
pub fn compat(session: &mut Session) -> Result<Reconciliation> {
    let bib = session.paths.bst_bib.clone();
    session.project.ensure(&bib)?;
    let bbi = session.paths.compat_bbi.clone();
    biblatex_against(session, &bbi)
}
