/*
 * sync.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Cross-check of the three sets of hand-authored targets.
 */

use anyhow::{Context, Result};

use bibcheck_core::{Comparison, Reconciliation};

use super::Session;

pub fn execute(session: &mut Session) -> Result<Reconciliation> {
    let paths = &session.paths;
    let project = &session.project;

    let biblatex = project
        .boxed_targets(&paths.biblatex_dtx, "Biblatex")
        .context("Failed to extract biblatex targets")?;
    let bibtex = project
        .boxed_targets(&paths.bst_dtx, "BibTeX")
        .context("Failed to extract BibTeX targets")?;
    let csl = project
        .indented_targets(&paths.csl_tex, "CSL")
        .context("Failed to extract CSL targets")?;

    Ok(Comparison::new(biblatex, vec![bibtex, csl]).reconcile())
}
