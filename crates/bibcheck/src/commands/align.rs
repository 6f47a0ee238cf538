/*
 * align.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Standalone annotation of pandoc HTML.
 */

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use bibcheck_core::ParagraphAligner;

pub fn execute(input: &Path, output: Option<&Path>) -> Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let alignment = ParagraphAligner::new().align(&raw);

    match output {
        Some(path) => std::fs::write(path, &alignment.html)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout()
            .write_all(alignment.html.as_bytes())
            .context("Failed to write to stdout")?,
    }

    info!(
        entries = alignment.pairs.len(),
        failures = alignment.failures().count(),
        "Annotated document"
    );
    Ok(())
}
