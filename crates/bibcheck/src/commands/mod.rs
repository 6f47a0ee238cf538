//! Command implementations for bibcheck
//!
//! Each command builds the labeled mappings for one scenario and returns
//! the reconciliation; printing and the exit status are shared.

pub mod align;
pub mod csl;
pub mod latex;
pub mod sync;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use bibcheck_core::{Config, Paths, Project, Reconciliation, report};

/// The project a scenario runs against.
pub struct Session {
    pub project: Project,
    pub paths: Paths,
}

impl Session {
    pub fn open(root: &Path, config: Option<&Path>, build: bool) -> Result<Self> {
        let config = match config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => Config::discover(root).context("Failed to load bibcheck.yml")?,
        };
        let paths = config.paths.clone();
        Ok(Self {
            project: Project::open(root, config, build),
            paths,
        })
    }
}

/// Print findings and map them to the exit status.
pub fn print_report(result: &Reconciliation) -> ExitCode {
    print!(
        "{}",
        report::render_with(result, |id| id.bold().to_string())
    );
    if result.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
