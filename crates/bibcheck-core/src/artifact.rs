/*
 * artifact.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Regeneration of raw engine output through the external build step.
 */

//! Artifact regeneration.
//!
//! Before an artifact is read, its recipe is run so it is up to date. A
//! failed recipe leaves a possibly stale file behind, so that file is
//! removed; an artifact that still does not exist afterwards is fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

const RECIPE_FAILED: &str = "Recipe failed to create file.";
const BUILD_DISABLED: &str = "File not found and building is disabled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    Failed,
    /// No build was attempted.
    Skipped,
}

pub trait ArtifactBuilder {
    fn build(&mut self, path: &Path) -> Result<BuildOutcome>;
}

/// Runs `make -C <dir> <file>`, at most once per path.
#[derive(Debug, Clone)]
pub struct MakeBuilder {
    program: String,
    outcomes: HashMap<PathBuf, BuildOutcome>,
}

impl MakeBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            outcomes: HashMap::new(),
        }
    }
}

impl Default for MakeBuilder {
    fn default() -> Self {
        Self::new("make")
    }
}

impl ArtifactBuilder for MakeBuilder {
    fn build(&mut self, path: &Path) -> Result<BuildOutcome> {
        if let Some(outcome) = self.outcomes.get(path) {
            return Ok(*outcome);
        }

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let Some(file) = path.file_name() else {
            return Ok(BuildOutcome::Failed);
        };

        tracing::info!(path = %path.display(), "Regenerating artifact");
        let status = Command::new(&self.program)
            .arg("-C")
            .arg(dir)
            .arg(file)
            .status()?;

        let outcome = if status.success() {
            BuildOutcome::Built
        } else {
            tracing::debug!(?status, path = %path.display(), "Recipe failed");
            BuildOutcome::Failed
        };
        self.outcomes.insert(path.to_path_buf(), outcome);
        Ok(outcome)
    }
}

/// Never builds; artifacts must already exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBuild;

impl ArtifactBuilder for NoBuild {
    fn build(&mut self, _path: &Path) -> Result<BuildOutcome> {
        Ok(BuildOutcome::Skipped)
    }
}

/// Bring `path` up to date, failing if it cannot be produced.
pub fn ensure_artifact(builder: &mut dyn ArtifactBuilder, path: &Path) -> Result<()> {
    let outcome = builder.build(path)?;

    if outcome == BuildOutcome::Failed && path.is_file() {
        tracing::debug!(path = %path.display(), "Removing stale artifact");
        std::fs::remove_file(path)?;
    }

    if !path.is_file() {
        let reason = match outcome {
            BuildOutcome::Skipped => BUILD_DISABLED,
            _ => RECIPE_FAILED,
        };
        return Err(Error::missing_artifact(path, reason));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Writes (or not) the artifact and reports a fixed outcome.
    struct FakeBuilder {
        outcome: BuildOutcome,
        write: bool,
        calls: usize,
    }

    impl ArtifactBuilder for FakeBuilder {
        fn build(&mut self, path: &Path) -> Result<BuildOutcome> {
            self.calls += 1;
            if self.write {
                std::fs::write(path, "content")?;
            }
            Ok(self.outcome)
        }
    }

    #[test]
    fn test_successful_build() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.bbl");
        let mut builder = FakeBuilder {
            outcome: BuildOutcome::Built,
            write: true,
            calls: 0,
        };
        ensure_artifact(&mut builder, &path).unwrap();
        assert!(path.is_file());
        assert_eq!(builder.calls, 1);
    }

    #[test]
    fn test_failed_build_removes_stale_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.bbl");
        std::fs::write(&path, "stale").unwrap();
        let mut builder = FakeBuilder {
            outcome: BuildOutcome::Failed,
            write: false,
            calls: 0,
        };
        let err = ensure_artifact(&mut builder, &path).unwrap_err();
        assert!(!path.exists());
        assert!(err.to_string().ends_with("Recipe failed to create file."));
    }

    #[test]
    fn test_no_build_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.bbi");
        assert!(matches!(
            ensure_artifact(&mut NoBuild, &path),
            Err(Error::MissingArtifact { .. })
        ));

        std::fs::write(&path, "present").unwrap();
        ensure_artifact(&mut NoBuild, &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_make_builder_runs_recipe_once() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Makefile"),
            "out.txt:\n\techo built >> count.txt\n\ttouch out.txt\n",
        )
        .unwrap();
        let path = temp.path().join("out.txt");

        let mut builder = MakeBuilder::default();
        let Ok(first) = builder.build(&path) else {
            // make is not installed here
            return;
        };
        assert_eq!(first, BuildOutcome::Built);
        assert_eq!(builder.build(&path).unwrap(), BuildOutcome::Built);

        let count = std::fs::read_to_string(temp.path().join("count.txt")).unwrap();
        assert_eq!(count.lines().count(), 1);
    }
}
