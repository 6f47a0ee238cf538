/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for bibcheck-core.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Divergences, missing identifiers and malformed records are
/// findings, not errors, and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// A required artifact does not exist and the build step did not produce it.
    #[error("Could not create {}: {reason}", path.display())]
    MissingArtifact { path: PathBuf, reason: String },

    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A user-supplied exception pattern failed to compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("No contrast to make.")]
    NoComparison,
}

impl Error {
    pub fn missing_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MissingArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
