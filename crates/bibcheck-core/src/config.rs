/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Optional `bibcheck.yml` project configuration.
 */

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::exceptions::ExceptionSpec;
use crate::interpret::RecordFixup;

pub const CONFIG_FILE: &str = "bibcheck.yml";

/// Parsed `bibcheck.yml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Program used to regenerate artifacts
    pub make: String,
    pub paths: Paths,
    /// Appended to the built-in exceptions
    pub exceptions: Vec<ExceptionSpec>,
    pub fixups: Vec<RecordFixup>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            make: "make".to_string(),
            paths: Paths::default(),
            exceptions: Vec::new(),
            fixups: Vec::new(),
        }
    }
}

/// Artifact and target locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub bst_dtx: PathBuf,
    pub bst_bbl: PathBuf,
    pub bst_old_bbl: PathBuf,
    pub bst_bib: PathBuf,
    pub biblatex_dtx: PathBuf,
    pub biblatex_bbi: PathBuf,
    pub compat_bbi: PathBuf,
    pub csl_tex: PathBuf,
    pub csl_raw_html: PathBuf,
    pub csl_html: PathBuf,
    pub csl_js_html: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            bst_dtx: "bst/bath-bst.dtx".into(),
            bst_bbl: "bst/bath-bst.bbl".into(),
            bst_old_bbl: "bst/bath-bst-v1.bbl".into(),
            bst_bib: "bst/bath-bst.bib".into(),
            biblatex_dtx: "biblatex/biblatex-bath.dtx".into(),
            biblatex_bbi: "biblatex/test-output.bbi".into(),
            compat_bbi: "biblatex/test-compat.bbi".into(),
            csl_tex: "csl/bath-csl-test.tex".into(),
            csl_raw_html: "csl/bath-csl-test-raw.html".into(),
            csl_html: "csl/bath-csl-test.html".into(),
            csl_js_html: "csl/bath-csl-test-js.html".into(),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        // An empty file parses as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content, path)
    }

    /// Load `bibcheck.yml` from `root` if present, otherwise the defaults.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Loading configuration");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
