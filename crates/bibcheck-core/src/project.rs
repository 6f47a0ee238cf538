/*
 * project.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Project context: root directory, configuration and artifact builder.
 */

//! Project context.
//!
//! All artifact and target paths resolve against the project root. The
//! context turns each kind of source into a [`LabeledMapping`]:
//!
//! - hand-authored targets (boxed `.dtx` examples, indented CSL examples)
//! - BibTeX `.bbl` output, through the command interpreter and exceptions
//! - biblatex `.bbi` output, through the simple normaliser
//! - CSL HTML output, through the paragraph aligner

use std::path::{Path, PathBuf};

use crate::align::{AlignedPair, Alignment, ParagraphAligner, read_annotated};
use crate::artifact::{ArtifactBuilder, MakeBuilder, NoBuild, ensure_artifact};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::exceptions::Exceptions;
use crate::interpret::{CommandInterpreter, Markup};
use crate::normalize::SimpleNormalizer;
use crate::reconcile::LabeledMapping;
use crate::segment::{RecordEnd, Segmenter};
use crate::targets::{extract_boxed_targets, extract_indented_targets};

pub struct Project {
    root: PathBuf,
    config: Config,
    builder: Box<dyn ArtifactBuilder>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: Config, builder: Box<dyn ArtifactBuilder>) -> Self {
        Self {
            root: root.into(),
            config,
            builder,
        }
    }

    /// Build artifacts with the configured make program, unless disabled.
    pub fn open(root: impl Into<PathBuf>, config: Config, build: bool) -> Self {
        let builder: Box<dyn ArtifactBuilder> = if build {
            Box::new(MakeBuilder::new(config.make.clone()))
        } else {
            Box::new(NoBuild)
        };
        Self::new(root, config, builder)
    }

    /// Load `bibcheck.yml` from `root` if present.
    pub fn discover(root: impl Into<PathBuf>, build: bool) -> Result<Self> {
        let root = root.into();
        let config = Config::discover(&root)?;
        Ok(Self::open(root, config, build))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn read(&self, relative: &Path) -> Result<String> {
        let path = self.path(relative);
        std::fs::read_to_string(&path).map_err(|source| Error::Read { path, source })
    }

    /// Regenerate an artifact and return its full path.
    pub fn ensure(&mut self, relative: &Path) -> Result<PathBuf> {
        let path = self.path(relative);
        ensure_artifact(self.builder.as_mut(), &path)?;
        Ok(path)
    }

    /// Built-in exceptions plus the configured ones.
    pub fn exceptions(&self) -> Result<Exceptions> {
        let mut exceptions = Exceptions::builtin();
        exceptions.extend_from_specs(&self.config.exceptions)?;
        Ok(exceptions)
    }

    pub fn interpreter(&self) -> CommandInterpreter {
        CommandInterpreter::new(Markup::Keep).with_fixups(self.config.fixups.clone())
    }

    pub fn boxed_targets(&self, relative: &Path, label: &str) -> Result<LabeledMapping> {
        Ok(extract_boxed_targets(&self.read(relative)?, label))
    }

    pub fn indented_targets(&self, relative: &Path, label: &str) -> Result<LabeledMapping> {
        Ok(extract_indented_targets(&self.read(relative)?, label))
    }

    /// BibTeX output, interpreted and with exceptions applied.
    pub fn interpreted_outputs(&mut self, relative: &Path, label: &str) -> Result<LabeledMapping> {
        let content = self.read_artifact(relative)?;
        let interpreter = self.interpreter();
        let mut outputs = LabeledMapping::new(label);
        for record in Segmenter::new(RecordEnd::for_path(relative)).segment(&content) {
            outputs.insert(record.identifier.clone(), interpreter.interpret(&record));
        }
        self.exceptions()?.apply(&mut outputs);
        Ok(outputs)
    }

    /// biblatex output, lightly normalised.
    pub fn normalized_outputs(&mut self, relative: &Path, label: &str) -> Result<LabeledMapping> {
        let content = self.read_artifact(relative)?;
        let normalizer = SimpleNormalizer::new();
        let mut outputs = LabeledMapping::new(label);
        for record in Segmenter::new(RecordEnd::for_path(relative)).segment(&content) {
            outputs.insert(record.identifier.clone(), normalizer.normalize(&record));
        }
        Ok(outputs)
    }

    /// Align raw CSL HTML and write the annotated document.
    pub fn align_html(&mut self, raw: &Path, annotated: &Path) -> Result<Alignment> {
        let content = self.read_artifact(raw)?;
        let alignment = ParagraphAligner::new().align(&content);
        let out = self.path(annotated);
        std::fs::write(&out, &alignment.html)?;
        tracing::debug!(
            path = %out.display(),
            pairs = alignment.pairs.len(),
            "Wrote annotated document"
        );
        Ok(alignment)
    }

    /// Pairs from a document annotated elsewhere.
    pub fn annotated_pairs(&mut self, relative: &Path) -> Result<Vec<AlignedPair>> {
        Ok(read_annotated(&self.read_artifact(relative)?))
    }

    fn read_artifact(&mut self, relative: &Path) -> Result<String> {
        self.ensure(relative)?;
        self.read(relative)
    }
}
