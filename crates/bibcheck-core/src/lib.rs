//! Validation of bibliography style output against hand-authored targets
//!
//! Three engines render the same reference database: a BibTeX style, a
//! biblatex style and a CSL style. Each engine's raw output is turned into
//! a mapping from citation key to canonical text, and the mappings are
//! reconciled against targets written by hand in the styles' documentation.
//!
//! # Architecture
//!
//! - [`Segmenter`] - splits `thebibliography` output into [`RawRecord`]s
//! - [`CommandInterpreter`] - flattens BibTeX record bodies
//! - [`SimpleNormalizer`] - cleans up the flat `biblatex2bibitem` output
//! - [`ParagraphAligner`] - pairs pandoc's rendered HTML with its targets
//! - [`extract_boxed_targets`], [`extract_indented_targets`] - read targets
//! - [`Comparison`] - reconciles a primary mapping with its secondaries
//! - [`Project`] - resolves paths, regenerates artifacts and builds mappings
//!
//! # Example
//!
//! ```ignore
//! use bibcheck_core::{Comparison, Project, report};
//!
//! let mut project = Project::discover(".", true)?;
//! let paths = project.config().paths.clone();
//! let targets = project.boxed_targets(&paths.bst_dtx, "Target")?;
//! let outputs = project.interpreted_outputs(&paths.bst_bbl, "Output")?;
//! let result = Comparison::new(targets, vec![outputs]).reconcile();
//! print!("{}", report::render(&result));
//! ```

pub mod align;
pub mod artifact;
pub mod config;
pub mod error;
pub mod exceptions;
pub mod interpret;
pub mod normalize;
pub mod project;
pub mod reconcile;
pub mod report;
pub mod segment;
pub mod targets;

// Re-export commonly used types
pub use align::{AlignedPair, Alignment, ParagraphAligner, read_annotated};
pub use artifact::{ArtifactBuilder, BuildOutcome, MakeBuilder, NoBuild, ensure_artifact};
pub use config::{CONFIG_FILE, Config, Paths};
pub use error::{Error, Result};
pub use exceptions::{ExceptionSpec, Exceptions, RewriteSpec};
pub use interpret::{CommandInterpreter, Markup, RecordFixup};
pub use normalize::{SimpleNormalizer, collapse_date_suffix, collapse_year_suffix};
pub use project::Project;
pub use reconcile::{
    Comparison, Divergence, LabeledMapping, MissingReport, Reconciliation, SourceDiff,
};
pub use segment::{RawRecord, RecordEnd, Segmenter};
pub use targets::{extract_boxed_targets, extract_indented_targets};
