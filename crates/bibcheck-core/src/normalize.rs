/*
 * normalize.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Date-suffix collapse and the light cleanup path for near-plain-text output.
 */

//! Text normalisation shared by every source.
//!
//! Year suffixes such as `2004a` are a disambiguation artifact of the
//! engines; the hand-authored targets never carry them. Two collapse rules
//! exist because the sources differ in where a suffix may appear:
//!
//! - [`collapse_date_suffix`]: the record form `, 2004a. ` as it appears in
//!   formatted references (suffixes `a` and `b`).
//! - [`collapse_year_suffix`]: the looser ` 2004c.` form applied to a
//!   secondary source during reconciliation (suffixes `a` to `c`).
//!
//! Both are idempotent.

use std::sync::LazyLock;

use regex::Regex;

use crate::segment::RawRecord;

static DATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r", (\d{4})[ab]\. ").expect("Invalid regex pattern for date suffix")
});

static YEAR_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" (\d{4})[a-c]\.").expect("Invalid regex pattern for year suffix")
});

static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"‘(.*?)’").expect("Invalid regex pattern for quotes"));

static DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"“(.*?)”").expect("Invalid regex pattern for quotes"));

/// Collapse `, 2004a. ` to `, 2004. `.
pub fn collapse_date_suffix(text: &str) -> String {
    DATE_SUFFIX.replace_all(text, ", ${1}. ").into_owned()
}

/// Collapse ` 2004c.` to ` 2004.`.
pub fn collapse_year_suffix(text: &str) -> String {
    YEAR_SUFFIX.replace_all(text, " ${1}.").into_owned()
}

/// Cleanup for sources whose records are already flat text, such as the
/// output of `biblatex2bibitem`.
///
/// Curly quotes become `\enquote{...}`, typographic dashes become their TeX
/// ligature forms, and the date suffix is collapsed. No brace handling is
/// needed because these records carry no nested groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleNormalizer;

impl SimpleNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize_line(&self, line: &str) -> String {
        let text = SINGLE_QUOTED.replace_all(line, r"\enquote{${1}}");
        let text = DOUBLE_QUOTED.replace_all(&text, r"\enquote{${1}}");
        let text = collapse_date_suffix(&text);
        text.replace('’', "'").replace('—', "---").replace('–', "--")
    }

    /// Normalise one record, joining its body lines with single spaces.
    pub fn normalize(&self, record: &RawRecord) -> String {
        self.normalize_line(&record.lines.join(" "))
    }
}
