/*
 * segment.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Splits raw bibliography output into per-identifier records.
 */

//! Record segmentation for `thebibliography` environments.
//!
//! A record starts at a `\bibitem` line and runs until the engine's
//! record-end condition ([`RecordEnd`]). The start line itself may be
//! wrapped over several physical lines; it is complete once its square
//! brackets and braces balance.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

const BIBITEM: &str = "\\bibitem";

static LOOSE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\\bibitem|\])\{([^{}]*)\}").expect("Invalid regex pattern for bibitem key")
});

/// How an engine marks the end of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordEnd {
    /// The first blank line (BibTeX `.bbl` files).
    BlankLine,
    /// A `{}` line or the end of the environment. Blank lines are page-break
    /// artifacts and are skipped (`biblatex2bibitem` `.bbi` files).
    EmptyGroup,
}

impl RecordEnd {
    /// Pick the convention from the artifact's extension.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bbi") => RecordEnd::EmptyGroup,
            _ => RecordEnd::BlankLine,
        }
    }
}

/// The trimmed lines belonging to one identifier, start marker removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub identifier: String,
    pub lines: Vec<String>,
    /// The start marker never balanced before the record ended.
    pub malformed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    end: RecordEnd,
}

impl Segmenter {
    pub fn new(end: RecordEnd) -> Self {
        Self { end }
    }

    pub fn record_end(&self) -> RecordEnd {
        self.end
    }

    pub fn segment(&self, blob: &str) -> Vec<RawRecord> {
        let mut state = SegmentState::default();
        let mut in_preamble = true;

        for line in blob.lines() {
            let line = line.trim();

            if in_preamble {
                if line.starts_with(BIBITEM) {
                    in_preamble = false;
                } else {
                    continue;
                }
            }

            let is_end = match self.end {
                RecordEnd::BlankLine => line.is_empty(),
                RecordEnd::EmptyGroup => {
                    if line.is_empty() {
                        continue;
                    }
                    line == "{}" || line == "\\end{thebibliography}"
                }
            };

            if is_end {
                state.finish_record();
                continue;
            }

            if !state.pending_start.is_empty() {
                state.pending_start.push(line.to_string());
                state.try_complete_start();
                continue;
            }

            if line.starts_with(BIBITEM) {
                // A new start without an end marker closes the previous record.
                state.finish_record();
                state.pending_start.push(line.to_string());
                state.try_complete_start();
                continue;
            }

            match state.current.as_mut() {
                Some(record) => record.lines.push(line.to_string()),
                None => tracing::debug!(line, "Ignoring line outside any record"),
            }
        }

        state.finish_record();
        state.records
    }
}

#[derive(Default)]
struct SegmentState {
    records: Vec<RawRecord>,
    pending_start: Vec<String>,
    current: Option<RawRecord>,
}

impl SegmentState {
    fn try_complete_start(&mut self) {
        let joined = self.pending_start.join(" ");
        if !is_balanced(&joined) {
            return;
        }
        self.pending_start.clear();

        match parse_start_marker(&joined) {
            Some((identifier, rest)) => {
                let lines = if rest.is_empty() {
                    Vec::new()
                } else {
                    vec![rest.to_string()]
                };
                self.current = Some(RawRecord {
                    identifier: identifier.to_string(),
                    lines,
                    malformed: false,
                });
            }
            None => {
                tracing::warn!(line = %joined, "Could not read bibitem start marker");
            }
        }
    }

    fn finish_record(&mut self) {
        if !self.pending_start.is_empty() {
            let joined = self.pending_start.join(" ");
            self.pending_start.clear();
            match LOOSE_IDENTIFIER.captures(&joined) {
                Some(caps) => {
                    let identifier = caps[1].to_string();
                    tracing::warn!(%identifier, "Malformed bibitem: brackets or braces never balance");
                    let rest = joined[caps.get(0).map_or(0, |m| m.end())..].trim();
                    self.current = Some(RawRecord {
                        identifier,
                        lines: if rest.is_empty() {
                            Vec::new()
                        } else {
                            vec![rest.to_string()]
                        },
                        malformed: true,
                    });
                }
                None => {
                    tracing::warn!(line = %joined, "Malformed bibitem without a readable key");
                }
            }
        }

        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
    }
}

/// Square brackets and braces balance across the accumulated start line.
pub fn is_balanced(text: &str) -> bool {
    let count = |c: char| text.chars().filter(|&x| x == c).count();
    count('[') == count(']') && count('{') == count('}')
}

/// Split `\bibitem[label]{identifier} rest` into the identifier and the
/// trimmed remainder. The label is optional and may nest brackets.
pub fn parse_start_marker(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(BIBITEM)?;
    let bytes = rest.as_bytes();
    let mut pos = 0;

    if bytes.first() == Some(&b'[') {
        let mut depth = 0usize;
        let mut closed = None;
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        closed = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        pos = closed? + 1;
    }

    if bytes.get(pos) != Some(&b'{') {
        return None;
    }
    let close = pos + 1 + rest[pos + 1..].find('}')?;
    let identifier = &rest[pos + 1..close];
    if identifier.contains('{') {
        return None;
    }
    Some((identifier, rest[close + 1..].trim()))
}
