/*
 * align.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Pairs citeproc-rendered reference paragraphs with their expected text.
 */

//! Paragraph alignment for pandoc's citeproc HTML output.
//!
//! The test document alternates citation paragraphs, the expected
//! rendering of each cited reference (one `<p>` per line) and the
//! `<div id="refs">` block pandoc generates. Pandoc orders the generated
//! entries by its own sort, so each rendered entry is matched against the
//! expected paragraphs by exact string equality. An entry with no exact
//! match takes the earliest expected paragraph still unmatched and is
//! marked as a failure.
//!
//! The result is an annotated HTML document, with each pair wrapped in
//! `target success|failure` and `references success|failure` divs, plus
//! the list of [`AlignedPair`]s. [`read_annotated`] parses such a document
//! back into pairs.

use std::sync::LazyLock;

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::Regex;

use crate::reconcile::LabeledMapping;

const ELLIPSIS_PARAGRAPH: &str = "<p>...</p>";
const REF_ID_PREFIX: &str = "ref-";

static DOM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id="([^"]*)""#).expect("Invalid regex pattern for DOM id"));

static SMART_QUOTED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<span>([“‘].*?[’”])</span>").expect("Invalid regex pattern for quoted span")
});

static NOCASE_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="nocase">([^<]*)</span>"#)
        .expect("Invalid regex pattern for nocase span")
});

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a href="(.*?)">"#).expect("Invalid regex pattern for anchor")
});

/// One rendered reference paired with the paragraph it was matched to.
/// `target` and `output` hold the inner HTML of each `<p>`, unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub identifier: String,
    pub target: String,
    pub output: String,
    pub success: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Alignment {
    /// The annotated HTML document.
    pub html: String,
    pub pairs: Vec<AlignedPair>,
}

impl Alignment {
    pub fn failures(&self) -> impl Iterator<Item = &AlignedPair> {
        self.pairs.iter().filter(|pair| !pair.success)
    }

    /// `Target` and `Output` mappings over the aligned pairs.
    pub fn mappings(&self, only_failures: bool) -> (LabeledMapping, LabeledMapping) {
        pair_mappings(&self.pairs, only_failures, "Target", "Output")
    }
}

/// Build the target and output mappings from aligned pairs, optionally
/// keeping only the failed pairs.
pub fn pair_mappings(
    pairs: &[AlignedPair],
    only_failures: bool,
    target_label: &str,
    output_label: &str,
) -> (LabeledMapping, LabeledMapping) {
    let mut targets = LabeledMapping::new(target_label);
    let mut outputs = LabeledMapping::new(output_label);
    for pair in pairs.iter().filter(|p| !only_failures || !p.success) {
        targets.insert(pair.identifier.clone(), pair.target.clone());
        outputs.insert(pair.identifier.clone(), pair.output.clone());
    }
    (targets, outputs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Citation,
    Targets,
    Refs,
    Entry,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphAligner;

impl ParagraphAligner {
    pub fn new() -> Self {
        Self
    }

    pub fn align(&self, raw_html: &str) -> Alignment {
        let mut alignment = Alignment::default();
        let html = &mut alignment.html;
        let mut state = State::Normal;
        let mut targets: Vec<String> = Vec::new();
        let mut pending = String::new();
        let mut identifier = String::new();

        for line in raw_html.split_inclusive('\n') {
            match state {
                State::Normal => {
                    if line.contains(r#"<span class="citation""#) {
                        html.push_str("<div class=\"test\">\n<div class=\"citation\">\n");
                        html.push_str(line);
                        html.push_str("</div>\n");
                        targets.clear();
                        state = State::Citation;
                    } else if !line.starts_with(ELLIPSIS_PARAGRAPH) {
                        html.push_str(line);
                    }
                }
                State::Citation | State::Targets => {
                    if line.starts_with(ELLIPSIS_PARAGRAPH) {
                        continue;
                    }
                    if line.starts_with("<p>") {
                        targets.push(with_newline(line));
                        state = State::Targets;
                    } else if state == State::Targets && line.starts_with(r#"<div id="refs""#) {
                        state = State::Refs;
                    }
                }
                State::Refs => {
                    if line.starts_with(r#"<div id="ref-"#) {
                        identifier = DOM_ID
                            .captures(line)
                            .map(|caps| identifier_from_dom_id(&caps[1]).to_string())
                            .unwrap_or_default();
                        pending.push_str(line);
                        state = State::Entry;
                    } else if line.starts_with("</div>") {
                        html.push_str(line);
                        state = State::Normal;
                    } else {
                        pending.push_str(line);
                    }
                }
                State::Entry => {
                    if line.starts_with("</div>") {
                        html.push_str(line);
                        html.push_str(line);
                        state = State::Refs;
                        continue;
                    }

                    let output = format!("<p>{}</p>\n", normalize_output(line).trim());
                    pending.push_str(&output);

                    let (target, success) = match targets.iter().position(|t| *t == output) {
                        Some(index) => (targets.remove(index), true),
                        None if !targets.is_empty() => (targets.remove(0), false),
                        None => {
                            tracing::warn!(%identifier, "Rendered entry has no expected paragraph left");
                            (String::new(), false)
                        }
                    };

                    let class = if success { "success" } else { "failure" };
                    html.push_str(&format!("<div class=\"target {class}\">\n"));
                    html.push_str(&target);
                    html.push_str("</div>\n");
                    html.push_str(&format!("<div class=\"references {class}\">\n"));
                    html.push_str(&pending);
                    pending.clear();

                    alignment.pairs.push(AlignedPair {
                        identifier: identifier.clone(),
                        target: paragraph_text(&target),
                        output: paragraph_text(&output),
                        success,
                    });
                }
            }
        }

        alignment
    }
}

/// Bring a rendered entry in line with how expected paragraphs are written.
pub fn normalize_output(line: &str) -> String {
    let line = line.replace(r#"href="https://lis-link@"#, r#"href="lis-link@"#);
    let line = SMART_QUOTED_SPAN.replace_all(&line, "${1}");
    let line = NOCASE_SPAN.replace_all(&line, "${1}");
    ANCHOR
        .replace_all(&line, r#"<a href="${1}" class="uri">"#)
        .into_owned()
}

/// Read pairs back out of an annotated document.
///
/// The document is scanned line by line, so it must use the layout
/// [`ParagraphAligner::align`] writes: each `<div class="target ...">`
/// opening tag, each `<div id="...">` entry tag and each `<p>...</p>`
/// paragraph starts its own line, and a paragraph does not wrap. Each pair
/// is a target div holding one paragraph, followed by an entry div whose
/// first paragraph is the output. Documents laid out differently yield
/// fewer pairs rather than an error.
pub fn read_annotated(html: &str) -> Vec<AlignedPair> {
    let mut pairs = Vec::new();
    let mut target: Option<(bool, Option<String>)> = None;
    let mut identifier: Option<String> = None;

    for line in html.lines() {
        if let Some(rest) = line.strip_prefix(r#"<div class="target "#) {
            target = Some((rest.starts_with("success"), None));
            identifier = None;
            continue;
        }

        if line.starts_with(r#"<div id=""#)
            && let Some(caps) = DOM_ID.captures(line)
        {
            identifier = Some(identifier_from_dom_id(&caps[1]).to_string());
            continue;
        }

        if !line.starts_with("<p>") {
            continue;
        }
        let Some((success, target_text)) = target.take() else {
            continue;
        };

        match (target_text, identifier.take()) {
            (None, None) => target = Some((success, Some(paragraph_text(line)))),
            (Some(text), Some(id)) => pairs.push(AlignedPair {
                identifier: id,
                target: text,
                output: paragraph_text(line),
                success,
            }),
            (text, id) => {
                target = Some((success, text));
                identifier = id;
            }
        }
    }

    pairs
}

fn with_newline(line: &str) -> String {
    if line.ends_with('\n') {
        line.to_string()
    } else {
        format!("{line}\n")
    }
}

/// The inner HTML of a `<p>...</p>` line with character and HTML5 named
/// entity references resolved.
fn paragraph_text(line: &str) -> String {
    let line = line.trim();
    let inner = line
        .strip_prefix("<p>")
        .and_then(|l| l.strip_suffix("</p>"))
        .unwrap_or(line);
    match unescape_with(inner, resolve_html5_entity) {
        Ok(text) => text.into_owned(),
        Err(err) => {
            tracing::warn!(%err, "Could not unescape paragraph, keeping raw text");
            inner.to_string()
        }
    }
}

/// Strip the DOM id prefix pandoc puts on reference entries.
pub fn identifier_from_dom_id(dom_id: &str) -> &str {
    dom_id.strip_prefix(REF_ID_PREFIX).unwrap_or(dom_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"<p>Intro.</p>
<p><span class="citation" data-cites="a2020 b2021">(A 2020; B 2021)</span></p>
<p>...</p>
<p>A, 2020. <em>Title A</em>. Available from: <a href="http://x" class="uri">http://x</a>.</p>
<p>B, 2021. Smith &amp; Jones.</p>
<div id="refs" class="references csl-bib-body hanging-indent" role="list">
<div id="ref-b2021" class="csl-entry" role="listitem">
B, 2021. Smith &amp; Jones.
</div>
<div id="ref-a2020" class="csl-entry" role="listitem">
A, 2020. <em>Title A</em>. Available from: <a href="http://x">http://x</a>.
</div>
</div>
<p>Outro.</p>
"#;

    #[test]
    fn test_reordered_entries_all_succeed() {
        let alignment = ParagraphAligner::new().align(RAW);
        assert_eq!(alignment.pairs.len(), 2);
        assert!(alignment.pairs.iter().all(|p| p.success));
        assert_eq!(alignment.failures().count(), 0);
        assert_eq!(alignment.pairs[0].identifier, "b2021");
        assert_eq!(alignment.pairs[0].output, "B, 2021. Smith & Jones.");
        assert_eq!(alignment.pairs[1].identifier, "a2020");
        assert!(alignment.html.contains("<div class=\"test\">\n<div class=\"citation\">\n"));
        assert!(alignment.html.contains("<p>Outro.</p>\n"));
        assert!(!alignment.html.contains("<p>...</p>"));

        let (targets, outputs) = alignment.mappings(false);
        assert_eq!(targets.label(), "Target");
        assert_eq!(outputs.get("a2020"), targets.get("a2020"));
        assert!(alignment.mappings(true).0.is_empty());
    }

    #[test]
    fn test_mismatch_falls_back_to_earliest_target() {
        let raw = RAW.replace("B, 2021. Smith &amp; Jones.\n</div>", "B, 2021. Smith and Jones.\n</div>");
        let alignment = ParagraphAligner::new().align(&raw);

        let b = &alignment.pairs[0];
        assert!(!b.success);
        // The earliest unmatched target is A's paragraph.
        assert!(b.target.starts_with("A, 2020."));
        assert_eq!(b.output, "B, 2021. Smith and Jones.");

        let a = &alignment.pairs[1];
        assert!(!a.success);
        assert_eq!(a.target, "B, 2021. Smith & Jones.");
        assert!(alignment.html.contains("<div class=\"target failure\">"));
    }

    #[test]
    fn test_html_named_entities_are_resolved() {
        let raw = r#"<p><span class="citation" data-cites="smith2020">(Smith 2020)</span></p>
<p>Smith &amp; Jones,&nbsp;2020. Pages 1&ndash;9.</p>
<div id="refs" class="references" role="list">
<div id="ref-smith2020" class="csl-entry" role="listitem">
Smith &amp; Jones,&nbsp;2020. Pages 1&ndash;9.
</div>
</div>
"#;
        let alignment = ParagraphAligner::new().align(raw);
        let pair = &alignment.pairs[0];
        assert!(pair.success);
        assert_eq!(pair.target, "Smith & Jones,\u{a0}2020. Pages 1\u{2013}9.");
        assert_eq!(pair.output, pair.target);
    }

    #[test]
    fn test_annotated_document_reads_back() {
        let alignment = ParagraphAligner::new().align(RAW);
        assert_eq!(read_annotated(&alignment.html), alignment.pairs);
    }

    #[test]
    fn test_read_annotated_needs_one_element_per_line() {
        let inline = r#"<div class="target success"><p>A.</p></div><div id="ref-a"><p>A.</p></div>"#;
        assert!(read_annotated(inline).is_empty());
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(
            normalize_output(r#"<span>“Quoted”</span> <span class="nocase">iPhone</span>"#),
            "“Quoted” iPhone"
        );
        assert_eq!(
            normalize_output(r#"<a href="https://lis-link@example">x</a>"#),
            r#"<a href="lis-link@example" class="uri">x</a>"#
        );
    }

    #[test]
    fn test_pair_mappings_only_failures() {
        let pairs = vec![
            AlignedPair {
                identifier: "ok".to_string(),
                target: "Same".to_string(),
                output: "Same".to_string(),
                success: true,
            },
            AlignedPair {
                identifier: "bad".to_string(),
                target: "Want".to_string(),
                output: "Got".to_string(),
                success: false,
            },
        ];
        let (targets, outputs) = pair_mappings(&pairs, true, "Target", "Output");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets.get("bad"), Some("Want"));
        assert_eq!(outputs.get("bad"), Some("Got"));
        assert_eq!(outputs.label(), "Output");

        let (targets, _) = pair_mappings(&pairs, false, "Target", "Output");
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_identifier_from_dom_id() {
        assert_eq!(identifier_from_dom_id("ref-smith2020"), "smith2020");
        assert_eq!(identifier_from_dom_id("smith2020"), "smith2020");
    }
}
