/*
 * scenarios.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end checks from raw engine output to reconciliation findings.
 */

use bibcheck_core::{
    CommandInterpreter, Comparison, LabeledMapping, Markup, RecordEnd, Segmenter, report,
};

fn interpret_all(blob: &str, markup: Markup, label: &str) -> LabeledMapping {
    let interpreter = CommandInterpreter::new(markup);
    let mut outputs = LabeledMapping::new(label);
    for record in Segmenter::new(RecordEnd::BlankLine).segment(blob) {
        outputs.insert(record.identifier.clone(), interpreter.interpret(&record));
    }
    outputs
}

#[test]
fn test_single_line_record_matches_target() {
    let blob = r"\bibitem[Smith, 2020]{smith2020xyz} \newblock Smith, J., 2020a. Title here. \newblock Available from: \url{http://x}";
    let outputs = interpret_all(blob, Markup::Flatten, "Output");
    assert_eq!(
        outputs.get("smith2020xyz"),
        Some("Smith, J., 2020. Title here. Available from: http://x")
    );

    let targets = LabeledMapping::from_entries(
        "Target",
        [(
            "smith2020xyz",
            "Smith, J., 2020. Title here. Available from: http://x",
        )],
    );
    assert!(Comparison::new(targets, vec![outputs]).reconcile().is_clean());
}

#[test]
fn test_gobbled_field_name_is_absent() {
    let blob = r"\bibitem{jones2019}
Jones, K., 2019. Article. \emph{Journal}, pp.\bibinfo{pages}{123--45}.
";
    for markup in [Markup::Keep, Markup::Flatten] {
        let outputs = interpret_all(blob, markup, "Output");
        let text = outputs.get("jones2019").unwrap();
        assert!(!text.contains("pages"), "{text}");
        assert!(text.starts_with("Jones, K., 2019. Article. "));
        assert!(text.ends_with("pp.123--45."));
    }
}

#[test]
fn test_identifier_only_in_output_is_missing_from_target() {
    let targets = LabeledMapping::from_entries("Target", [("a", "Foo")]);
    let outputs = LabeledMapping::from_entries("Output", [("a", "Foo"), ("b", "Bar")]);
    let result = Comparison::new(targets, vec![outputs]).reconcile();

    assert!(result.divergences.is_empty());
    assert_eq!(report::render(&result), "Target is missing ID b.\n");
}

#[test]
fn test_bbl_against_dtx_targets() {
    let dtx = r"% \begin{bibexbox}{Book}{adams1995hgg}
Adams, D., 1995. \emph{The hitchhiker's guide to the galaxy}. London: Pan.
\tcblower
% \begin{bibexbox}{Book}{brown2001}
Brown, E., 2001a. \emph{Second}. Oxford: OUP.
\tcblower
";
    let bbl = r"\begin{thebibliography}{2}
\providecommand{\natexlab}[1]{#1}

\bibitem[Adams(1995)]{adams1995hgg}
Adams, D., 1995.
\newblock \emph{The hitchhiker's guide to the galaxy}.
\newblock London: Pan.

\bibitem[Brown(2001{\natexlab{a}})]{brown2001}
Brown, E., 2001{\natexlab{a}}.
\newblock \emph{Second}.
\newblock Oxford: UP.

\end{thebibliography}
";
    let targets = bibcheck_core::extract_boxed_targets(dtx, "Target");
    let outputs = interpret_all(bbl, Markup::Keep, "Output");
    let result = Comparison::new(targets, vec![outputs]).reconcile();

    let divergent: Vec<&str> = result.divergent_identifiers().collect();
    assert_eq!(divergent, vec!["brown2001"]);
    assert_eq!(
        result.divergences[0].per_source[0].text,
        r"Brown, E., 2001. \emph{Second}. Oxford: UP."
    );
    assert!(result.missing.is_empty());
}
