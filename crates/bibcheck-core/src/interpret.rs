/*
 * interpret.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Flattens BibTeX record bodies into canonical text.
 */

//! The command interpreter.
//!
//! A record body is scanned one character at a time by a three-state
//! automaton:
//!
//! - `Normal`: literal text. A backslash starts a command token. Braces only
//!   move the depth counter, except a close-brace that ends a command's
//!   argument group.
//! - `Command`: accumulating a command name. A space ends a bare control
//!   word, an open-brace starts its argument.
//! - `Gobble`: inside the first argument of `\bibinfo`, which names a
//!   metadata field and is never visible. Nothing is emitted until the
//!   depth returns to where the argument opened.
//!
//! The depth counter starts at 1. `exit_arg_depths` and
//! `exit_gobble_depths` record the depth at which each open argument
//! closes; both hold a sentinel 0 that is never popped.
//!
//! Before scanning, a fixed list of literal substitutions removes the
//! boilerplate macros BibTeX emits (see [`substitute`]).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::collapse_date_suffix;
use crate::segment::RawRecord;

/// The command whose first argument is swallowed.
const GOBBLE_COMMAND: &str = "\\bibinfo";

/// A pending command name discarded when a close-brace ends it.
const NULL_COMMAND: &str = "\\relax";

const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\\@", ""),
    ("\\newblock ", ""),
    ("\\urlprefix", "Available from: "),
    ("\\urldateprefix{}", "Accessed "),
    ("\\#", "#"),
    ("\\pounds ", "£"),
    ("~", " "),
    ("\\noop{h}", ""),
    ("\\url {", "\\url{"),
];

static NATEXLAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\\natexlab\{([^}]*)\}\}").expect("Invalid regex pattern for natexlab")
});

/// How commands with arguments appear in the canonical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    /// Keep `\name{...}` markup. The hand-authored targets are written this
    /// way, e.g. `\emph{Title}`.
    #[default]
    Keep,
    /// Drop command names and argument braces, leaving only literal text.
    /// A bare control word such as `\'e` stands for a glyph and is written
    /// as its name without the backslash.
    Flatten,
}

/// A literal replacement applied to one record's final text, for known
/// rendering artifacts that cannot be fixed at source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFixup {
    pub id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommandInterpreter {
    markup: Markup,
    fixups: Vec<RecordFixup>,
}

impl CommandInterpreter {
    pub fn new(markup: Markup) -> Self {
        Self {
            markup,
            fixups: Vec::new(),
        }
    }

    pub fn with_fixups(mut self, fixups: Vec<RecordFixup>) -> Self {
        self.fixups = fixups;
        self
    }

    /// Convert one record body into canonical text.
    pub fn interpret(&self, record: &RawRecord) -> String {
        let mut automaton = Automaton::new(self.markup);

        let lines = record
            .lines
            .iter()
            .map(|line| substitute(line))
            .filter(|line| !line.is_empty());

        for (i, line) in lines.enumerate() {
            if i > 0 {
                automaton.join_line(&line);
            }
            for ch in line.chars() {
                automaton.step(ch);
            }
            automaton.end_line();
        }

        let mut text = collapse_date_suffix(&automaton.finish());
        for fixup in self.fixups.iter().filter(|f| f.id == record.identifier) {
            text = text.replace(&fixup.from, &fixup.to);
        }
        text
    }
}

/// Apply the boilerplate substitutions to one raw line.
pub fn substitute(line: &str) -> String {
    let mut line = line.to_string();
    for (from, to) in SUBSTITUTIONS {
        line = line.replace(from, to);
    }
    let line = NATEXLAB.replace_all(&line, "${1}");
    let line = line.trim();
    line.strip_suffix("\\newblock").unwrap_or(line).trim_end().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Command,
    Gobble,
}

struct Automaton {
    markup: Markup,
    states: Vec<State>,
    output: String,
    token: String,
    depth: i64,
    exit_arg_depths: Vec<i64>,
    exit_gobble_depths: Vec<i64>,
}

impl Automaton {
    fn new(markup: Markup) -> Self {
        Self {
            markup,
            states: vec![State::Normal],
            output: String::new(),
            token: String::new(),
            depth: 1,
            exit_arg_depths: vec![0],
            exit_gobble_depths: vec![0],
        }
    }

    fn state(&self) -> State {
        self.states.last().copied().unwrap_or(State::Normal)
    }

    fn pop_state(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    fn flush(&mut self) {
        self.output.push_str(&self.token);
        self.token.clear();
    }

    /// Emit or drop a completed command name according to the markup mode.
    fn flush_command(&mut self) {
        match self.markup {
            Markup::Keep => self.flush(),
            Markup::Flatten => self.token.clear(),
        }
    }

    /// Emit a completed control word that takes no argument.
    fn flush_control_word(&mut self) {
        if self.markup == Markup::Flatten {
            self.token.retain(|c| c != '\\');
        }
        self.flush();
    }

    /// Close a brace group. Returns true when it ends a command argument.
    fn close_group(&mut self) -> bool {
        self.depth -= 1;
        let closes_arg =
            self.exit_arg_depths.len() > 1 && self.exit_arg_depths.last() == Some(&self.depth);
        if closes_arg {
            self.exit_arg_depths.pop();
            if self.markup == Markup::Keep {
                self.token.push('}');
            }
        }
        closes_arg
    }

    fn step(&mut self, ch: char) {
        match self.state() {
            State::Normal => match ch {
                '\\' => {
                    self.states.push(State::Command);
                    self.flush();
                    self.token.push(ch);
                }
                '{' => self.depth += 1,
                '}' => {
                    self.close_group();
                }
                _ => self.token.push(ch),
            },
            State::Command => match ch {
                ' ' => {
                    self.pop_state();
                    self.flush_control_word();
                    self.token.push(ch);
                }
                '{' => {
                    self.pop_state();
                    if self.token == GOBBLE_COMMAND {
                        self.states.push(State::Gobble);
                        self.exit_gobble_depths.push(self.depth);
                        self.depth += 1;
                        self.token.clear();
                    } else {
                        self.exit_arg_depths.push(self.depth);
                        self.depth += 1;
                        self.flush_command();
                        if self.markup == Markup::Keep {
                            self.token.push(ch);
                        }
                    }
                }
                '}' => {
                    if self.token == NULL_COMMAND {
                        self.token.clear();
                    } else {
                        self.flush_control_word();
                    }
                    self.pop_state();
                    self.close_group();
                }
                _ => self.token.push(ch),
            },
            State::Gobble => match ch {
                '{' => self.depth += 1,
                '}' => {
                    self.depth -= 1;
                    if self.exit_gobble_depths.len() > 1
                        && self.exit_gobble_depths.last() == Some(&self.depth)
                    {
                        self.exit_gobble_depths.pop();
                        self.pop_state();
                    }
                }
                _ => {}
            },
        }
    }

    /// Join the next physical line. A command name split from its argument
    /// by a line break continues; anywhere else the break is a space.
    fn join_line(&mut self, next: &str) {
        if self.state() == State::Command && next.starts_with('{') {
            return;
        }
        if !self.output.is_empty() || !self.token.is_empty() {
            self.step(' ');
        }
    }

    fn end_line(&mut self) {
        if self.state() != State::Command {
            self.flush();
        }
    }

    fn finish(mut self) -> String {
        if self.state() == State::Command {
            self.flush_control_word();
        } else {
            self.flush();
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lines: &[&str]) -> RawRecord {
        RawRecord {
            identifier: "test".to_string(),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            malformed: false,
        }
    }

    fn keep(lines: &[&str]) -> String {
        CommandInterpreter::new(Markup::Keep).interpret(&record(lines))
    }

    fn flatten(lines: &[&str]) -> String {
        CommandInterpreter::new(Markup::Flatten).interpret(&record(lines))
    }

    #[test]
    fn test_argument_commands_keep_markup() {
        assert_eq!(
            keep(&[r"Smith, J., 2020. \emph{Title here}. Available from: \url{http://x}"]),
            r"Smith, J., 2020. \emph{Title here}. Available from: \url{http://x}"
        );
    }

    #[test]
    fn test_argument_commands_flatten() {
        assert_eq!(
            flatten(&[r"Smith, J., 2020. \emph{Title here}. \url{http://x}"]),
            "Smith, J., 2020. Title here. http://x"
        );
    }

    #[test]
    fn test_grouping_braces_are_swallowed() {
        assert_eq!(keep(&["{Smith}, {J}., {{NASA}}."]), "Smith, J., NASA.");
    }

    #[test]
    fn test_bibinfo_gobbles_field_name() {
        assert_eq!(keep(&[r"pp.\bibinfo{pages}{123--45}."]), "pp.123--45.");
        assert_eq!(
            keep(&[r"\bibinfo{{nested {field}} name}{value} after"]),
            "value after"
        );
    }

    #[test]
    fn test_bare_control_word_is_literal() {
        assert_eq!(keep(&[r"Caf\'e au lait"]), r"Caf\'e au lait");
        assert_eq!(flatten(&[r"Caf\'e au lait"]), "Caf'e au lait");
        assert_eq!(flatten(&[r"{\ss}tra{\ss}e"]), "sstrasse");
        assert_eq!(flatten(&[r"Ends with \o"]), "Ends with o");
    }

    #[test]
    fn test_relax_is_discarded() {
        assert_eq!(keep(&[r"\emph{A\relax}"]), r"\emph{A}");
    }

    #[test]
    fn test_substitutions() {
        assert_eq!(
            keep(&[r"\newblock Price \pounds 5, no.\#3~and~more\@."]),
            "Price £5, no.#3 and more."
        );
        assert_eq!(
            keep(&[r"\urlprefix\url{http://x} [\urldateprefix{}1 May 2020]."]),
            r"Available from: \url{http://x} [Accessed 1 May 2020]."
        );
        assert_eq!(keep(&[r"Smith, 2020{\natexlab{a}}. T."]), "Smith, 2020. T.");
    }

    #[test]
    fn test_lines_join_with_spaces() {
        assert_eq!(
            keep(&["Smith, J., 2020.", r"\newblock", r"\newblock Title."]),
            "Smith, J., 2020. Title."
        );
    }

    #[test]
    fn test_command_split_from_argument_across_lines() {
        assert_eq!(keep(&[r"Available from: \url", "{http://x}"]), r"Available from: \url{http://x}");
    }

    #[test]
    fn test_date_suffix_collapsed_at_record_end() {
        assert_eq!(keep(&["Smith, J., 2020a. Title."]), "Smith, J., 2020. Title.");
    }

    #[test]
    fn test_record_fixups_apply_to_named_record_only() {
        let fixups = vec![RecordFixup {
            id: "test".to_string(),
            from: "Trunc".to_string(),
            to: "Truncated".to_string(),
        }];
        let interpreter = CommandInterpreter::new(Markup::Keep).with_fixups(fixups);
        assert_eq!(interpreter.interpret(&record(&["Trunc."])), "Truncated.");

        let mut other = record(&["Trunc."]);
        other.identifier = "other".to_string();
        assert_eq!(interpreter.interpret(&other), "Trunc.");
    }

    #[test]
    fn test_stray_close_brace_does_not_underflow() {
        assert_eq!(flatten(&["a}} b"]), "a b");
    }
}
