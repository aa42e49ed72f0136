//! Line editor abstraction for the REPL.
//!
//! The REPL reads through [`LineEditor`], so tests drive it with scripted
//! input while the binary uses rustyline.

use std::borrow::Cow;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator as RLValidator};
use zmanim_foundation::{Error, ErrorKind, Result};
use zmanim_language::known_identifiers;

use crate::highlight::FormulaHighlighter;

/// Result of reading a line from the editor.
#[derive(Debug)]
pub enum ReadResult {
    /// A line was read.
    Line(String),
    /// User pressed Ctrl+C.
    Interrupted,
    /// User pressed Ctrl+D.
    Eof,
}

/// Abstraction over line editing.
pub trait LineEditor {
    /// Reads a line with the given prompt.
    ///
    /// # Errors
    /// Returns an error if reading from the terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Adds a line to history.
    fn add_history(&mut self, line: &str);

    /// Adds words offered by completion, such as formula keys.
    fn add_completions(&mut self, words: Vec<String>);
}

/// REPL commands offered by completion.
pub const COMMANDS: &[&str] = &[
    ":date", ":loc", ":events", ":def", ":load", ":defs", ":breakdown", ":help", ":quit",
];

#[derive(Helper, Completer, Hinter, RLValidator)]
struct FormulaHelper {
    #[rustyline(Completer)]
    completer: WordCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    #[rustyline(Validator)]
    validator: BraceValidator,
    highlighter: FormulaHighlighter,
}

impl Highlighter for FormulaHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

/// Completes language words, REPL commands and `@` formula keys.
struct WordCompleter {
    words: Vec<String>,
    keys: Vec<String>,
}

impl WordCompleter {
    fn new() -> Self {
        let mut words = known_identifiers();
        words.extend(COMMANDS.iter().map(|c| (*c).to_string()));
        Self {
            words,
            keys: Vec::new(),
        }
    }

    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let start = line[..pos]
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '@'))
            .map_or(0, |i| i + 1);
        let word = &line[start..pos];
        if word.is_empty() {
            return (start, Vec::new());
        }
        let matches = match word.strip_prefix('@') {
            Some(prefix) => self
                .keys
                .iter()
                .filter(|k| k.starts_with(prefix))
                .map(|k| format!("@{k}"))
                .collect(),
            None => self
                .words
                .iter()
                .filter(|w| w.starts_with(word))
                .cloned()
                .collect(),
        };
        (start, matches)
    }
}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(line, pos);
        let pairs = matches
            .into_iter()
            .map(|m| Pair {
                display: m.clone(),
                replacement: m,
            })
            .collect();
        Ok((start, pairs))
    }
}

/// Keeps reading while parentheses or braces are open.
#[derive(Default)]
struct BraceValidator;

impl Validator for BraceValidator {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        if is_complete(ctx.input()) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

/// Returns true if every `(` and `{` outside strings and comments is closed.
#[must_use]
pub fn is_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_string = !in_string,
            '/' if !in_string && chars.peek() == Some(&'/') => {
                // line comment: skip to end of line
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | '{' if !in_string => depth += 1,
            ')' | '}' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth <= 0 && !in_string
}

/// Line editor backed by rustyline.
pub struct RustylineEditor {
    editor: Editor<FormulaHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates a rustyline editor with completion and highlighting.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?
            .build();

        let helper = FormulaHelper {
            completer: WordCompleter::new(),
            hinter: HistoryHinter::new(),
            validator: BraceValidator,
            highlighter: FormulaHighlighter::new(),
        };

        let mut editor = Editor::with_config(config)
            .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?;
        editor.set_helper(Some(helper));

        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::new(ErrorKind::Io(e.to_string()))),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn add_completions(&mut self, words: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            for word in words {
                if !helper.completer.keys.contains(&word) {
                    helper.completer.keys.push(word);
                }
            }
        }
    }
}
