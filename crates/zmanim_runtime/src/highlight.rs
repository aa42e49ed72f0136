//! Syntax highlighting for the REPL.

use std::borrow::Cow;

use zmanim_language::{Base, ConditionVar, Direction, Function, Primitive};

const RESET: &str = "\x1b[0m";
const COMMENT: &str = "\x1b[2;3m";
const STRING: &str = "\x1b[33m";
const NUMBER: &str = "\x1b[35m";
const REFERENCE: &str = "\x1b[34m";
const KEYWORD: &str = "\x1b[32m";
const FUNCTION: &str = "\x1b[1;36m";
const PRIMITIVE: &str = "\x1b[36m";
const ARGUMENT: &str = "\x1b[35m";
const COMMAND: &str = "\x1b[1;33m";

/// Highlighter for the formula language.
#[derive(Debug, Default)]
pub struct FormulaHighlighter;

impl FormulaHighlighter {
    /// Creates a new highlighter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Highlights a line of input.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }
        let mut out = String::with_capacity(line.len() * 2);

        // REPL commands: color the command word only
        let body = if line.starts_with(':') {
            let end = line.find(char::is_whitespace).unwrap_or(line.len());
            paint(&mut out, COMMAND, &line[..end]);
            &line[end..]
        } else {
            line
        };

        let mut rest = body;
        while let Some(c) = rest.chars().next() {
            let len = match c {
                '/' if rest.starts_with("//") => {
                    paint(&mut out, COMMENT, rest);
                    rest.len()
                }
                '/' if rest.starts_with("/*") => {
                    let len = rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
                    paint(&mut out, COMMENT, &rest[..len]);
                    len
                }
                '"' => {
                    let len = rest[1..].find('"').map_or(rest.len(), |i| i + 2);
                    paint(&mut out, STRING, &rest[..len]);
                    len
                }
                '@' => {
                    let len = 1 + word_len(&rest[1..]);
                    paint(&mut out, REFERENCE, &rest[..len]);
                    len
                }
                c if c.is_ascii_digit() => {
                    let len = rest
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'))
                        .unwrap_or(rest.len());
                    paint(&mut out, NUMBER, &rest[..len]);
                    len
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let len = word_len(rest);
                    let word = &rest[..len];
                    match word_color(word) {
                        Some(color) => paint(&mut out, color, word),
                        None => out.push_str(word),
                    }
                    len
                }
                c => {
                    out.push(c);
                    c.len_utf8()
                }
            };
            rest = &rest[len..];
        }

        Cow::Owned(out)
    }
}

fn paint(out: &mut String, color: &str, text: &str) {
    out.push_str(color);
    out.push_str(text);
    out.push_str(RESET);
}

fn word_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len())
}

fn word_color(word: &str) -> Option<&'static str> {
    if matches!(word, "if" | "else" | "true" | "false") {
        Some(KEYWORD)
    } else if Function::from_name(word).is_some() || word == "custom" {
        Some(FUNCTION)
    } else if Primitive::from_name(word).is_some() || ConditionVar::from_name(word).is_some() {
        Some(PRIMITIVE)
    } else if Direction::from_name(word).is_some() || Base::from_name(word).is_some() {
        Some(ARGUMENT)
    } else {
        None
    }
}
