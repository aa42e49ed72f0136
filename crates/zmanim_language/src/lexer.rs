//! Lexer for the formula DSL.
//!
//! The lexer converts formula text into a stream of tokens. Durations are
//! recognised here: a number immediately followed by a unit (`72min`,
//! `1.5hr`) becomes one [`TokenKind::Duration`], and runs like `1h 30min`
//! fold into a single token.

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for formula text.
///
/// Cloning a lexer snapshots its position, which is how compound
/// durations back out when the next word is not a unit.
#[derive(Clone)]
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub const fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => match self.peek_char_n(1) {
                Some('/') => self.scan_line_comment(),
                Some('*') => self.scan_block_comment(),
                _ => self.single(TokenKind::Slash),
            },
            '=' => self.pair('=', TokenKind::EqEq, "expected '==' but found '='"),
            '&' => self.pair('&', TokenKind::AndAnd, "expected '&&' but found '&'"),
            '|' => self.pair('|', TokenKind::OrOr, "expected '||' but found '|'"),
            '!' => self.either('=', TokenKind::BangEq, TokenKind::Bang),
            '<' => self.either('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.either('=', TokenKind::GtEq, TokenKind::Gt),
            '@' => self.scan_reference(),
            '"' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens.
    ///
    /// Comments are included in the output.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks `n` characters ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Two-character operator whose first character is not valid alone.
    fn pair(&mut self, second: char, kind: TokenKind, error: &str) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            kind
        } else {
            TokenKind::Error(error.to_string())
        }
    }

    /// `long` if the next character is `second`, otherwise `short`.
    fn either(&mut self, second: char, long: TokenKind, short: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            long
        } else {
            short
        }
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans a `//` comment up to the end of the line.
    fn scan_line_comment(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
        TokenKind::Comment(self.source[start..self.position].to_string())
    }

    /// Scans a `/* ... */` comment.
    fn scan_block_comment(&mut self) -> TokenKind {
        let start = self.position;
        self.advance();
        self.advance();
        loop {
            match self.peek_char() {
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return TokenKind::Comment(self.source[start..self.position].to_string());
                }
                Some(_) => self.advance(),
                None => return TokenKind::Error("unterminated block comment".into()),
            }
        }
    }

    /// Scans `@key`.
    fn scan_reference(&mut self) -> TokenKind {
        self.advance(); // consume '@'
        let name = self.scan_ident_text();
        if name.is_empty() {
            TokenKind::Error("expected formula key after '@'".into())
        } else {
            TokenKind::Reference(name)
        }
    }

    /// Scans a string literal.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    return TokenKind::String(text);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some(c @ ('"' | '\\')) => {
                            self.advance();
                            text.push(c);
                        }
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in string escape".into(),
                            );
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated string literal".into()),
            }
        }
    }

    /// Scans digits with an optional fractional part.
    fn scan_digits(&mut self) -> Result<(f64, bool), String> {
        let start = self.position;
        let mut has_dot = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !has_dot && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.position];
        text.parse::<f64>()
            .map(|n| (n, has_dot))
            .map_err(|e| format!("invalid number '{text}': {e}"))
    }

    /// Scans ASCII letters, as used by units and month names.
    fn scan_word(&mut self) -> &'src str {
        let start = self.position;
        while self.peek_char().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.advance();
        }
        &self.source[start..self.position]
    }

    /// Scans a number, duration or date literal.
    fn scan_number(&mut self) -> TokenKind {
        let (value, has_dot) = match self.scan_digits() {
            Ok(parsed) => parsed,
            Err(message) => return TokenKind::Error(message),
        };

        match self.peek_char() {
            Some('-') if !has_dot => self.scan_date_tail(value).unwrap_or(TokenKind::Number(value)),
            Some(c) if c.is_ascii_alphabetic() => {
                let unit = self.scan_word();
                match unit_minutes(unit) {
                    Some(factor) => TokenKind::Duration(value * factor + self.scan_compound()),
                    None => TokenKind::Error(format!("unknown duration unit '{unit}'")),
                }
            }
            _ => TokenKind::Number(value),
        }
    }

    /// Folds following `<number><unit>` parts into the duration just read.
    fn scan_compound(&mut self) -> f64 {
        let mut extra = 0.0;
        loop {
            let checkpoint = self.clone();
            self.skip_whitespace();
            if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                *self = checkpoint;
                return extra;
            }
            let part = self.scan_digits().ok().and_then(|(value, _)| {
                let unit = self.scan_word();
                unit_minutes(unit).map(|factor| value * factor)
            });
            match part {
                Some(minutes) => extra += minutes,
                None => {
                    *self = checkpoint;
                    return extra;
                }
            }
        }
    }

    /// Tries to read `-Mon` after a day number. Leaves the lexer untouched on failure.
    fn scan_date_tail(&mut self, day: f64) -> Option<TokenKind> {
        if !self.peek_char_n(1).is_some_and(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let checkpoint = self.clone();
        self.advance(); // consume '-'
        let word = self.scan_word();
        let parsed = month_number(word).and_then(|month| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let day = day as u32;
            (day >= 1 && day <= days_in_month(month)).then_some(TokenKind::Date { day, month })
        });
        if parsed.is_none() {
            *self = checkpoint;
        }
        parsed
    }

    /// Scans an identifier or keyword.
    fn scan_ident(&mut self) -> TokenKind {
        let name = self.scan_ident_text();
        match name.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Ident(name),
        }
    }

    /// Scans identifier text.
    fn scan_ident_text(&mut self) -> String {
        let start = self.position;
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        self.source[start..self.position].to_string()
    }
}

/// Returns true if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns true if `c` can appear in an identifier (not at start).
fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

/// Minutes per unit for a duration suffix.
fn unit_minutes(unit: &str) -> Option<f64> {
    match unit {
        "m" | "min" | "mins" | "minute" | "minutes" => Some(1.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(60.0),
        _ => None,
    }
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Month number for `Jan`, `january`, `SEP`, `sept` and so on.
fn month_number(word: &str) -> Option<u32> {
    let lower = word.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    let prefix = &lower[..3];
    let index = MONTHS.iter().position(|m| *m == prefix)?;
    let full = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ][index];
    let accepted = full.starts_with(lower.as_str()) || (index == 8 && lower == "sept");
    #[allow(clippy::cast_possible_truncation)]
    accepted.then_some(index as u32 + 1)
}

/// Longest possible month; Feb 29 is accepted and checked against the year later.
const fn days_in_month(month: u32) -> u32 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
