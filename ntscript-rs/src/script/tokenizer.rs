//! Template tokenizer.
//!
//! Turns raw text into a [`Token`] tree.  Recognised sequences:
//!
//! | Sequence              | Token                                             |
//! |-----------------------|---------------------------------------------------|
//! | `$name`, `$a.b.c`     | Variable (`.` only between identifier segments)   |
//! | `#name(p1, p2, …)`    | Function; an optional trailing `;` is swallowed   |
//! | `'…'` / `"…"`         | Quoted parameter; markers inside still tokenize   |
//! | anything else         | Text                                              |
//!
//! Tokenizing never fails: a `#name` without `(`, or a call whose parameter
//! list never closes, degrades to Text carrying the original characters.

use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use super::cursor::Cursor;
use super::token::Token;

pub const FUNCTION_IDENTIFIER: char = '#';
pub const FUNCTION_PARAM_START: char = '(';
pub const FUNCTION_PARAM_END: char = ')';
pub const VARIABLE_IDENTIFIER: char = '$';
pub const VARIABLE_SEPARATOR: char = '.';
pub const PARAM_SEPARATOR: char = ',';
pub const PARAM_QUOTE: char = '"';
pub const PARAM_QUOTE_SINGLE: char = '\'';
pub const STATEMENT_DELIMITER: char = ';';
const ESCAPE: char = '\\';

/// Tokenize `src` into a `Group` token.  Returns `None` only for empty input.
pub fn tokenize(src: &str) -> Option<Token> {
    if src.is_empty() {
        return None;
    }
    trace!("tokenize '{src}'");
    let mut tokenizer = Tokenizer {
        cursor: Cursor::new(src),
    };
    let children = tokenizer.read_sequence(Mode::Script, 0);
    Some(Token::group(children))
}

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

/// Whether `name` is a valid function or variable-segment name.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Top level: only end of input stops the sequence.
    Script,
    /// Inside `(…)`: stops at `,`/`)` on depth 0, or at the closing quote.
    Param { quote: Option<char> },
}

struct Tokenizer {
    cursor: Cursor,
}

impl Tokenizer {
    /// Read tokens until end of input or the mode's stop character.
    /// `level` is the parameter nesting level (for tracing only).
    fn read_sequence(&mut self, mode: Mode, level: usize) -> Vec<Token> {
        let mut tokens = Vec::new();
        // Bare `(` … `)` pairs inside unquoted parameter text.
        let mut depth = 0usize;
        while let Some(c) = self.cursor.peek() {
            if self.at_stop(mode, depth) {
                trace!("{level:>2}> sequence stops at '{c}'");
                break;
            }
            let token = match c {
                VARIABLE_IDENTIFIER => self.read_variable(),
                FUNCTION_IDENTIFIER => self.read_function(level),
                _ => self.read_text(mode, &mut depth),
            };
            tokens.push(token);
        }
        tokens
    }

    fn at_stop(&self, mode: Mode, depth: usize) -> bool {
        match (mode, self.cursor.peek()) {
            (Mode::Script, _) | (_, None) => false,
            (Mode::Param { quote: Some(q) }, Some(c)) => c == q,
            (Mode::Param { quote: None }, Some(c)) => {
                depth == 0 && (c == PARAM_SEPARATOR || c == FUNCTION_PARAM_END)
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.cursor.peek().filter(|c| is_ident_continue(*c)) {
            ident.push(c);
            self.cursor.advance();
        }
        ident
    }

    fn read_variable(&mut self) -> Token {
        self.cursor.advance(); // '$'
        if !self.cursor.peek().is_some_and(is_ident_start) {
            return Token::text(VARIABLE_IDENTIFIER.to_string());
        }
        let mut name = self.read_ident();
        // A '.' belongs to the path only when another segment follows it.
        while self.cursor.peek() == Some(VARIABLE_SEPARATOR)
            && self.cursor.peek_at(1).is_some_and(is_ident_start)
        {
            self.cursor.advance();
            name.push(VARIABLE_SEPARATOR);
            name.push_str(&self.read_ident());
        }
        trace!("got variable '${name}'");
        Token::variable(name)
    }

    fn read_function(&mut self, level: usize) -> Token {
        let start = self.cursor.pos();
        self.cursor.advance(); // '#'
        if !self.cursor.peek().is_some_and(is_ident_start) {
            return Token::text(FUNCTION_IDENTIFIER.to_string());
        }
        let name = self.read_ident();
        if !self.cursor.eat(FUNCTION_PARAM_START) {
            return Token::text(format!("{FUNCTION_IDENTIFIER}{name}"));
        }
        match self.read_params(level + 1) {
            Some(params) => {
                self.cursor.eat(STATEMENT_DELIMITER);
                let matched = self.cursor.slice(start, self.cursor.pos());
                trace!("{level:>2}> got function '{matched}'");
                Token::function(name, matched, params)
            }
            None => {
                let text = self.cursor.slice(start, self.cursor.pos());
                trace!("{level:>2}> function '{name}' degraded to text '{text}'");
                Token::text(text)
            }
        }
    }

    /// Read parameters after `(` up to and including `)`.
    /// `None` when the list never closes properly.
    fn read_params(&mut self, level: usize) -> Option<Vec<Token>> {
        let mut params = Vec::new();
        loop {
            if !self.cursor.skip_whitespace() {
                return None;
            }
            if self.cursor.eat(FUNCTION_PARAM_END) {
                return Some(params);
            }
            params.push(self.read_param(level)?);
            if !self.cursor.skip_whitespace() {
                return None;
            }
            if self.cursor.eat(FUNCTION_PARAM_END) {
                return Some(params);
            }
            if !self.cursor.eat(PARAM_SEPARATOR) {
                trace!("{level:>2}> unexpected '{}' after parameter", self.cursor.remain());
                return None;
            }
        }
    }

    fn read_param(&mut self, level: usize) -> Option<Token> {
        let quote = match self.cursor.peek() {
            Some(q @ (PARAM_QUOTE | PARAM_QUOTE_SINGLE)) => {
                self.cursor.advance();
                Some(q)
            }
            _ => None,
        };
        let mut tokens = self.read_sequence(Mode::Param { quote }, level);
        if let Some(q) = quote {
            if !self.cursor.eat(q) {
                return None;
            }
            if tokens.is_empty() {
                tokens.push(Token::text(""));
            }
        }
        Some(Token::group(tokens))
    }

    fn read_text(&mut self, mode: Mode, depth: &mut usize) -> Token {
        let mut text = String::new();
        while let Some(c) = self.cursor.peek() {
            if c == VARIABLE_IDENTIFIER || c == FUNCTION_IDENTIFIER {
                break;
            }
            match mode {
                Mode::Script => {}
                Mode::Param { quote: Some(q) } => {
                    if c == q {
                        break;
                    }
                    if c == ESCAPE && matches!(self.cursor.peek_at(1), Some(n) if n == q || n == ESCAPE) {
                        self.cursor.advance();
                    }
                }
                Mode::Param { quote: None } => match c {
                    ESCAPE if matches!(
                        self.cursor.peek_at(1),
                        Some(PARAM_SEPARATOR | FUNCTION_PARAM_START | FUNCTION_PARAM_END | ESCAPE)
                    ) =>
                    {
                        self.cursor.advance();
                    }
                    FUNCTION_PARAM_START => *depth += 1,
                    FUNCTION_PARAM_END if *depth == 0 => break,
                    FUNCTION_PARAM_END => *depth -= 1,
                    PARAM_SEPARATOR if *depth == 0 => break,
                    _ => {}
                },
            }
            if let Some(ch) = self.cursor.advance() {
                text.push(ch);
            }
        }
        Token::text(text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
