//! Parse facade over the tokenizer.

use super::token::{FunctionCall, Token};
use super::tokenizer::tokenize;

/// Result of parsing one script text.
#[derive(Debug, Clone, Default)]
pub struct ParsedScript {
    token: Option<Token>,
    variables: Vec<String>,
}

impl ParsedScript {
    /// Root `Group` token, `None` for empty input.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Distinct variable names referenced anywhere in the script.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Every function call, outer calls before the ones nested in them.
    pub fn functions(&self) -> Vec<FunctionCall> {
        self.token.as_ref().map(Token::functions).unwrap_or_default()
    }

    pub fn into_token(self) -> Option<Token> {
        self.token
    }
}

/// Tokenizes text and collects the names it references.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    pub fn parse(text: &str) -> ParsedScript {
        let token = tokenize(text);
        let variables = token.as_ref().map(Token::variables).unwrap_or_default();
        ParsedScript { token, variables }
    }
}
