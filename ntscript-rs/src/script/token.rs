//! Token tree produced by the tokenizer.

/// Kind of a [`Token`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Ordered sequence of child tokens (a whole script or one parameter).
    Group,
    /// Literal text.
    Text,
    /// `$name` or `$name.path`.
    Variable,
    /// `#name(params…)`; each child is a `Group` holding one parameter.
    Function,
}

/// An immutable token tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    name: Option<String>,
    content: String,
    children: Vec<Token>,
}

/// One function call found in a token tree, see [`Token::functions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    /// Full matched source, including a trailing `;` when present.
    pub matched: String,
    pub params: Vec<String>,
}

impl Token {
    pub fn text(content: impl Into<String>) -> Self {
        Token {
            kind: TokenKind::Text,
            name: None,
            content: content.into(),
            children: Vec::new(),
        }
    }

    /// A variable reference; its content is the placeholder `$name`.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Token {
            kind: TokenKind::Variable,
            content: format!("${name}"),
            name: Some(name),
            children: Vec::new(),
        }
    }

    pub fn function(name: impl Into<String>, matched: impl Into<String>, params: Vec<Token>) -> Self {
        Token {
            kind: TokenKind::Function,
            name: Some(name.into()),
            content: matched.into(),
            children: params,
        }
    }

    /// A group; its content is the concatenated content of `children`.
    pub fn group(children: Vec<Token>) -> Self {
        Token {
            kind: TokenKind::Group,
            name: None,
            content: children.iter().map(|c| c.content.as_str()).collect(),
            children,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Literal text, matched source, or flattened text for a group.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn children(&self) -> &[Token] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Flattened text of each parameter (quotes excluded).
    pub fn params(&self) -> Vec<String> {
        self.children.iter().map(|c| c.content.clone()).collect()
    }

    /// Distinct variable names in first-seen order, depth first.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<String>) {
        if let (TokenKind::Variable, Some(name)) = (self.kind, &self.name) {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        for child in &self.children {
            child.collect_vars(out);
        }
    }

    /// Every function call in pre-order (outer calls before nested ones).
    pub fn functions(&self) -> Vec<FunctionCall> {
        let mut out = Vec::new();
        self.collect_functions(&mut out);
        out
    }

    fn collect_functions(&self, out: &mut Vec<FunctionCall>) {
        if let (TokenKind::Function, Some(name)) = (self.kind, &self.name) {
            out.push(FunctionCall {
                name: name.clone(),
                matched: self.content.clone(),
                params: self.params(),
            });
        }
        for child in &self.children {
            child.collect_functions(out);
        }
    }
}
