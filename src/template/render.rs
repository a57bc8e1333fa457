// Template entry point: tokenize once, parse and render on demand

use tracing::debug;

use crate::error::Result;

use super::context::Context;
use super::lexer::Lexer;
use super::namespace::Namespace;
use super::node::{render_nodes, Node};
use super::parser::TokenParser;
use super::token::Token;

/// A tokenized template source.
///
/// Tokens are produced once by [`Template::new`]; every call to
/// [`Template::render`] parses a fresh node tree against the given namespace,
/// so the same template can be rendered with different tag sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    tokens: Vec<Token>,
}

impl Template {
    pub fn new(source: &str) -> Self {
        Self {
            tokens: Lexer::new(source).tokenize(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn compile(&self, namespace: &Namespace) -> Result<Vec<Node>> {
        TokenParser::new(&self.tokens, namespace).parse()
    }

    /// Parse and render. Without a context a fresh one is used; without a
    /// namespace no tags or filters are available.
    pub fn render(&self, context: Option<&mut Context>, namespace: Option<&Namespace>) -> Result<String> {
        let empty = Namespace::new();
        let nodes = self.compile(namespace.unwrap_or(&empty))?;
        debug!(tokens = self.tokens.len(), nodes = nodes.len(), "rendering template");

        match context {
            Some(context) => render_nodes(&nodes, context),
            None => render_nodes(&nodes, &mut Context::new()),
        }
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}
