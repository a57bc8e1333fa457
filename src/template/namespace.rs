// Tag and filter tables consulted by the parser

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

use super::filter::{self, Filter};
use super::node::{ForNode, IfNode, Node, NowNode, TextNode};
use super::parser::TokenParser;
use super::token::Token;
use super::value::Value;

/// Parses one block tag (and whatever body it owns) into a node.
pub type TagParser = dyn Fn(&mut TokenParser<'_>, &Token) -> Result<Node> + Send + Sync;

/// Lookup tables for `{% tag %}` handlers and `|filter` functions.
///
/// `Namespace::new()` starts empty; `Namespace::builtin()` carries the stock
/// tags (`for`, `if`, `ifnot`, `now`, `raw`) and filters.
#[derive(Clone, Default)]
pub struct Namespace {
    tags: HashMap<String, Arc<TagParser>>,
    filters: HashMap<String, Filter>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut namespace = Self::new();

        namespace.register_tag("for", ForNode::parse);
        namespace.register_tag("if", IfNode::parse);
        namespace.register_tag("ifnot", IfNode::parse_ifnot);
        namespace.register_tag("now", NowNode::parse);
        // the lexer already turned the raw body into text tokens
        namespace.register_tag("raw", |_, _| Ok(Node::Text(TextNode::new(""))));

        namespace.register_simple_filter("capitalize", filter::capitalize);
        namespace.register_simple_filter("uppercase", filter::uppercase);
        namespace.register_simple_filter("lowercase", filter::lowercase);
        namespace.register_simple_filter("urlencode", filter::urlencode);
        namespace.register_variadic_filter("join", filter::join);
        namespace.register_variadic_filter("default", filter::default);

        namespace
    }

    pub fn register_tag<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(&mut TokenParser<'_>, &Token) -> Result<Node> + Send + Sync + 'static,
    {
        self.tags.insert(name.into(), Arc::new(parser));
    }

    pub fn register_filter(&mut self, name: impl Into<String>, filter: Filter) {
        self.filters.insert(name.into(), filter);
    }

    pub fn register_simple_filter<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_filter(name, Filter::simple(function));
    }

    pub fn register_variadic_filter<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(Value, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_filter(name, Filter::variadic(function));
    }

    pub fn tag(&self, name: &str) -> Option<&Arc<TagParser>> {
        self.tags.get(name)
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.tags.keys().collect();
        tags.sort();
        let mut filters: Vec<&String> = self.filters.keys().collect();
        filters.sort();
        f.debug_struct("Namespace")
            .field("tags", &tags)
            .field("filters", &filters)
            .finish()
    }
}
