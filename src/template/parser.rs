// Token parser: turns the lexer's token stream into a node tree

use tracing::trace;

use crate::error::{Result, TemplateSyntaxError};

use super::filter::Filter;
use super::namespace::Namespace;
use super::node::{Node, TextNode, VariableNode};
use super::token::Token;
use super::variable::FilterExpression;

/// Build a stop predicate matching a block whose tag name is one of `tags`.
pub fn until(tags: &[&str]) -> impl Fn(&Token) -> bool {
    let tags: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
    move |token| {
        token.is_block()
            && token
                .tag_name()
                .is_some_and(|name| tags.iter().any(|tag| *tag == name))
    }
}

/// Walks a token buffer front to back.
///
/// Tag handlers receive the parser itself so they can parse their own bodies
/// with [`TokenParser::parse_until`] and then take the terminating token with
/// [`TokenParser::next_token`].
pub struct TokenParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    namespace: &'a Namespace,
}

impl<'a> TokenParser<'a> {
    pub fn new(tokens: &'a [Token], namespace: &'a Namespace) -> Self {
        Self {
            tokens,
            pos: 0,
            namespace,
        }
    }

    pub fn namespace(&self) -> &'a Namespace {
        self.namespace
    }

    /// Parse every remaining token.
    pub fn parse(&mut self) -> Result<Vec<Node>> {
        self.parse_nodes(None)
    }

    /// Parse until a block token satisfies `stop`; that token is left unconsumed.
    pub fn parse_until(&mut self, stop: &dyn Fn(&Token) -> bool) -> Result<Vec<Node>> {
        self.parse_nodes(Some(stop))
    }

    fn parse_nodes(&mut self, stop: Option<&dyn Fn(&Token) -> bool>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        while let Some(token) = self.next_token() {
            match token {
                Token::Text(text) => nodes.push(Node::Text(TextNode::new(text.as_str()))),
                Token::Variable(contents) => {
                    let expression = self.compile_filter(contents)?;
                    nodes.push(Node::Variable(VariableNode::new(expression)));
                }
                Token::Comment(_) => {}
                Token::Block(contents) => {
                    if stop.is_some_and(|stop| stop(token)) {
                        self.push_back();
                        return Ok(nodes);
                    }

                    let Some(tag) = token.tag_name() else {
                        trace!("skipping empty block tag");
                        continue;
                    };
                    let namespace = self.namespace;
                    let Some(tag_parser) = namespace.tag(&tag) else {
                        return Err(TemplateSyntaxError::new(format!(
                            "Unknown template tag '{}'",
                            tag
                        )));
                    };

                    trace!(tag = %tag, contents = %contents, "parsing block tag");
                    nodes.push(tag_parser(&mut *self, token)?);
                }
            }
        }

        Ok(nodes)
    }

    /// Take the next token off the front of the stream.
    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Return the most recently taken token to the front of the stream.
    pub fn push_back(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn find_filter(&self, name: &str) -> Result<Filter> {
        self.namespace
            .filter(name)
            .cloned()
            .ok_or_else(|| TemplateSyntaxError::new(format!("Invalid filter '{}'", name)))
    }

    pub fn compile_filter(&self, token: &str) -> Result<FilterExpression> {
        FilterExpression::new(token, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::context::Context;
    use crate::template::lexer::Lexer;
    use crate::template::node::render_nodes;
    use crate::template::value::Value;

    fn parse_with(src: &str, namespace: &Namespace) -> Result<Vec<Node>> {
        let tokens = Lexer::new(src).tokenize();
        TokenParser::new(&tokens, namespace).parse()
    }

    #[test]
    fn test_parse_text_token() {
        let nodes = parse_with("Hello World", &Namespace::new()).unwrap();
        assert_eq!(nodes.len(), 1);
        match &nodes[0] {
            Node::Text(node) => assert_eq!(node.text(), "Hello World"),
            other => panic!("Expected text node, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_variable_token() {
        let nodes = parse_with("{{ name }}", &Namespace::new()).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(matches!(nodes[0], Node::Variable(_)));
    }

    #[test]
    fn test_comments_are_dropped() {
        let nodes = parse_with("{# Comment #}", &Namespace::new()).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_empty_block_is_skipped() {
        let nodes = parse_with("a{%   %}b", &Namespace::new()).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_registered_tag_is_invoked() {
        let mut namespace = Namespace::new();
        namespace.register_tag("known", |_, token| {
            Ok(Node::Text(TextNode::new(format!("<{}>", token.contents()))))
        });

        let nodes = parse_with("{% known a b %}", &namespace).unwrap();
        let output = render_nodes(&nodes, &mut Context::new()).unwrap();
        assert_eq!(output, "<known a b>");
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let err = parse_with("{% unknown %}", &Namespace::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown template tag 'unknown'");
    }

    #[test]
    fn test_unknown_filter_is_an_error() {
        let err = parse_with("{{ name|nope }}", &Namespace::new()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid filter 'nope'");
    }

    #[test]
    fn test_empty_variable_tag_is_an_error() {
        let err = parse_with("{{  }}", &Namespace::new()).unwrap_err();
        assert_eq!(err.to_string(), "Variable tags must include at least 1 argument");
    }

    #[test]
    fn test_parse_until_leaves_stop_token() {
        let tokens = Lexer::new("a{% end %}b").tokenize();
        let namespace = Namespace::new();
        let mut parser = TokenParser::new(&tokens, &namespace);

        let nodes = parser.parse_until(&until(&["end"])).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(parser.next_token(), Some(&Token::Block("end".into())));
        assert_eq!(parser.next_token(), Some(&Token::Text("b".into())));
        assert!(parser.is_at_end());
    }

    #[test]
    fn test_tag_handlers_see_the_namespace() {
        let mut namespace = Namespace::new();
        namespace.register_tag("filters", |parser, _| {
            let has_upper = parser.namespace().filter("upper").is_some();
            Ok(Node::Text(TextNode::new(has_upper.to_string())))
        });
        namespace.register_simple_filter("upper", Ok);

        let nodes = parse_with("{% filters %}", &namespace).unwrap();
        let output = render_nodes(&nodes, &mut Context::new()).unwrap();
        assert_eq!(output, "true");
    }

    #[test]
    fn test_until_matches_tag_name_only() {
        let stop = until(&["endfor", "empty"]);
        assert!(stop(&Token::Block("endfor".into())));
        assert!(stop(&Token::Block("empty extra".into())));
        assert!(!stop(&Token::Block("for x in y".into())));
        assert!(!stop(&Token::Text("endfor".into())));
    }

    #[test]
    fn test_filters_resolve_from_namespace() {
        let mut namespace = Namespace::new();
        namespace.register_simple_filter("shout", |value| {
            Ok(Value::from(format!("{}!", value)))
        });
        let nodes = parse_with("{{ 'hi'|shout|shout }}", &namespace).unwrap();
        let output = render_nodes(&nodes, &mut Context::new()).unwrap();
        assert_eq!(output, "hi!!");
    }
}
