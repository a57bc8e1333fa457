// Node tree produced by the parser, and the builtin tag nodes

use std::fmt;
use std::sync::Arc;

use chrono::Local;
use tracing::debug;

use crate::error::{Result, TemplateSyntaxError};

use super::context::{Context, Frame};
use super::date_format::DateFormatter;
use super::parser::{until, TokenParser};
use super::token::Token;
use super::value::Value;
use super::variable::{Resolvable, Variable};

const DEFAULT_NOW_FORMAT: &str = "\"yyyy-MM-dd 'at' HH:mm\"";

/// One renderable piece of a compiled template.
#[derive(Debug)]
pub enum Node {
    Text(TextNode),
    Variable(VariableNode),
    Simple(SimpleNode),
    For(ForNode),
    If(IfNode),
    Now(NowNode),
}

impl Node {
    pub fn render(&self, context: &mut Context) -> Result<String> {
        match self {
            Node::Text(node) => Ok(node.text.clone()),
            Node::Variable(node) => node.render(context),
            Node::Simple(node) => (node.handler)(context),
            Node::For(node) => node.render(context),
            Node::If(node) => node.render(context),
            Node::Now(node) => node.render(context),
        }
    }
}

/// Render each node in order and concatenate the output.
pub fn render_nodes(nodes: &[Node], context: &mut Context) -> Result<String> {
    let mut output = String::new();
    for node in nodes {
        output.push_str(&node.render(context)?);
    }
    Ok(output)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    text: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Renders whatever its resolvable produces; null renders as an empty string.
#[derive(Debug)]
pub struct VariableNode {
    variable: Box<dyn Resolvable>,
}

impl VariableNode {
    pub fn new(variable: impl Resolvable + 'static) -> Self {
        Self {
            variable: Box::new(variable),
        }
    }

    pub fn from_path(path: &str) -> Self {
        Self::new(Variable::new(path))
    }

    fn render(&self, context: &Context) -> Result<String> {
        Ok(match self.variable.resolve(context)? {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }
}

pub type SimpleHandler = dyn Fn(&mut Context) -> Result<String> + Send + Sync;

/// A node backed by an arbitrary render callback.
#[derive(Clone)]
pub struct SimpleNode {
    handler: Arc<SimpleHandler>,
}

impl SimpleNode {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut Context) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SimpleNode")
    }
}

/// `{% for item in items limit:N %} ... {% empty %} ... {% endfor %}`
#[derive(Debug)]
pub struct ForNode {
    variable: Variable,
    loop_variable: String,
    nodes: Vec<Node>,
    empty_nodes: Vec<Node>,
    limit: Option<usize>,
}

impl ForNode {
    pub fn parse(parser: &mut TokenParser<'_>, token: &Token) -> Result<Node> {
        let components = token.components();

        let well_formed = components.get(2).is_some_and(|c| c == "in")
            && (components.len() == 4
                || (components.len() == 5 && components[4].starts_with("limit")));
        if !well_formed {
            return Err(TemplateSyntaxError::new(format!(
                "'for' statements should use the following 'for x in y (limit: n)' `{}`.",
                token.contents()
            )));
        }

        let loop_variable = components[1].clone();
        let variable = Variable::new(components[3].as_str());
        let limit = components.get(4).and_then(|bit| parse_limit(bit));

        let nodes = parser.parse_until(&until(&["endfor", "empty"]))?;
        let Some(terminator) = parser.next_token() else {
            return Err(TemplateSyntaxError::new("`endfor` was not found."));
        };

        let mut empty_nodes = Vec::new();
        if terminator.tag_name().as_deref() == Some("empty") {
            empty_nodes = parser.parse_until(&until(&["endfor"]))?;
            if parser.next_token().is_none() {
                return Err(TemplateSyntaxError::new("`endfor` was not found."));
            }
        }

        Ok(Node::For(ForNode {
            variable,
            loop_variable,
            nodes,
            empty_nodes,
            limit,
        }))
    }

    pub fn loop_variable(&self) -> &str {
        &self.loop_variable
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn render(&self, context: &mut Context) -> Result<String> {
        let items = match self.variable.resolve(context)? {
            Value::Array(items) if !items.is_empty() => items,
            _ => {
                let mut scope = context.scope(None);
                return render_nodes(&self.empty_nodes, &mut scope);
            }
        };

        let count = self.limit.map_or(items.len(), |limit| limit.min(items.len()));
        debug!(
            variable = %self.variable,
            count,
            total = items.len(),
            "rendering for loop"
        );

        let mut output = String::new();
        for item in items.into_iter().take(count) {
            let mut frame = Frame::new();
            frame.insert(self.loop_variable.clone(), item);
            let mut scope = context.scope(Some(frame));
            output.push_str(&render_nodes(&self.nodes, &mut scope)?);
        }
        Ok(output)
    }
}

/// `limit:N`; anything unparsable means no limit.
fn parse_limit(bit: &str) -> Option<usize> {
    let (_, value) = bit.split_once(':')?;
    value.trim().parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equality,
}

impl ComparisonOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(ComparisonOperator::Equality),
            _ => None,
        }
    }
}

/// `{% if value %}`, `{% if left == right %}` and `{% ifnot value %}`.
#[derive(Debug)]
pub struct IfNode {
    left: Variable,
    comparison: Option<(ComparisonOperator, Variable)>,
    true_nodes: Vec<Node>,
    false_nodes: Vec<Node>,
}

impl IfNode {
    pub fn parse(parser: &mut TokenParser<'_>, token: &Token) -> Result<Node> {
        let components = token.components();
        if components.len() != 2 && components.len() != 4 {
            return Err(TemplateSyntaxError::new(format!(
                "'if' statements should use the following 'if value (== otherValue)', not: '{}'.",
                token.contents()
            )));
        }

        let left = Variable::new(components[1].as_str());
        let comparison = match components.get(2..4) {
            Some([symbol, right]) => match ComparisonOperator::from_symbol(symbol) {
                Some(operator) => Some((operator, Variable::new(right.as_str()))),
                None => {
                    return Err(TemplateSyntaxError::new(format!(
                        "{} comparison operator is not (currently) supported.",
                        symbol
                    )))
                }
            },
            _ => None,
        };

        let (true_nodes, false_nodes) = parse_branches(parser)?;
        Ok(Node::If(IfNode {
            left,
            comparison,
            true_nodes,
            false_nodes,
        }))
    }

    pub fn parse_ifnot(parser: &mut TokenParser<'_>, token: &Token) -> Result<Node> {
        let components = token.components();
        if components.len() != 2 {
            return Err(TemplateSyntaxError::new(format!(
                "'ifnot' statements should use the following 'ifnot condition' `{}`.",
                token.contents()
            )));
        }

        let (false_nodes, true_nodes) = parse_branches(parser)?;
        Ok(Node::If(IfNode {
            left: Variable::new(components[1].as_str()),
            comparison: None,
            true_nodes,
            false_nodes,
        }))
    }

    fn is_truthy(&self, context: &Context) -> Result<bool> {
        let left = self.left.resolve(context)?;
        match &self.comparison {
            Some((ComparisonOperator::Equality, right)) => {
                Ok(left.template_eq(&right.resolve(context)?))
            }
            None => Ok(left.is_truthy()),
        }
    }

    fn render(&self, context: &mut Context) -> Result<String> {
        let mut scope = context.scope(None);
        if self.is_truthy(&scope)? {
            render_nodes(&self.true_nodes, &mut scope)
        } else {
            render_nodes(&self.false_nodes, &mut scope)
        }
    }
}

/// Parse `... {% else %} ... {% endif %}`, returning the (before, after) `else` bodies.
fn parse_branches(parser: &mut TokenParser<'_>) -> Result<(Vec<Node>, Vec<Node>)> {
    let first = parser.parse_until(&until(&["endif", "else"]))?;
    let Some(terminator) = parser.next_token() else {
        return Err(TemplateSyntaxError::new("`endif` was not found."));
    };

    let mut second = Vec::new();
    if terminator.tag_name().as_deref() == Some("else") {
        second = parser.parse_until(&until(&["endif"]))?;
        if parser.next_token().is_none() {
            return Err(TemplateSyntaxError::new("`endif` was not found."));
        }
    }
    Ok((first, second))
}

/// `{% now %}` or `{% now "HH:mm" %}`
#[derive(Debug)]
pub struct NowNode {
    format: Variable,
}

impl NowNode {
    pub fn new(format: Option<Variable>) -> Self {
        Self {
            format: format.unwrap_or_else(|| Variable::new(DEFAULT_NOW_FORMAT)),
        }
    }

    pub fn parse(_parser: &mut TokenParser<'_>, token: &Token) -> Result<Node> {
        let components = token.components();
        if components.len() > 2 {
            return Err(TemplateSyntaxError::new(format!(
                "'now' tags may only have one argument: the format string `{}`.",
                token.contents()
            )));
        }
        let format = components.get(1).map(|format| Variable::new(format.as_str()));
        Ok(Node::Now(NowNode::new(format)))
    }

    fn render(&self, context: &Context) -> Result<String> {
        let format = self.format.resolve(context)?;
        let now = Local::now();

        if let Some(formatter) = format.downcast_opaque::<DateFormatter>() {
            return formatter.format(&now);
        }
        match format {
            Value::String(pattern) => DateFormatter::new(pattern).format(&now),
            _ => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::lexer::Lexer;
    use crate::template::namespace::Namespace;
    use crate::template::value::Opaque;

    fn compile(src: &str) -> Result<Vec<Node>> {
        let tokens = Lexer::new(src).tokenize();
        let namespace = Namespace::builtin();
        TokenParser::new(&tokens, &namespace).parse()
    }

    fn render(src: &str, context: &mut Context) -> Result<String> {
        render_nodes(&compile(src)?, context)
    }

    fn context_with(key: &str, value: impl Into<Value>) -> Context {
        let mut context = Context::new();
        context.set(key, value);
        context
    }

    #[test]
    fn test_text_node() {
        let node = Node::Text(TextNode::new("Hello World"));
        assert_eq!(node.render(&mut Context::new()).unwrap(), "Hello World");
    }

    #[test]
    fn test_variable_node() {
        let mut context = context_with("name", "Kyle");
        let node = Node::Variable(VariableNode::from_path("name"));
        assert_eq!(node.render(&mut context).unwrap(), "Kyle");

        let node = Node::Variable(VariableNode::from_path("age"));
        assert_eq!(node.render(&mut context).unwrap(), "");
    }

    #[test]
    fn test_variable_node_renders_non_strings() {
        let mut context = context_with("count", 3);
        assert_eq!(render("{{ count }}", &mut context).unwrap(), "3");
    }

    #[test]
    fn test_simple_node() {
        let node = Node::Simple(SimpleNode::new(|context| {
            context.set("seen", true);
            Ok("simple".to_string())
        }));
        let mut context = Context::new();
        assert_eq!(node.render(&mut context).unwrap(), "simple");
        assert_eq!(context.get("seen"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_render_nodes_propagates_errors() {
        let nodes = vec![
            Node::Text(TextNode::new("Hello ")),
            Node::Simple(SimpleNode::new(|_| Err(TemplateSyntaxError::new("boom")))),
        ];
        let err = render_nodes(&nodes, &mut Context::new()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_for_renders_each_item() {
        let mut context = context_with("items", vec![1, 2, 3]);
        let output = render("{% for item in items %}{{ item }}{% endfor %}", &mut context).unwrap();
        assert_eq!(output, "123");
        assert_eq!(context.depth(), 1);
        assert_eq!(context.get("item"), None);
    }

    #[test]
    fn test_for_limit() {
        let mut context = context_with("items", vec![1, 2, 3, 4]);
        let output =
            render("{% for item in items limit:2 %}[{{ item }}]{% endfor %}", &mut context).unwrap();
        assert_eq!(output, "[1][2]");
    }

    #[test]
    fn test_for_limit_larger_than_items() {
        let mut context = context_with("items", vec![1, 2]);
        let output = render("{% for i in items limit:5 %}{{ i }}{% endfor %}", &mut context).unwrap();
        assert_eq!(output, "12");
    }

    #[test]
    fn test_for_unparsable_limit_is_ignored() {
        let mut context = context_with("items", vec![1, 2, 3]);
        let output = render("{% for i in items limit:x %}{{ i }}{% endfor %}", &mut context).unwrap();
        assert_eq!(output, "123");
    }

    #[test]
    fn test_for_empty_branch() {
        let mut context = context_with("items", Value::Array(vec![]));
        let src = "{% for item in items %}{{ item }}{% empty %}nothing{% endfor %}";
        assert_eq!(render(src, &mut context).unwrap(), "nothing");
        assert_eq!(render(src, &mut Context::new()).unwrap(), "nothing");
        assert_eq!(render(src, &mut context_with("items", "text")).unwrap(), "nothing");
    }

    #[test]
    fn test_for_without_empty_branch_renders_nothing() {
        let src = "a{% for item in items %}{{ item }}{% endfor %}b";
        assert_eq!(render(src, &mut Context::new()).unwrap(), "ab");
    }

    #[test]
    fn test_for_grammar_errors() {
        for src in [
            "{% for %}{% endfor %}",
            "{% for item %}{% endfor %}",
            "{% for item of items %}{% endfor %}",
            "{% for item in items extra %}{% endfor %}",
        ] {
            let err = compile(src).unwrap_err();
            assert!(
                err.to_string().starts_with("'for' statements should use the following"),
                "{}: {}",
                src,
                err
            );
        }
    }

    #[test]
    fn test_for_parse_records_loop_shape() {
        let nodes = compile("{% for item in items limit:3 %}{% endfor %}").unwrap();
        match &nodes[0] {
            Node::For(node) => {
                assert_eq!(node.loop_variable(), "item");
                assert_eq!(node.limit(), Some(3));
            }
            other => panic!("Expected for node, got {:?}", other),
        }

        let nodes = compile("{% for row in rows %}{% endfor %}").unwrap();
        match &nodes[0] {
            Node::For(node) => {
                assert_eq!(node.loop_variable(), "row");
                assert_eq!(node.limit(), None);
            }
            other => panic!("Expected for node, got {:?}", other),
        }
    }

    #[test]
    fn test_for_limit_must_be_one_component() {
        let err = compile("{% for x in xs limit: 2 %}{% endfor %}").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("'for' statements should use the following 'for x in y (limit: n)'"));
        assert!(err.to_string().contains("limit: 2"));
    }

    #[test]
    fn test_for_missing_endfor() {
        let err = compile("{% for item in items %}{{ item }}").unwrap_err();
        assert_eq!(err.to_string(), "`endfor` was not found.");

        let err = compile("{% for item in items %}{% empty %}none").unwrap_err();
        assert_eq!(err.to_string(), "`endfor` was not found.");
    }

    #[test]
    fn test_nested_for_shadows_outer_binding() {
        let mut context = Context::new();
        context.set("rows", vec![vec!["a", "b"], vec!["c"]]);
        let src = "{% for row in rows %}({% for row in row %}{{ row }}{% endfor %}){% endfor %}";
        assert_eq!(render(src, &mut context).unwrap(), "(ab)(c)");
    }

    #[test]
    fn test_for_pops_scope_on_error() {
        let mut context = context_with("items", vec![1]);
        let err = render(
            "{% for item in items %}{{ item|missing }}{% endfor %}",
            &mut context,
        );
        assert!(err.is_err());

        let mut namespace = Namespace::builtin();
        namespace.register_simple_filter("fail", |_| Err(TemplateSyntaxError::new("failed")));
        let tokens = Lexer::new("{% for item in items %}{{ item|fail }}{% endfor %}").tokenize();
        let nodes = TokenParser::new(&tokens, &namespace).parse().unwrap();
        assert!(render_nodes(&nodes, &mut context).is_err());
        assert_eq!(context.depth(), 1);
    }

    #[test]
    fn test_if_truthy() {
        let src = "{% if value %}true{% else %}false{% endif %}";
        assert_eq!(render(src, &mut context_with("value", "x")).unwrap(), "true");
        assert_eq!(render(src, &mut context_with("value", "")).unwrap(), "false");
        assert_eq!(render(src, &mut context_with("value", 0)).unwrap(), "false");
        assert_eq!(render(src, &mut context_with("value", 1.5)).unwrap(), "true");
        assert_eq!(render(src, &mut Context::new()).unwrap(), "false");
    }

    #[test]
    fn test_if_without_else() {
        let src = "{% if value %}shown{% endif %}";
        assert_eq!(render(src, &mut context_with("value", true)).unwrap(), "shown");
        assert_eq!(render(src, &mut context_with("value", false)).unwrap(), "");
    }

    #[test]
    fn test_if_equality() {
        let src = "{% if left == right %}equal{% else %}different{% endif %}";

        let mut context = Context::new();
        context.set("left", "a");
        context.set("right", "a");
        assert_eq!(render(src, &mut context).unwrap(), "equal");

        context.set("right", "b");
        assert_eq!(render(src, &mut context).unwrap(), "different");

        let mut context = Context::new();
        context.set("left", 1);
        context.set("right", 1.0);
        assert_eq!(render(src, &mut context).unwrap(), "different");

        assert_eq!(render(src, &mut Context::new()).unwrap(), "equal");
    }

    #[test]
    fn test_if_equality_with_literal() {
        let src = "{% if name == \"Kyle\" %}hi Kyle{% endif %}";
        assert_eq!(render(src, &mut context_with("name", "Kyle")).unwrap(), "hi Kyle");
    }

    #[test]
    fn test_if_unsupported_operator() {
        let err = compile("{% if a != b %}{% endif %}").unwrap_err();
        assert_eq!(err.to_string(), "!= comparison operator is not (currently) supported.");
    }

    #[test]
    fn test_if_wrong_argument_count() {
        let err = compile("{% if a b %}{% endif %}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'if' statements should use the following 'if value (== otherValue)', not: 'if a b'."
        );
    }

    #[test]
    fn test_if_missing_endif() {
        let err = compile("{% if value %}true").unwrap_err();
        assert_eq!(err.to_string(), "`endif` was not found.");
        let err = compile("{% if value %}true{% else %}false").unwrap_err();
        assert_eq!(err.to_string(), "`endif` was not found.");
    }

    #[test]
    fn test_ifnot() {
        let src = "{% ifnot value %}missing{% else %}present{% endif %}";
        assert_eq!(render(src, &mut Context::new()).unwrap(), "missing");
        assert_eq!(render(src, &mut context_with("value", "x")).unwrap(), "present");

        let err = compile("{% ifnot %}{% endif %}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'ifnot' statements should use the following 'ifnot condition' `ifnot`."
        );
    }

    #[test]
    fn test_if_pushes_and_pops_scope() {
        let node = Node::If(IfNode {
            left: Variable::new("value"),
            comparison: None,
            true_nodes: vec![Node::Simple(SimpleNode::new(|context| {
                Ok(context.depth().to_string())
            }))],
            false_nodes: Vec::new(),
        });
        let mut context = context_with("value", true);
        assert_eq!(node.render(&mut context).unwrap(), "2");
        assert_eq!(context.depth(), 1);
    }

    #[test]
    fn test_now_argument_count() {
        let err = compile("{% now \"HH\" extra %}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'now' tags may only have one argument: the format string `now \"HH\" extra`."
        );
    }

    #[test]
    fn test_now_with_string_format() {
        let output = render("{% now \"yyyy\" %}", &mut Context::new()).unwrap();
        assert_eq!(output, Local::now().format("%Y").to_string());
    }

    #[test]
    fn test_now_default_format() {
        let output = render("{% now %}", &mut Context::new()).unwrap();
        assert_eq!(output.len(), "2016-03-05 at 14:07".len());
        assert!(output.contains(" at "));
    }

    #[test]
    fn test_now_with_formatter_from_context() {
        let mut context = context_with("fmt", Opaque::new(DateFormatter::new("'fixed'")));
        assert_eq!(render("{% now fmt %}", &mut context).unwrap(), "fixed");
    }

    #[test]
    fn test_now_with_unusable_format() {
        let mut context = context_with("fmt", 5);
        assert_eq!(render("{% now fmt %}", &mut context).unwrap(), "");
        assert_eq!(render("{% now missing %}", &mut Context::new()).unwrap(), "");
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("limit:2"), Some(2));
        assert_eq!(parse_limit("limit: 3"), Some(3));
        assert_eq!(parse_limit("limit"), None);
        assert_eq!(parse_limit("limit:-1"), None);
    }
}
