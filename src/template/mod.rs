// Template module for `{{ variable }}` / `{% tag %}` text templates
//
// Source text is lexed into tokens, parsed against a namespace of tag and
// filter handlers into a node tree, and rendered against a scoped context.

mod context;
mod date_format;
mod filter;
mod lexer;
mod namespace;
mod node;
mod parser;
mod render;
mod scanner;
mod split;
mod token;
mod value;
mod variable;

pub use context::{Context, Frame, Scope};
pub use date_format::DateFormatter;
pub use filter::{Filter, SimpleFn, VariadicFn};
pub use lexer::Lexer;
pub use namespace::{Namespace, TagParser};
pub use node::{
    render_nodes, ComparisonOperator, ForNode, IfNode, Node, NowNode, SimpleHandler, SimpleNode,
    TextNode, VariableNode,
};
pub use parser::{until, TokenParser};
pub use render::Template;
pub use scanner::StringScanner;
pub use split::split_respecting_quotes;
pub use token::Token;
pub use value::{Opaque, Value};
pub use variable::{FilterArgument, FilterExpression, FilterInvocation, Resolvable, Variable};
