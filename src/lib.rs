// Stencil: text templates with `{{ variables }}`, `{% tags %}` and `{# comments #}`

pub mod config;
pub mod error;
pub mod template;

pub use error::{Result, TemplateSyntaxError};
pub use template::{
    Context, DateFormatter, Filter, Namespace, Node, Template, Token, TokenParser, Value, Variable,
};

/// Render `source` against `context` using the builtin tags and filters.
pub fn render_str(source: &str, context: &mut Context) -> Result<String> {
    Template::new(source).render(Some(context), Some(&Namespace::builtin()))
}
