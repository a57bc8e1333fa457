// Common test utilities shared across test files

use stencil::{Context, Namespace, Template, Value};

/// Build a context from a JSON object literal
#[allow(dead_code)]
pub fn context_from_json(json: &str) -> Context {
    let value: serde_json::Value = serde_json::from_str(json).expect("Invalid JSON in test");
    match Value::from(value) {
        Value::Map(frame) => Context::from_map(frame),
        other => panic!("Expected a JSON object, got {:?}", other),
    }
}

/// Render with the builtin namespace
#[allow(dead_code)]
pub fn render(source: &str, context: &mut Context) -> stencil::Result<String> {
    Template::new(source).render(Some(context), Some(&Namespace::builtin()))
}

/// Render with the builtin namespace, panicking on errors
#[allow(dead_code)]
pub fn render_ok(source: &str, json: &str) -> String {
    let mut context = context_from_json(json);
    render(source, &mut context).unwrap_or_else(|err| panic!("Render failed: {}", err))
}
