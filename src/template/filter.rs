// Filter callables and the stock filters shipped with the builtin namespace

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TemplateSyntaxError};

use super::value::Value;

pub type SimpleFn = dyn Fn(Value) -> Result<Value> + Send + Sync;
pub type VariadicFn = dyn Fn(Value, Vec<Value>) -> Result<Value> + Send + Sync;

/// A named transformation applied with `{{ value|name }}` or `{{ value|name:args }}`.
///
/// Simple filters reject arguments; variadic filters receive every argument
/// already resolved against the context.
#[derive(Clone)]
pub enum Filter {
    Simple(Arc<SimpleFn>),
    Variadic(Arc<VariadicFn>),
}

impl Filter {
    pub fn simple<F>(function: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Filter::Simple(Arc::new(function))
    }

    pub fn variadic<F>(function: F) -> Self
    where
        F: Fn(Value, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Filter::Variadic(Arc::new(function))
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Simple(_) => f.write_str("Filter::Simple"),
            Filter::Variadic(_) => f.write_str("Filter::Variadic"),
        }
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

pub fn capitalize(value: Value) -> Result<Value> {
    let text = stringify(value);
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            at_word_start = false;
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    Ok(Value::String(out))
}

pub fn uppercase(value: Value) -> Result<Value> {
    Ok(Value::String(stringify(value).to_uppercase()))
}

pub fn lowercase(value: Value) -> Result<Value> {
    Ok(Value::String(stringify(value).to_lowercase()))
}

pub fn urlencode(value: Value) -> Result<Value> {
    Ok(Value::String(urlencoding::encode(&stringify(value)).into_owned()))
}

/// `{{ items|join:separator }}`
pub fn join(value: Value, arguments: Vec<Value>) -> Result<Value> {
    if arguments.len() > 1 {
        return Err(TemplateSyntaxError::new(format!(
            "Filter 'join' expects at most 1 argument. {} argument(s) received",
            arguments.len()
        )));
    }
    let separator = arguments.into_iter().next().map(stringify).unwrap_or_default();

    match value {
        Value::Array(items) => Ok(Value::String(
            items.into_iter().map(stringify).collect::<Vec<_>>().join(&separator),
        )),
        other => Ok(other),
    }
}

/// `{{ name|default:fallback }}` replaces falsy values.
pub fn default(value: Value, arguments: Vec<Value>) -> Result<Value> {
    if value.is_truthy() {
        return Ok(value);
    }
    Ok(arguments.into_iter().next().unwrap_or(value))
}
