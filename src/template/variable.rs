// Variable resolution and filter chains

use std::fmt;

use crate::error::{Result, TemplateSyntaxError};

use super::context::Context;
use super::filter::Filter;
use super::parser::TokenParser;
use super::split::split_and_trim;
use super::value::Value;

/// Anything that produces a value from a context.
pub trait Resolvable: fmt::Debug + Send + Sync {
    fn resolve(&self, context: &Context) -> Result<Value>;
}

/// A literal or dotted lookup path such as `article.tags.first`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    variable: String,
}

/// Where a path lookup currently points.
enum Cursor<'c> {
    Context(&'c Context),
    Value(&'c Value),
    Count(usize),
}

impl Variable {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.variable
    }

    fn string_literal(&self) -> Option<&str> {
        let v = self.variable.as_str();
        let quoted = v.len() >= 2
            && ((v.starts_with('\'') && v.ends_with('\'')) || (v.starts_with('"') && v.ends_with('"')));
        quoted.then(|| &v[1..v.len() - 1])
    }

    fn number_literal(&self) -> Option<Value> {
        if let Ok(int) = self.variable.parse::<i64>() {
            return Some(Value::Int(int));
        }
        // `inf`, `nan` and friends parse as floats but are valid variable names
        let numeric_start = self
            .variable
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        if numeric_start {
            if let Ok(float) = self.variable.parse::<f64>() {
                return Some(Value::Float(float));
            }
        }
        None
    }

    fn lookup(&self) -> impl Iterator<Item = &str> {
        self.variable.split('.').filter(|bit| !bit.is_empty())
    }

    fn traverse<'c>(&self, context: &'c Context) -> Result<Option<Cursor<'c>>> {
        let mut current = Cursor::Context(context);

        for bit in self.lookup() {
            current = match current {
                Cursor::Context(context) => match context.get(bit) {
                    Some(value) => Cursor::Value(value),
                    None => return Ok(None),
                },
                Cursor::Value(Value::Map(map)) => match map.get(bit) {
                    Some(value) => Cursor::Value(value),
                    None => return Ok(None),
                },
                Cursor::Value(Value::Array(items)) => match bit {
                    "first" => match items.first() {
                        Some(value) => Cursor::Value(value),
                        None => return Ok(None),
                    },
                    "last" => match items.last() {
                        Some(value) => Cursor::Value(value),
                        None => return Ok(None),
                    },
                    "count" => Cursor::Count(items.len()),
                    _ if is_index(bit) => Cursor::Value(self.index(items, bit)?),
                    _ => return Ok(None),
                },
                _ => return Ok(None),
            };
        }

        Ok(Some(current))
    }

    /// Look up an integer segment; anything that is not a valid position,
    /// including values too large for any integer type, is out of range.
    fn index<'c>(&self, items: &'c [Value], index: &str) -> Result<&'c Value> {
        index
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .ok_or_else(|| {
                TemplateSyntaxError::new(format!(
                    "Index {} is out of range in '{}' ({} item(s))",
                    index,
                    self.variable,
                    items.len()
                ))
            })
    }
}

impl Resolvable for Variable {
    fn resolve(&self, context: &Context) -> Result<Value> {
        if let Some(literal) = self.string_literal() {
            return Ok(Value::String(literal.to_string()));
        }
        if let Some(number) = self.number_literal() {
            return Ok(number);
        }

        Ok(match self.traverse(context)? {
            Some(Cursor::Value(value)) => value.clone(),
            Some(Cursor::Count(count)) => Value::from(count),
            // an empty path never leaves the context itself
            Some(Cursor::Context(_)) | None => Value::Null,
        })
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.variable)
    }
}

/// `[+-]digits`, the shape of a sequence index segment.
fn is_index(bit: &str) -> bool {
    let digits = bit.strip_prefix(&['+', '-'][..]).unwrap_or(bit);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A filter call argument: an integer literal or anything a [`Variable`] resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArgument {
    variable: String,
}

impl FilterArgument {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.variable
    }
}

impl Resolvable for FilterArgument {
    fn resolve(&self, context: &Context) -> Result<Value> {
        match self.variable.parse::<i64>() {
            Ok(int) => Ok(Value::Int(int)),
            Err(_) => Variable::new(self.variable.as_str()).resolve(context),
        }
    }
}

/// One `|name:args` step of a filter chain.
#[derive(Debug, Clone)]
pub struct FilterInvocation {
    name: String,
    filter: Filter,
    arguments: Vec<FilterArgument>,
}

impl FilterInvocation {
    pub fn new(name: impl Into<String>, filter: Filter, arguments: Vec<FilterArgument>) -> Self {
        Self {
            name: name.into(),
            filter,
            arguments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[FilterArgument] {
        &self.arguments
    }

    pub fn invoke(&self, value: Value, context: &Context) -> Result<Value> {
        match &self.filter {
            Filter::Simple(function) => {
                if !self.arguments.is_empty() {
                    return Err(TemplateSyntaxError::new(format!(
                        "Filter '{}' expects no arguments. {} argument(s) received",
                        self.name,
                        self.arguments.len()
                    )));
                }
                function(value)
            }
            Filter::Variadic(function) => {
                let mut resolved = Vec::with_capacity(self.arguments.len());
                for argument in &self.arguments {
                    let value = argument.resolve(context)?;
                    if value.is_null() {
                        return Err(TemplateSyntaxError::new(format!(
                            "Failed to resolve argument '{}' in {} filter",
                            argument.as_str(),
                            self.name
                        )));
                    }
                    resolved.push(value);
                }
                function(value, resolved)
            }
        }
    }
}

/// The compiled contents of a `{{ ... }}` tag: a variable plus its filters.
#[derive(Debug, Clone)]
pub struct FilterExpression {
    variable: Variable,
    filters: Vec<FilterInvocation>,
}

impl FilterExpression {
    pub fn new(token: &str, parser: &TokenParser<'_>) -> Result<Self> {
        let bits = split_and_trim(token, '|');
        let Some((base, filter_bits)) = bits.split_first() else {
            return Err(TemplateSyntaxError::new(
                "Variable tags must include at least 1 argument",
            ));
        };

        let filters = filter_bits
            .iter()
            .map(|bit| {
                let (name, arguments) = parse_filter_components(bit);
                let filter = parser.find_filter(&name)?;
                Ok(FilterInvocation::new(name, filter, arguments))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            variable: Variable::new(base.as_str()),
            filters,
        })
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn filters(&self) -> &[FilterInvocation] {
        &self.filters
    }
}

impl Resolvable for FilterExpression {
    fn resolve(&self, context: &Context) -> Result<Value> {
        let value = self.variable.resolve(context)?;
        self.filters
            .iter()
            .try_fold(value, |value, invocation| invocation.invoke(value, context))
    }
}

/// Split `name:arg1,arg2` into the filter name and its arguments.
fn parse_filter_components(bit: &str) -> (String, Vec<FilterArgument>) {
    let mut components = split_and_trim(bit, ':').into_iter();
    let name = components.next().unwrap_or_default();
    let arguments = components
        .next()
        .map(|args| {
            split_and_trim(&args, ',')
                .into_iter()
                .map(FilterArgument::new)
                .collect()
        })
        .unwrap_or_default();
    (name, arguments)
}
