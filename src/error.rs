// Error handling for stencil

use thiserror::Error;

/// The single error kind raised while parsing or rendering a template.
///
/// Lexing never fails; every other stage reports a human-readable description
/// naming the offending tag, filter, or argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct TemplateSyntaxError {
    description: String,
}

impl TemplateSyntaxError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

pub type Result<T> = std::result::Result<T, TemplateSyntaxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_description() {
        let err = TemplateSyntaxError::new("Unknown template tag 'bogus'");
        assert_eq!(err.to_string(), "Unknown template tag 'bogus'");
        assert_eq!(err.description(), "Unknown template tag 'bogus'");
    }

    #[test]
    fn test_errors_compare_by_description() {
        assert_eq!(
            TemplateSyntaxError::new("`endfor` was not found."),
            TemplateSyntaxError::new(String::from("`endfor` was not found."))
        );
        assert_ne!(TemplateSyntaxError::new("a"), TemplateSyntaxError::new("b"));
    }
}
