// Lexer output: one token per text run, variable, block tag or comment

use super::split::split_and_trim;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, kept verbatim.
    Text(String),
    /// `{{ ... }}` with delimiters stripped.
    Variable(String),
    /// `{% ... %}` with delimiters stripped.
    Block(String),
    /// `{# ... #}` with delimiters stripped.
    Comment(String),
}

impl Token {
    pub fn contents(&self) -> &str {
        match self {
            Token::Text(value) | Token::Variable(value) | Token::Block(value) | Token::Comment(value) => {
                value
            }
        }
    }

    /// The contents split on spaces, with quoted phrases kept together.
    pub fn components(&self) -> Vec<String> {
        split_and_trim(self.contents(), ' ')
    }

    /// First component, i.e. the tag name for block tokens.
    pub fn tag_name(&self) -> Option<String> {
        self.components().into_iter().next()
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Token::Block(_))
    }
}
