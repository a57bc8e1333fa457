// Template lexer: splits source text into text, variable, block and comment tokens

use tracing::trace;

use super::scanner::StringScanner;
use super::token::Token;

const OPENERS: [&str; 3] = ["{{", "{%", "{#"];

fn closer_for(opener: &str) -> &'static str {
    match opener {
        "{{" => "}}",
        "{%" => "%}",
        _ => "#}",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Raw,
}

pub struct Lexer<'a> {
    source: &'a str,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            mode: Mode::Normal,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut scanner = StringScanner::new(self.source);

        while !scanner.is_at_end() {
            let (matched, text) = scanner.scan_until_any(&OPENERS);
            match matched {
                Some(opener) => {
                    if !text.is_empty() {
                        self.emit(&mut tokens, text);
                    }
                    let region = scanner.scan_until(closer_for(opener), true);
                    self.emit(&mut tokens, region);
                }
                None => self.emit(&mut tokens, text),
            }
        }

        trace!(count = tokens.len(), "tokenized template");
        tokens
    }

    /// Classify one scanned region and apply the raw passthrough state machine.
    fn emit(&mut self, tokens: &mut Vec<Token>, raw: &str) {
        let token = create_token(raw);

        match self.mode {
            Mode::Raw => {
                if matches!(&token, Token::Block(value) if value == "endraw") {
                    self.mode = Mode::Normal;
                } else {
                    tokens.push(Token::Text(raw.to_string()));
                }
            }
            Mode::Normal => {
                if matches!(&token, Token::Block(value) if value == "raw") {
                    self.mode = Mode::Raw;
                }
                tokens.push(token);
            }
        }
    }
}

fn create_token(raw: &str) -> Token {
    // anything of 4 characters or fewer cannot hold both delimiters
    if raw.chars().count() > 4 {
        for opener in OPENERS {
            if raw.starts_with(opener) && raw.ends_with(closer_for(opener)) {
                let inner = raw[2..raw.len() - 2].trim_matches(' ').to_string();
                return match opener {
                    "{{" => Token::Variable(inner),
                    "{%" => Token::Block(inner),
                    _ => Token::Comment(inner),
                };
            }
        }
    }

    Token::Text(raw.to_string())
}
