
use std::str::Chars;

use thor_session::diagnostics::{Diagnostic, IntoDiagnostic};
use thor_session::sourcemap::SourceId;
use thor_utils::peek::Peek;

use crate::token::*;
use crate::Node;

#[derive(Node!)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    pub column: u32,
}

#[derive(serde::Serialize, thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("integer overflow")]
    IntegerOverflow,
}

impl IntoDiagnostic<SourceId> for LexError {
    fn into_diagnostic(self, &source_id: &SourceId) -> Diagnostic {
        Diagnostic::error(self.kind.to_string())
            .with_source(source_id)
            .with_line(self.line)
    }
}

pub struct Lexer<'src> {
    chars: Chars<'src>,
    errors: Vec<LexError>,

    line: u32,
    column: u32,

    token_line: u32,
    token_column: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.chars(),
            errors: vec![],

            line: 1,
            column: 1,

            token_line: 1,
            token_column: 1,
        }
    }

    /// Scans the whole input. The token stream always ends with
    /// [`TokenKind::Eof`], even when errors were recorded; unscannable
    /// characters are reported and dropped rather than forwarded.
    pub fn lex(mut self) -> (TokenIter, Vec<LexError>) {
        let mut tokens = vec![];

        loop {
            let token = self.lex_token();
            let at_end = token.kind == TokenKind::Eof;

            tokens.push(token);

            if at_end {
                break;
            }
        }

        (TokenIter::new(tokens), self.errors)
    }

    fn lex_token(&mut self) -> Token {
        loop {
            self.token_line = self.line;
            self.token_column = self.column;

            let Some(ch) = self.advance() else {
                return self.token(TokenKind::Eof);
            };

            let kind = match ch {
                ch if ch.is_ascii_whitespace() => continue,

                '/' if self.eat('/') => {
                    while !matches!(self.advance(), Some('\n') | None) {}
                    continue;
                }

                '/' if self.eat('*') => {
                    // An unterminated block comment just runs to the
                    // end of input.
                    loop {
                        match self.advance() {
                            Some('*') if self.eat('/') => break,
                            Some(_) => {}
                            None => break,
                        }
                    }
                    continue;
                }

                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,

                '.' => TokenKind::Dot,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                ':' if self.eat(':') => TokenKind::PathSep,
                ':' => TokenKind::Colon,
                '-' if self.eat('>') => TokenKind::Arrow,

                '+' => TokenKind::Add,
                '-' => TokenKind::Sub,
                '*' => TokenKind::Mul,
                '/' => TokenKind::Div,
                '%' => TokenKind::Mod,

                '=' if self.eat('=') => TokenKind::Eq,
                '=' => TokenKind::Assign,
                '!' if self.eat('=') => TokenKind::NotEq,
                '!' => TokenKind::Not,
                '<' if self.eat('=') => TokenKind::LtEq,
                '<' => TokenKind::Lt,
                '>' if self.eat('=') => TokenKind::GtEq,
                '>' => TokenKind::Gt,

                // `&` and `|` only exist doubled.
                '&' if self.eat('&') => TokenKind::And,
                '|' if self.eat('|') => TokenKind::Or,

                '"' => match self.lex_string() {
                    Ok(kind) => kind,
                    Err(kind) => {
                        self.report(kind);
                        continue;
                    }
                },

                ch @ '0'..='9' => match self.lex_number(ch) {
                    Ok(kind) => kind,
                    Err(kind) => {
                        self.report(kind);
                        continue;
                    }
                },

                ch if is_ident_start(ch) => self.lex_alpha(ch),

                ch => {
                    self.report(LexErrorKind::UnexpectedChar(ch));
                    continue;
                }
            };

            return self.token(kind);
        }
    }

    fn lex_string(&mut self) -> Result<TokenKind, LexErrorKind> {
        let mut contents = String::new();

        loop {
            match self.advance() {
                Some('"') => return Ok(TokenKind::Str(contents)),

                Some('\\') => match self.advance() {
                    Some('n') => contents.push('\n'),
                    Some('t') => contents.push('\t'),
                    Some('r') => contents.push('\r'),
                    Some('\\') => contents.push('\\'),
                    Some('"') => contents.push('"'),
                    // Unknown escapes pass through literally.
                    Some(other) => contents.push(other),
                    None => return Err(LexErrorKind::UnterminatedString),
                },

                Some(ch) => contents.push(ch),

                None => return Err(LexErrorKind::UnterminatedString),
            }
        }
    }

    fn lex_number(&mut self, first: char) -> Result<TokenKind, LexErrorKind> {
        let mut text = String::from(first);
        let mut has_decimal = false;

        loop {
            match self.chars.peek() {
                Some(ch @ '0'..='9') => {
                    self.advance();
                    text.push(ch);
                }
                Some('.') if !has_decimal => {
                    self.advance();
                    has_decimal = true;
                    text.push('.');
                }
                _ => break,
            }
        }

        if has_decimal {
            // A digit run with one dot always parses as f64.
            Ok(TokenKind::Float(text.parse().unwrap_or(0.0)))
        } else {
            text.parse()
                .map(TokenKind::Int)
                .map_err(|_| LexErrorKind::IntegerOverflow)
        }
    }

    fn lex_alpha(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);

        while let Some(ch) = self.chars.peek() {
            if !is_ident(ch) {
                break;
            }
            self.advance();
            text.push(ch);
        }

        TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text))
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.chars.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            line: self.token_line,
            column: self.token_column,
        }
    }

    fn report(&mut self, kind: LexErrorKind) {
        self.errors.push(LexError {
            kind,
            line: self.token_line,
            column: self.token_column,
        });
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub struct TokenIter {
    tokens: std::vec::IntoIter<Token>,
    eof_line: u32,
}

impl TokenIter {
    fn new(tokens: Vec<Token>) -> Self {
        let eof_line = tokens.last().map_or(1, |token| token.line);

        Self {
            tokens: tokens.into_iter(),
            eof_line,
        }
    }

    /// Line reported for errors at the very end of input.
    pub fn eof_line(&self) -> u32 {
        self.eof_line
    }

    pub fn peek_second(&self) -> Option<Token> {
        self.tokens.as_slice().get(1).cloned()
    }
}

impl Iterator for TokenIter {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.tokens.next()
    }
}

impl Peek for TokenIter {
    fn peek(&self) -> Option<Self::Item> {
        self.tokens.as_slice().first().cloned()
    }
}
