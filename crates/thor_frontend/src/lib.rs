#[macro_use]
extern crate macro_rules_attribute;

mod lexer;
mod parser;
mod resolve;

pub mod ast;
pub mod printer;
pub mod token;

pub use lexer::{LexError, LexErrorKind, TokenIter};
pub use parser::ParseError;
pub use resolve::{
    builtin_module_source, DuplicateImport, ImportResolver, ResolveError, ResolvedModule,
    ResolvedProgram,
};

use ast::Program;
use lexer::Lexer;
use parser::Parser;

derive_alias! {
    #[derive(Node!)] = #[derive(Debug, Clone, PartialEq, serde::Serialize)];
    #[derive(NodeCopy!)] = #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)];
}

pub fn lex(source: &str) -> (TokenIter, Vec<LexError>) {
    Lexer::new(source).lex()
}

pub fn parse(tokens: TokenIter) -> (Program, Vec<ParseError>) {
    Parser::new(tokens).parse()
}
