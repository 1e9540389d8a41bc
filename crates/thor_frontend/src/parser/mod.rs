
mod expr;

use thor_session::diagnostics::{Diagnostic, IntoDiagnostic};
use thor_session::sourcemap::SourceId;
use thor_utils::peek::Peek;

use crate::ast::*;
use crate::lexer::TokenIter;
use crate::token::{Keyword, Token, TokenKind};
use crate::Node;

#[derive(Node!)]
pub struct ParseError {
    pub message: String,
    /// 1-based line of the offending token.
    pub line: u32,
}

impl IntoDiagnostic<SourceId> for ParseError {
    fn into_diagnostic(self, &source_id: &SourceId) -> Diagnostic {
        Diagnostic::error(self.message)
            .with_source(source_id)
            .with_line(self.line)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: TokenIter,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: TokenIter) -> Self {
        Self {
            tokens,
            errors: vec![],
        }
    }

    /// Parses a whole translation unit, recovering at statement
    /// boundaries so that every syntax error in the input is reported.
    /// Statements that failed to parse are absent from the returned
    /// program; callers must treat a non-empty error list as fatal.
    pub fn parse(mut self) -> (Program, Vec<ParseError>) {
        let program = self.parse_program();
        (program, self.errors)
    }

    fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        if self.check_keyword(Keyword::Package) {
            match self.parse_package() {
                Ok(name) => program.package = Some(name),
                Err(error) => {
                    self.report(error);
                    self.seek_statement_boundary();
                }
            }
        }

        while self.check_keyword(Keyword::Import) {
            match self.parse_import() {
                Ok(import) => program.imports.push(import),
                Err(error) => {
                    self.report(error);
                    self.seek_statement_boundary();
                }
            }
        }

        while !self.at_end() {
            if self.check_keyword(Keyword::Import) {
                let line = self.current_line();
                self.report(ParseError {
                    message: "imports must appear before other statements".to_owned(),
                    line,
                });
                self.seek_statement_boundary();
                continue;
            }

            match self.parse_statement() {
                Ok(stmt) => program.statements.push(stmt),
                Err(error) => {
                    self.report(error);
                    self.seek_statement_boundary();
                    // A stray `}` at top level would otherwise never
                    // be consumed.
                    if self.check(TokenKind::RBrace) {
                        self.tokens.next();
                    }
                }
            }
        }

        program
    }

    /// `package a;` or a dotted name like `package std.io;`.
    fn parse_package(&mut self) -> ParseResult<String> {
        self.expect(TokenKind::Keyword(Keyword::Package))?;

        let (mut name, _) = self.parse_ident()?;
        while self.eat_kind(TokenKind::Dot) {
            let (segment, _) = self.parse_ident()?;
            name.push('.');
            name.push_str(&segment);
        }

        self.expect(TokenKind::Semicolon)?;
        Ok(name)
    }

    fn parse_import(&mut self) -> ParseResult<Import> {
        let token = self.expect(TokenKind::Keyword(Keyword::Import))?;

        let module = match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Str(module),
                ..
            }) => {
                self.tokens.next();
                module
            }
            other => return Err(self.error_expected("a module name string", other.as_ref())),
        };

        self.expect(TokenKind::Semicolon)?;

        Ok(Import {
            module,
            line: token.line,
        })
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.tokens.peek() {
            Some(token) if is_type_keyword(&token.kind) => self.parse_typed_decl(),

            Some(token) => match token.kind {
                TokenKind::Keyword(Keyword::Const) => self.parse_const_decl(),
                TokenKind::Keyword(Keyword::Func) => self.parse_func_decl().map(Stmt::Func),
                TokenKind::Keyword(Keyword::Extern) => self.parse_extern_decl(),
                TokenKind::Keyword(Keyword::If) => self.parse_if(),
                TokenKind::Keyword(Keyword::While) => self.parse_while(),
                TokenKind::Keyword(Keyword::Return) => self.parse_return(),
                TokenKind::LBrace => self.parse_block().map(Stmt::Block),
                _ => self.parse_expr_statement(),
            },

            None => {
                let line = self.tokens.eof_line();
                Err(ParseError {
                    message: "expected a statement, found end of input".to_owned(),
                    line,
                })
            }
        }
    }

    /// A statement starting with a type keyword: either a variable
    /// declaration or a C-style function declaration, decided by the
    /// token after the name.
    fn parse_typed_decl(&mut self) -> ParseResult<Stmt> {
        let ty = self.parse_type()?;
        let (name, _) = self.parse_ident()?;

        if self.check(TokenKind::LParen) {
            let params = self.parse_params()?;
            let body = self.parse_func_body()?;

            return Ok(Stmt::Func(FuncDecl {
                name,
                params,
                ret: ty,
                body,
            }));
        }

        let init = if self.eat_kind(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect_or_recover(TokenKind::Semicolon);

        Ok(Stmt::VarDecl { name, ty, init })
    }

    fn parse_const_decl(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Keyword(Keyword::Const))?;

        let ty = self.parse_type()?;
        let (name, _) = self.parse_ident()?;

        self.expect(TokenKind::Assign)?;
        let init = self.parse_expr()?;
        self.expect_or_recover(TokenKind::Semicolon);

        Ok(Stmt::ConstDecl { name, ty, init })
    }

    /// `func name(params) -> type { .. }`; the arrow and return type
    /// may be omitted for void functions.
    fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        self.expect(TokenKind::Keyword(Keyword::Func))?;

        let (name, _) = self.parse_ident()?;
        let params = self.parse_params()?;

        let ret = if self.eat_kind(TokenKind::Arrow) {
            self.parse_type()?
        } else {
            Type::Void
        };

        let body = self.parse_func_body()?;

        Ok(FuncDecl {
            name,
            params,
            ret,
            body,
        })
    }

    fn parse_func_body(&mut self) -> ParseResult<Option<Vec<Stmt>>> {
        if self.check(TokenKind::LBrace) {
            Ok(Some(self.parse_block()?))
        } else {
            self.expect(TokenKind::Semicolon)?;
            Ok(None)
        }
    }

    fn parse_extern_decl(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Keyword(Keyword::Extern))?;

        let ret = self.parse_type()?;
        let (name, _) = self.parse_ident()?;
        let params = self.parse_params()?;

        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Extern { name, params, ret })
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;

        let mut params = vec![];
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.eat_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let is_ref = self.eat_kind(TokenKind::Keyword(Keyword::Ref));

        let mut ty = self.parse_type()?;
        let (name, _) = self.parse_ident()?;

        // Trailing `[]` on the name, C style.
        if self.eat_kind(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket)?;
            ty = Type::Array(Box::new(ty));
        }

        if is_ref {
            ty = Type::Reference(Box::new(ty));
        }

        Ok(Param { name, ty })
    }

    fn parse_type(&mut self) -> ParseResult<Type> {
        let mut ty = match self.tokens.peek() {
            Some(token) => match token.kind {
                TokenKind::Keyword(Keyword::Int) => Type::Int,
                TokenKind::Keyword(Keyword::Float) => Type::Float,
                TokenKind::Keyword(Keyword::String) => Type::String,
                TokenKind::Keyword(Keyword::Bool) => Type::Bool,
                TokenKind::Keyword(Keyword::Void) => Type::Void,
                _ => return Err(self.error_expected("a type", Some(&token))),
            },
            None => return Err(self.error_expected("a type", None)),
        };
        self.tokens.next();

        while self.eat_kind(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket)?;
            ty = Type::Array(Box::new(ty));
        }

        Ok(ty)
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Keyword(Keyword::If))?;

        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.eat_kind(TokenKind::Keyword(Keyword::Else)) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Keyword(Keyword::While))?;

        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While { cond, body })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Keyword(Keyword::Return))?;

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        self.expect_or_recover(TokenKind::Semicolon);

        Ok(Stmt::Return(value))
    }

    fn parse_expr_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expr()?;
        self.expect_or_recover(TokenKind::Semicolon);
        Ok(Stmt::Expr(expr))
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace)?;

        let mut statements = vec![];
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(error) => {
                    self.report(error);
                    self.seek_statement_boundary();
                }
            }
        }

        self.expect(TokenKind::RBrace)?;

        Ok(statements)
    }

    fn parse_ident(&mut self) -> ParseResult<(String, u32)> {
        match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                line,
                ..
            }) => {
                self.tokens.next();
                Ok((name, line))
            }
            other => Err(self.error_expected("an identifier", other.as_ref())),
        }
    }

    /// Skips to just past the next `;`, stopping short of `}` or the
    /// end of input so enclosing blocks still close properly.
    fn seek_statement_boundary(&mut self) {
        loop {
            match self.tokens.peek().map(|token| token.kind) {
                Some(TokenKind::Semicolon) => {
                    self.tokens.next();
                    return;
                }
                Some(TokenKind::RBrace) | Some(TokenKind::Eof) | None => return,
                Some(_) => {
                    self.tokens.next();
                }
            }
        }
    }

    fn at_end(&self) -> bool {
        self.tokens
            .peek()
            .is_none_or(|token| token.kind == TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.tokens
            .peek()
            .is_some_and(|token| token.kind == kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(TokenKind::Keyword(keyword))
    }

    fn eat_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.tokens.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.tokens.peek() {
            Some(token) if token.kind == kind => {
                self.tokens.next();
                Ok(token)
            }
            other => Err(self.error_expected(kind.token_name(), other.as_ref())),
        }
    }

    fn expect_or_recover(&mut self, kind: TokenKind) {
        if let Err(error) = self.expect(kind) {
            self.report(error);
        }
    }

    fn current_line(&self) -> u32 {
        self.tokens
            .peek()
            .map_or_else(|| self.tokens.eof_line(), |token| token.line)
    }

    fn report(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn error_expected(&self, expected: &str, found: Option<&Token>) -> ParseError {
        match found {
            Some(token) => ParseError {
                message: format!("expected {expected}, found {}", token.kind.token_name()),
                line: token.line,
            },
            None => ParseError {
                message: format!("expected {expected}, found end of input"),
                line: self.tokens.eof_line(),
            },
        }
    }
}

fn is_type_keyword(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Keyword(
            Keyword::Int | Keyword::Float | Keyword::String | Keyword::Bool | Keyword::Void
        )
    )
}
