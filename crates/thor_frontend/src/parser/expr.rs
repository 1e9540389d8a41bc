use thor_utils::peek::Peek;

use super::{ParseError, ParseResult, Parser};
use crate::ast::*;
use crate::token::{Token, TokenKind};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest,

    Assign,

    LogicalOr,
    LogicalAnd,

    Equality,
    Comparison,

    Term,
    Factor,

    Unary,
}

fn should_parse_binop_in_prec(binop: &BinOp, in_prec: Prec) -> bool {
    let prec = binop_prec(binop);
    prec > in_prec || binop_is_r_assoc(binop) && prec == in_prec
}

fn binop_prec(binop: &BinOp) -> Prec {
    match binop {
        BinOp::Assign => Prec::Assign,

        BinOp::LogicalOr => Prec::LogicalOr,
        BinOp::LogicalAnd => Prec::LogicalAnd,

        BinOp::Eq | BinOp::NotEq => Prec::Equality,
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => Prec::Comparison,

        BinOp::Add | BinOp::Sub => Prec::Term,
        BinOp::Mul | BinOp::Div | BinOp::Mod => Prec::Factor,
    }
}

fn binop_is_r_assoc(binop: &BinOp) -> bool {
    matches!(binop, BinOp::Assign)
}

impl Parser {
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_prec(Prec::Lowest)
    }

    fn parse_prec(&mut self, prec: Prec) -> ParseResult<Expr> {
        let mut expr = self.parse_postfix()?;

        while let Some(op) = self.peek_bin_op(prec) {
            let line = self.current_line();
            self.tokens.next();

            if op == BinOp::Assign && !is_assign_target(&expr) {
                return Err(ParseError {
                    message: "invalid assignment target".to_owned(),
                    line,
                });
            }

            // Recursing at the operator's own precedence stops
            // left-associative operators at their own level; the
            // right-associativity check above lets assignment chain.
            let rhs = self.parse_prec(binop_prec(&op))?;

            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                line,
            );
        }

        Ok(expr)
    }

    /// Parses a primary expression followed by any chain of postfix
    /// calls and member accesses.
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.tokens.peek().map(|token| token.kind) {
                Some(TokenKind::LParen) => {
                    let line = expr.line;
                    let args = self.parse_args()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        line,
                    );
                }

                Some(TokenKind::Dot) => {
                    self.tokens.next();
                    let (property, line) = self.parse_ident()?;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property,
                        },
                        line,
                    );
                }

                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Int(n),
                line,
                ..
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Int(n), line))
            }

            Some(Token {
                kind: TokenKind::Float(n),
                line,
                ..
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Float(n), line))
            }

            Some(Token {
                kind: TokenKind::Str(string),
                line,
                ..
            }) => {
                self.tokens.next();
                self.parse_string_tail(string, line)
            }

            Some(Token {
                kind: TokenKind::Bool(b),
                line,
                ..
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Bool(b), line))
            }

            Some(Token {
                kind: TokenKind::Identifier(name),
                line,
                ..
            }) => {
                self.tokens.next();
                let name = self.parse_qualified_tail(name)?;
                Ok(Expr::new(ExprKind::Var(name), line))
            }

            Some(token) if token.kind == TokenKind::Sub => {
                self.tokens.next();
                let expr = self.parse_prec(Prec::Unary)?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnOp::Negate,
                        expr: Box::new(expr),
                    },
                    token.line,
                ))
            }

            Some(token) if token.kind == TokenKind::Not => {
                self.tokens.next();
                let expr = self.parse_prec(Prec::Unary)?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnOp::Not,
                        expr: Box::new(expr),
                    },
                    token.line,
                ))
            }

            Some(token) if token.kind == TokenKind::LParen => {
                self.tokens.next();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            Some(token) if token.kind == TokenKind::LBracket => {
                self.tokens.next();
                let elements = self.parse_array_elements()?;
                Ok(Expr::new(ExprKind::Array(elements), token.line))
            }

            other => Err(self.error_expected("an expression", other.as_ref())),
        }
    }

    /// A string literal immediately followed by `% [...]` is a format
    /// string, not a modulo of a string.
    fn parse_string_tail(&mut self, template: String, line: u32) -> ParseResult<Expr> {
        let is_format = self
            .tokens
            .peek()
            .is_some_and(|token| token.kind == TokenKind::Mod)
            && self
                .tokens
                .peek_second()
                .is_some_and(|token| token.kind == TokenKind::LBracket);

        if !is_format {
            return Ok(Expr::new(ExprKind::Str(template), line));
        }

        self.tokens.next();
        self.tokens.next();

        let args = self.parse_array_elements()?;

        Ok(Expr::new(ExprKind::FormatStr { template, args }, line))
    }

    /// Extends an identifier with any `::segment` suffixes; the full
    /// qualified name is kept as a single string.
    fn parse_qualified_tail(&mut self, mut name: String) -> ParseResult<String> {
        while self.eat_kind(TokenKind::PathSep) {
            let (segment, _) = self.parse_ident()?;
            name.push_str("::");
            name.push_str(&segment);
        }
        Ok(name)
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;

        let mut args = vec![];
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// Comma-separated expressions up to a closing `]`; the opening
    /// bracket has already been consumed.
    fn parse_array_elements(&mut self) -> ParseResult<Vec<Expr>> {
        let mut elements = vec![];
        if !self.check(TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expr()?);
                if !self.eat_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RBracket)?;
        Ok(elements)
    }

    fn peek_bin_op(&self, prec: Prec) -> Option<BinOp> {
        let op = match self.tokens.peek().map(|token| token.kind)? {
            TokenKind::Assign => BinOp::Assign,

            TokenKind::Or => BinOp::LogicalOr,
            TokenKind::And => BinOp::LogicalAnd,

            TokenKind::Eq => BinOp::Eq,
            TokenKind::NotEq => BinOp::NotEq,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::LtEq => BinOp::LtEq,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::GtEq => BinOp::GtEq,

            TokenKind::Add => BinOp::Add,
            TokenKind::Sub => BinOp::Sub,
            TokenKind::Mul => BinOp::Mul,
            TokenKind::Div => BinOp::Div,
            TokenKind::Mod => BinOp::Mod,

            _ => return None,
        };

        should_parse_binop_in_prec(&op, prec).then_some(op)
    }
}

fn is_assign_target(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Var(_) | ExprKind::Member { .. })
}
