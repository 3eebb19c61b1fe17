//! The syntax parser for Uni.

use std::mem;
use std::rc::Rc;

use tracing::trace;

use crate::ensure_sufficient_stack;
use crate::syntax::ast::{BinaryOp, Block, Expr, FunctionDecl, Spanned, Stmt, UnaryOp};
use crate::syntax::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use crate::syntax::scanner::Lexer;
use crate::syntax::token::{SpannedToken, Token};

/// Expressions and blocks nested deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 1024;

/// Binding strength of operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equality,       // == !=
    Boolean,        // or and
    Relational,     // < > <= >=
    Additive,       // + -
    Multiplicative, // * /
    Prefix,         // +x -x !x
}

/// Binary operator and precedence for a token in infix position.
fn infix_operator(token: &Token<'_>) -> Option<(BinaryOp, Precedence)> {
    let op = match token {
        Token::EqEq => (BinaryOp::Eq, Precedence::Equality),
        Token::NotEq => (BinaryOp::NotEq, Precedence::Equality),
        Token::Or => (BinaryOp::Or, Precedence::Boolean),
        Token::And => (BinaryOp::And, Precedence::Boolean),
        Token::Lt => (BinaryOp::Lt, Precedence::Relational),
        Token::Gt => (BinaryOp::Gt, Precedence::Relational),
        Token::LtEq => (BinaryOp::LtEq, Precedence::Relational),
        Token::GtEq => (BinaryOp::GtEq, Precedence::Relational),
        Token::Plus => (BinaryOp::Add, Precedence::Additive),
        Token::Minus => (BinaryOp::Sub, Precedence::Additive),
        Token::Star => (BinaryOp::Mul, Precedence::Multiplicative),
        Token::Slash => (BinaryOp::Div, Precedence::Multiplicative),
        _ => return None,
    };
    Some(op)
}

/// Recursive descent parser for statements with a Pratt parser for expressions.
///
/// The parser is itself a lazy iterator over top-level statements: pulling one
/// statement pulls only the tokens that statement needs. The first syntax
/// error is yielded once and ends the sequence.
pub struct Parser<'src, I: Iterator<Item = SyntaxResult<SpannedToken<'src>>>> {
    tokens: I,
    cur: SpannedToken<'src>,  // Token being looked at
    peek: SpannedToken<'src>, // One token of lookahead
    last_end: usize,          // End of the most recently consumed token
    depth: usize,             // Open expressions and statements
    primed: bool,
    finished: bool,
}

impl<'src> Parser<'src, Lexer<'src>> {
    /// Convenience constructor that scans `src` on demand.
    #[inline]
    pub fn from_source(src: &'src str) -> Self {
        Parser::new(Lexer::new(src))
    }
}

impl<'src, I: Iterator<Item = SyntaxResult<SpannedToken<'src>>>> Parser<'src, I> {
    #[inline]
    pub fn new(tokens: I) -> Self {
        Parser {
            tokens,
            cur: SpannedToken::default(),
            peek: SpannedToken::default(),
            last_end: 0,
            depth: 0,
            primed: false,
            finished: false,
        }
    }

    /// Parses the whole input, stopping at the first syntax error.
    pub fn parse_program(&mut self) -> SyntaxResult<Vec<Stmt>> {
        self.map(|stmt| stmt.map(|s| s.node)).collect()
    }

    fn next_statement(&mut self) -> SyntaxResult<Option<Spanned<Stmt>>> {
        if !self.primed {
            self.primed = true;
            self.bump()?;
            self.bump()?;
        }
        self.skip_semicolons()?;
        if self.cur.token == Token::EOF {
            return Ok(None);
        }
        let start = self.cur.span.start;
        let node = self.parse_statement()?;
        trace!(range = ?(start..self.last_end), "parsed statement");
        Ok(Some(Spanned { node, span: start..self.last_end }))
    }

    /// Consumes the current token and returns it.
    fn advance(&mut self) -> SyntaxResult<SpannedToken<'src>> {
        let next = match self.tokens.next() {
            Some(token) => token?,
            None => {
                let end = self.peek.span.end;
                SpannedToken { token: Token::EOF, span: end..end }
            }
        };
        let old = mem::replace(&mut self.cur, mem::replace(&mut self.peek, next));
        self.last_end = old.span.end;
        Ok(old)
    }

    #[inline]
    fn bump(&mut self) -> SyntaxResult<()> {
        self.advance().map(drop)
    }

    fn skip_semicolons(&mut self) -> SyntaxResult<()> {
        while self.cur.token == Token::Semicolon {
            self.bump()?;
        }
        Ok(())
    }

    #[cold]
    fn unexpected(&self, expected: &str) -> SyntaxError {
        if self.cur.token == Token::EOF {
            SyntaxError::new(
                SyntaxErrorKind::UnexpectedEof,
                self.cur.span.clone(),
                format!("expected {expected}, but the input ended"),
            )
        } else {
            SyntaxError::new(
                SyntaxErrorKind::ExpectedToken,
                self.cur.span.clone(),
                format!("expected {expected}, found `{}`", self.cur.token),
            )
        }
    }

    /// Consumes the current token if it is `expected`, fails otherwise.
    fn expect(&mut self, expected: Token<'src>) -> SyntaxResult<()> {
        if self.cur.token == expected {
            self.bump()
        } else {
            Err(self.unexpected(&format!("`{}`", expected.as_symbol())))
        }
    }

    fn expect_identifier(&mut self) -> SyntaxResult<String> {
        match self.cur.token {
            Token::Identifier(name) => {
                self.bump()?;
                Ok(name.to_string())
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    /// Runs `f` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(SyntaxError::new(
                SyntaxErrorKind::NestingTooDeep,
                self.cur.span.clone(),
                format!("nesting is limited to {MAX_NESTING_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    // Statements

    fn parse_statement(&mut self) -> SyntaxResult<Stmt> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> SyntaxResult<Stmt> {
        let stmt = match self.cur.token {
            Token::Var => self.parse_variable()?,
            Token::If => self.parse_if()?,
            Token::While => self.parse_while()?,
            Token::For => self.parse_for()?,
            Token::Fn => self.parse_function()?,
            Token::Return => self.parse_return()?,
            Token::LBrace => Stmt::Block(self.parse_block()?),
            Token::Identifier(_) if self.peek.token == Token::Assign => self.parse_variable()?,
            _ => self.parse_expression_statement()?,
        };
        if self.cur.token == Token::Semicolon {
            self.bump()?;
        }
        Ok(stmt)
    }

    /// `var name = value` declares, `name = value` reassigns.
    fn parse_variable(&mut self) -> SyntaxResult<Stmt> {
        let is_new = self.cur.token == Token::Var;
        if is_new {
            self.bump()?;
        }
        let name = self.expect_identifier()?;
        self.expect(Token::Assign)?;
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok(Stmt::Var { name, value, is_new })
    }

    fn parse_if(&mut self) -> SyntaxResult<Stmt> {
        self.expect(Token::If)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        let consequence = self.parse_block()?;
        let alternative = if self.cur.token == Token::Else {
            self.bump()?;
            if self.cur.token == Token::If {
                Some(Block::new(vec![self.parse_if()?]))
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { condition, consequence, alternative })
    }

    fn parse_while(&mut self) -> SyntaxResult<Stmt> {
        self.expect(Token::While)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }

    /// `for key in subject { ... }` or `for key, value in subject { ... }`
    fn parse_for(&mut self) -> SyntaxResult<Stmt> {
        self.expect(Token::For)?;
        let key = self.expect_identifier()?;
        let value = if self.cur.token == Token::Comma {
            self.bump()?;
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(Token::In)?;
        let subject = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block()?;
        Ok(Stmt::For { key, value, subject, body })
    }

    fn parse_function(&mut self) -> SyntaxResult<Stmt> {
        self.expect(Token::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        while self.cur.token != Token::RParen {
            params.push(self.expect_identifier()?);
            if self.cur.token == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn parse_return(&mut self) -> SyntaxResult<Stmt> {
        self.expect(Token::Return)?;
        Ok(Stmt::Return(self.parse_expression(Precedence::Lowest)?))
    }

    fn parse_block(&mut self) -> SyntaxResult<Block> {
        self.expect(Token::LBrace)?;
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons()?;
            match self.cur.token {
                Token::RBrace => {
                    self.bump()?;
                    break;
                }
                Token::EOF => return Err(self.unexpected("`}` to close the block")),
                _ => statements.push(self.parse_statement()?),
            }
        }
        Ok(Block::new(statements))
    }

    /// An expression on its own, or an indexed assignment like `xs[0] = 1`.
    fn parse_expression_statement(&mut self) -> SyntaxResult<Stmt> {
        let start = self.cur.span.start;
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.cur.token != Token::Assign {
            return Ok(Stmt::Expr(expr));
        }
        match expr {
            Expr::Index { subject, index } => {
                self.bump()?;
                let value = self.parse_expression(Precedence::Lowest)?;
                Ok(Stmt::SetIndex { subject: *subject, index: *index, value })
            }
            other => Err(SyntaxError::new(
                SyntaxErrorKind::InvalidAssignmentTarget,
                start..self.last_end,
                format!("cannot assign to `{other}`"),
            )),
        }
    }

    // Expressions

    /// Pratt parser core: parse a prefix expression, then keep folding binary
    /// operators while they bind tighter than `precedence`.
    pub fn parse_expression(&mut self, precedence: Precedence) -> SyntaxResult<Expr> {
        self.nested(|p| p.parse_expression_inner(precedence))
    }

    fn parse_expression_inner(&mut self, precedence: Precedence) -> SyntaxResult<Expr> {
        let mut left = self.parse_prefix()?;
        while let Some((op, op_precedence)) = infix_operator(&self.cur.token) {
            if op_precedence <= precedence {
                break;
            }
            self.bump()?;
            let right = self.parse_expression(op_precedence)?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> SyntaxResult<Expr> {
        if matches!(self.cur.token, Token::EOF) {
            return Err(self.unexpected("an expression"));
        }
        let SpannedToken { token, span } = self.advance()?;
        let expr = match token {
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Int(text) => Expr::Int(text.parse().map_err(|_| {
                SyntaxError::new(
                    SyntaxErrorKind::InvalidNumber,
                    span,
                    format!("`{text}` does not fit in a 64-bit integer"),
                )
            })?),
            Token::Float(text) => match text.parse::<f64>() {
                Ok(x) if x.is_finite() => Expr::Float(x),
                _ => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::InvalidNumber,
                        span,
                        format!("`{text}` does not fit in a 64-bit float"),
                    ));
                }
            },
            Token::String(s) => Expr::Str(Rc::from(s.as_ref())),
            Token::Plus => self.parse_unary(UnaryOp::Plus)?,
            Token::Minus => self.parse_unary(UnaryOp::Minus)?,
            Token::Bang => self.parse_unary(UnaryOp::Not)?,
            Token::Identifier(name) => self.parse_postfix(name)?,
            Token::LParen => {
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(Token::RParen)?;
                inner
            }
            Token::LBracket => Expr::Array(self.parse_list(Token::RBracket)?),
            Token::LBrace => self.parse_map()?,
            Token::Len => {
                self.expect(Token::LParen)?;
                let subject = self.parse_expression(Precedence::Lowest)?;
                self.expect(Token::RParen)?;
                Expr::Len(Box::new(subject))
            }
            Token::Print => self.parse_print(false)?,
            Token::Println => self.parse_print(true)?,
            other => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::ExpectedExpression,
                    span,
                    format!("expected an expression, found `{other}`"),
                ));
            }
        };
        Ok(expr)
    }

    fn parse_print(&mut self, newline: bool) -> SyntaxResult<Expr> {
        self.expect(Token::LParen)?;
        Ok(Expr::Print { args: self.parse_list(Token::RParen)?, newline })
    }

    fn parse_unary(&mut self, op: UnaryOp) -> SyntaxResult<Expr> {
        let operand = self.parse_expression(Precedence::Prefix)?;
        Ok(Expr::unary(op, operand))
    }

    /// Call and index forms that may follow a name: `f(a, b)`, `xs[0]`, `m[a][b]`.
    fn parse_postfix(&mut self, name: &str) -> SyntaxResult<Expr> {
        let mut expr = if self.cur.token == Token::LParen {
            self.bump()?;
            Expr::Call { callee: name.to_string(), args: self.parse_list(Token::RParen)? }
        } else {
            Expr::ident(name)
        };
        while self.cur.token == Token::LBracket {
            self.bump()?;
            let index = self.parse_expression(Precedence::Lowest)?;
            self.expect(Token::RBracket)?;
            expr = Expr::index(expr, index);
        }
        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`; a trailing comma is fine.
    fn parse_list(&mut self, close: Token<'src>) -> SyntaxResult<Vec<Expr>> {
        let mut items = Vec::new();
        while self.cur.token != close {
            items.push(self.parse_expression(Precedence::Lowest)?);
            if self.cur.token == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_map(&mut self) -> SyntaxResult<Expr> {
        let mut entries = Vec::new();
        while self.cur.token != Token::RBrace {
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect(Token::Colon)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            entries.push((key, value));
            if self.cur.token == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Expr::Map(entries))
    }
}

impl<'src, I: Iterator<Item = SyntaxResult<SpannedToken<'src>>>> Iterator for Parser<'src, I> {
    type Item = SyntaxResult<Spanned<Stmt>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_statement() {
            Ok(Some(stmt)) => Some(Ok(stmt)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
