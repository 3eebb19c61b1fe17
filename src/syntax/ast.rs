//! The abstract syntax tree (AST) representation for Uni.
//!
//! Nodes own their children and carry no source positions, so two trees
//! compare equal exactly when they are syntactically the same. The `Display`
//! implementations print source text that parses back to an equal tree.

use std::fmt;
use std::rc::Rc;

use crate::diagnostics::Span;

/// A node together with the source range it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var x = 1` when `is_new`, `x = 1` otherwise.
    Var { name: String, value: Expr, is_new: bool },
    /// `xs[0] = 1` or `m["k"] = 1`.
    SetIndex { subject: Expr, index: Expr, value: Expr },
    /// Conditional with optional else block.
    If { condition: Expr, consequence: Block, alternative: Option<Block> },
    /// Loop that runs the body while the condition is true.
    While { condition: Expr, body: Block },
    /// `for k, v in subject { ... }`; `value` is absent in the one-variable form.
    For { key: String, value: Option<String>, subject: Expr, body: Block },
    /// Function declaration, shared with every scope that registers it.
    Function(Rc<FunctionDecl>),
    Return(Expr),
    Block(Block),
    Expr(Expr),
}

/// A `{ ... }` sequence of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    #[inline]
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// `fn name(params) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Array(Vec<Expr>),
    /// Entries in source order.
    Map(Vec<(Expr, Expr)>),
    Identifier(String),
    Index { subject: Box<Expr>, index: Box<Expr> },
    Call { callee: String, args: Vec<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Len(Box<Expr>),
    /// `print(...)`, or `println(...)` when `newline` is set.
    Print { args: Vec<Expr>, newline: bool },
}

impl Expr {
    #[inline]
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    #[inline]
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary { op, operand: Box::new(operand) }
    }

    #[inline]
    pub fn index(subject: Expr, index: Expr) -> Self {
        Expr::Index { subject: Box::new(subject), index: Box::new(index) }
    }

    #[inline]
    pub fn ident(name: &str) -> Self {
        Expr::Identifier(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Or,
    And,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl UnaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes `items` separated by `", "`.
fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Writes a string literal with the escapes the scanner understands.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{")?;
        for stmt in &self.statements {
            write!(f, " {stmt}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        write_list(f, &self.params)?;
        write!(f, ") {}", self.body)
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Var { name, value, is_new: true } => write!(f, "var {name} = {value};"),
            Stmt::Var { name, value, is_new: false } => write!(f, "{name} = {value};"),
            Stmt::SetIndex { subject, index, value } => {
                write!(f, "{subject}[{index}] = {value};")
            }
            Stmt::If { condition, consequence, alternative } => {
                write!(f, "if {condition} {consequence}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {alt}")?;
                }
                Ok(())
            }
            Stmt::While { condition, body } => write!(f, "while {condition} {body}"),
            Stmt::For { key, value, subject, body } => match value {
                Some(value) => write!(f, "for {key}, {value} in {subject} {body}"),
                None => write!(f, "for {key} in {subject} {body}"),
            },
            Stmt::Function(decl) => write!(f, "{decl}"),
            Stmt::Return(value) => write!(f, "return {value};"),
            Stmt::Block(block) => write!(f, "{block}"),
            // A leading `{` would read back as a block
            Stmt::Expr(expr @ Expr::Map(_)) => write!(f, "({expr});"),
            Stmt::Expr(expr) => write!(f, "{expr};"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Int(n) => write!(f, "{n}"),
            // Positional notation only; the scanner has no exponent syntax
            Expr::Float(x) => {
                let text = x.to_string();
                f.write_str(&text)?;
                if !text.contains('.') {
                    f.write_str(".0")?;
                }
                Ok(())
            }
            Expr::Str(s) => write_quoted(f, s),
            Expr::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expr::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Expr::Identifier(name) => f.write_str(name),
            Expr::Index { subject, index } => write!(f, "{subject}[{index}]"),
            Expr::Call { callee, args } => {
                write!(f, "{callee}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Unary { op, operand } => write!(f, "({op}{operand})"),
            Expr::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::Len(subject) => write!(f, "len({subject})"),
            Expr::Print { args, newline } => {
                f.write_str(if *newline { "println(" } else { "print(" })?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_and_return_forms() {
        let decl = Stmt::Var { name: "x".into(), value: Expr::Int(5), is_new: true };
        assert_eq!(decl.to_string(), "var x = 5;");
        let assign = Stmt::Var { name: "x".into(), value: Expr::ident("y"), is_new: false };
        assert_eq!(assign.to_string(), "x = y;");
        assert_eq!(Stmt::Return(Expr::ident("x")).to_string(), "return x;");
    }

    #[test]
    fn test_binary_is_parenthesized() {
        let expr = Expr::binary(
            Expr::binary(Expr::Int(1), BinaryOp::Add, Expr::Int(2)),
            BinaryOp::Mul,
            Expr::Int(3),
        );
        assert_eq!(expr.to_string(), "((1 + 2) * 3)");
    }

    #[test]
    fn test_literals_keep_their_kind() {
        assert_eq!(Expr::Float(2.0).to_string(), "2.0");
        assert_eq!(Expr::Float(0.25).to_string(), "0.25");
        assert_eq!(Expr::Float(1e-7).to_string(), "0.0000001");
        assert_eq!(Expr::Float(1e20).to_string(), "100000000000000000000.0");
        assert_eq!(Expr::Str("say \"hi\"\n".into()).to_string(), r#""say \"hi\"\n""#);
    }
}
