use std::fmt;

use crate::diagnostics::{AsStr, Diagnostics, Label, Span};

/// Every fatal condition the scanner or the parser can hit.
///
/// There is no recovery: the first one ends the token/statement stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A character that starts no token.
    UnexpectedChar,
    /// A number with several dots, no digit after the dot, a letter glued to it,
    /// or a literal that does not fit in 64 bits.
    InvalidNumber,
    /// A string literal without its closing quote.
    UnterminatedString,
    /// A backslash followed by something other than `n`, `t`, `"` or `\`.
    InvalidStringEscape,
    /// A specific token was required but something else showed up.
    ExpectedToken,
    /// An expression was required but the token cannot start one.
    ExpectedExpression,
    /// The only legal target for an assignment is a name or an indexed name.
    InvalidAssignmentTarget,
    /// Input ended in the middle of a construct.
    UnexpectedEof,
    /// Expressions or blocks nested past the parser's depth limit.
    NestingTooDeep,
}

impl AsStr for SyntaxErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            SyntaxErrorKind::UnexpectedChar => "Unexpected character",
            SyntaxErrorKind::InvalidNumber => "Invalid number literal",
            SyntaxErrorKind::UnterminatedString => "Unterminated string",
            SyntaxErrorKind::InvalidStringEscape => "Invalid escape sequence",
            SyntaxErrorKind::ExpectedToken => "Unexpected token",
            SyntaxErrorKind::ExpectedExpression => "Expected an expression",
            SyntaxErrorKind::InvalidAssignmentTarget => "Invalid assignment target",
            SyntaxErrorKind::UnexpectedEof => "Unexpected end of input",
            SyntaxErrorKind::NestingTooDeep => "Nesting too deep",
        }
    }
}

/// A fatal lexical or grammatical error, with the offending location.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
    /// Human-readable detail, e.g. "expected `)`, found `}`".
    pub detail: String,
}

impl SyntaxError {
    #[cold]
    pub fn new(kind: SyntaxErrorKind, span: Span, detail: impl Into<String>) -> Self {
        SyntaxError { kind, span, detail: detail.into() }
    }

    /// Converts the error into a single-entry diagnostics collection.
    pub fn to_diagnostics(&self) -> Diagnostics {
        let mut diags = Diagnostics::default();
        diags.emit(
            self.span.clone(),
            "syntax",
            self.kind.as_str(),
            vec![Label { span: self.span.clone(), message: self.detail.clone().into() }],
        );
        diags
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (at {}..{})", self.kind.as_str(), self.detail, self.span.start, self.span.end)
    }
}

impl std::error::Error for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;
