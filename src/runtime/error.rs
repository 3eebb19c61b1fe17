use std::fmt;

use crate::diagnostics::{AsStr, Diagnostics, Label, Span};

/// Faults that abort evaluation.
///
/// Type mismatches are not in here: those quietly evaluate to `nil`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Integer division with a zero divisor. Float division never faults.
    DivisionByZero,
    /// Array or string index outside `0..len`.
    IndexOutOfRange,
    /// Array or string indexed with something other than an integer.
    InvalidIndex,
    /// `if` or `while` condition that is not a boolean.
    ConditionNotBool,
    /// Map key that is not a boolean, number or string.
    InvalidMapKey,
    /// Calls nested deeper than the interpreter allows.
    CallDepthExceeded,
    /// Writing to the output sink failed.
    OutputFailed,
}

impl AsStr for RuntimeErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            RuntimeErrorKind::DivisionByZero => "Division by zero",
            RuntimeErrorKind::IndexOutOfRange => "Index out of range",
            RuntimeErrorKind::InvalidIndex => "Index must be an integer",
            RuntimeErrorKind::ConditionNotBool => "Condition must be a boolean",
            RuntimeErrorKind::InvalidMapKey => "Invalid map key",
            RuntimeErrorKind::CallDepthExceeded => "Maximum call depth exceeded",
            RuntimeErrorKind::OutputFailed => "Failed to write output",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// What went wrong and where, e.g. "index 3 is out of range for length 2 in `xs[3]`".
    pub context: String,
}

impl RuntimeError {
    #[cold]
    pub fn new(kind: RuntimeErrorKind, context: impl Into<String>) -> Self {
        RuntimeError { kind, context: context.into() }
    }

    /// Converts the error into a diagnostic labelled at `span`, normally the
    /// top-level statement that was running.
    pub fn to_diagnostics(&self, span: Span) -> Diagnostics {
        let mut diags = Diagnostics::default();
        diags.emit(
            span.clone(),
            "runtime",
            self.kind.as_str(),
            vec![Label { span, message: self.context.clone().into() }],
        );
        diags
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.context)
    }
}

impl std::error::Error for RuntimeError {}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
