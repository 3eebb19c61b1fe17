//! Drives the scanner, the parser and the interpreter over a piece of source text.

use std::fmt;

use tracing::{debug, trace};

use crate::diagnostics::{Diagnostics, Span};
use crate::runtime::{Interpreter, RuntimeError, Value};
use crate::syntax::ast::Spanned;
use crate::syntax::{Parser, SyntaxError, SyntaxErrorKind};

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    Syntax(SyntaxError),
    /// A runtime fault, with the span of the top-level statement that raised it.
    Runtime { error: RuntimeError, span: Span },
}

impl RunError {
    pub fn to_diagnostics(&self) -> Diagnostics {
        match self {
            RunError::Syntax(err) => err.to_diagnostics(),
            RunError::Runtime { error, span } => error.to_diagnostics(span.clone()),
        }
    }

    /// Whether more input could still turn this into a valid program.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, RunError::Syntax(err) if err.kind == SyntaxErrorKind::UnexpectedEof)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Syntax(err) => write!(f, "{err}"),
            RunError::Runtime { error, .. } => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<SyntaxError> for RunError {
    fn from(err: SyntaxError) -> Self {
        RunError::Syntax(err)
    }
}

/// A long-lived interpreter that source text can be fed to piece by piece.
///
/// Global bindings survive between calls to [`Session::run`], including
/// the ones made before a fault.
#[derive(Debug, Default)]
pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    /// A session that prints to stdout.
    pub fn new() -> Self {
        Session { interpreter: Interpreter::new() }
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Session { interpreter }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Runs `src` and returns the value of its last statement.
    ///
    /// Statements are parsed and evaluated one at a time, so everything before
    /// a syntax error has already run when the error comes back.
    pub fn run(&mut self, src: &str) -> Result<Value, RunError> {
        debug!(bytes = src.len(), "run");
        let mut last = Value::Nil;
        for stmt in Parser::from_source(src) {
            let Spanned { node, span } = stmt?;
            trace!(range = ?span, "evaluating statement");
            last = self
                .interpreter
                .exec(&node)
                .map_err(|error| RunError::Runtime { error, span })?;
        }
        Ok(last)
    }

    /// Checks that `src` parses, without running anything.
    pub fn check(src: &str) -> Result<(), RunError> {
        Parser::from_source(src).parse_program()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeErrorKind;

    #[test]
    fn test_output_before_syntax_error_is_kept() {
        let mut session = Session::with_interpreter(Interpreter::capturing());
        let err = session.run("println(1)\nprintln(2)\nvar = 3").unwrap_err();
        assert!(matches!(err, RunError::Syntax(_)));
        assert_eq!(session.interpreter().captured(), "1\n2\n");
    }

    #[test]
    fn test_runtime_error_points_at_statement() {
        let src = "var a = 1\nvar b = a / 0";
        let mut session = Session::with_interpreter(Interpreter::capturing());
        match session.run(src).unwrap_err() {
            RunError::Runtime { error, span } => {
                assert_eq!(error.kind, RuntimeErrorKind::DivisionByZero);
                assert_eq!(&src[span], "var b = a / 0");
            }
            other => panic!("expected a runtime error, got {other:?}"),
        }
        // Bindings made before the fault persist
        assert_eq!(session.interpreter().global("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_unfinished_input_is_incomplete() {
        assert!(Session::check("fn f() {").unwrap_err().is_incomplete());
        assert!(!Session::check("fn f() }").unwrap_err().is_incomplete());
        assert!(Session::check("fn f() { return 1 }").is_ok());
    }
}
