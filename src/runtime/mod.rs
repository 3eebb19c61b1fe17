//! Evaluation of parsed Uni programs.

pub mod env;
pub mod error;
pub mod interpreter;
pub mod ops;
pub mod value;

pub use env::{Environment, ScopeId};
pub use error::{RuntimeError, RuntimeErrorKind, RuntimeResult};
pub use interpreter::{Flow, Interpreter, Output};
pub use value::{Map, Value};
