//! Scanning and parsing of Uni source text.

pub mod ast;
pub mod error;
pub mod parser;
pub mod scanner;
pub mod token;

pub use error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
pub use parser::Parser;
pub use scanner::Lexer;
