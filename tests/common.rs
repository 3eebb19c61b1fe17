use uni::syntax::parser::Parser;
use uni::syntax::scanner::Lexer;
use uni::{Interpreter, RunError, Session, Value};

#[allow(dead_code)]
pub fn parse_from_source<'src>(src: &'src str) -> Parser<'src, Lexer<'src>> {
    let lexer = Lexer::new(src);
    Parser::new(lexer)
}

/// Runs `src` in a fresh session and returns the result together with everything it printed.
#[allow(dead_code)]
pub fn run_captured(src: &str) -> (Result<Value, RunError>, String) {
    let mut session = Session::with_interpreter(Interpreter::capturing());
    let result = session.run(src);
    let output = session.interpreter_mut().take_captured();
    (result, output)
}
