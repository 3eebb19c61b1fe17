#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

pub mod diagnostics;
pub mod runtime;
pub mod session;
pub mod syntax;

pub use runtime::{Interpreter, Value};
pub use session::{RunError, Session};

pub const KIBI: usize = 1024;
pub const MEBI: usize = KIBI * KIBI;

// Stack headroom checked before each recursive step, and the size of each new segment
const RED_ZONE: usize = 64 * KIBI;
const STACK_PER_RECURSION: usize = MEBI;

/// Runs `f`, first growing the host stack when less than the red zone is left.
///
/// The parser and the evaluator both recurse on nested input through this.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
