//! The command line interface for the Uni interpreter.

use std::process::ExitCode;

use clap::Parser;

macro_rules! print_error {
    ($($arg:tt)*) => {
        eprintln!("\x1b[1;31merror:\x1b[0m {}", format!($($arg)*))
    }
}

mod cmd;

fn main() -> ExitCode {
    cmd::init_tracing();
    cmd::Cli::parse().run()
}
