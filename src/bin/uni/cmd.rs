use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use clap_cargo::style::CLAP_STYLING;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;
use uni::{Session, Value};

#[derive(Debug, clap::Parser)]
#[command(about = "The Uni scripting language", version, styles = CLAP_STYLING)]
pub struct Cli {
    /// Script to run, or `-` to read it from stdin
    script: Option<String>,
    /// Evaluate code from the command line
    #[arg(short, long, conflicts_with = "script")]
    eval: Option<String>,
    /// Start the interactive prompt
    #[arg(short, long, conflicts_with_all = ["script", "eval"])]
    interactive: bool,
}

impl Cli {
    pub fn run(self) -> ExitCode {
        if let Some(code) = self.eval {
            run_source("<eval>", &code)
        } else if let Some(script) = self.script {
            if script == "-" { run_stdin() } else { run_file(&script) }
        } else if self.interactive || io::stdin().is_terminal() {
            run_repl()
        } else {
            run_stdin()
        }
    }
}

/// Installs a stderr logger when `UNI_LOG` (or else `RUST_LOG`) holds a filter.
pub fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let Ok(directives) = env::var("UNI_LOG").or_else(|_| env::var("RUST_LOG")) else {
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
        .with(EnvFilter::new(directives))
        .init();
}

/// Runs a whole program, reporting the first error against `filename`.
fn run_source(filename: &str, src: &str) -> ExitCode {
    let mut session = Session::new();
    match session.run(src) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(%err, "run failed");
            err.to_diagnostics().report(src, filename);
            ExitCode::FAILURE
        }
    }
}

fn run_file(script: &str) -> ExitCode {
    match fs::read_to_string(script) {
        Ok(src) => run_source(script, &src),
        Err(err) => {
            print_error!("Failed to read `{script}`: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_stdin() -> ExitCode {
    let mut src = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut src) {
        print_error!("Failed to read from stdin: {err}");
        return ExitCode::FAILURE;
    }
    run_source("<stdin>", &src)
}

/// Line-at-a-time prompt over one session. A line that leaves a block or a
/// literal open keeps reading until it is complete.
fn run_repl() -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            print_error!("Failed to start the prompt: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("Uni {} (type 'exit' or Ctrl+D to quit)", env!("CARGO_PKG_VERSION"));

    let mut session = Session::new();
    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() { ">> " } else { ".. " };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                print_error!("Failed to read input: {err}");
                return ExitCode::FAILURE;
            }
        };
        if pending.is_empty() && line.trim() == "exit" {
            break;
        }
        if pending.is_empty() && line.trim().is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str()).ok();

        pending.push_str(&line);
        pending.push('\n');
        match Session::check(&pending) {
            Err(err) if err.is_incomplete() => continue,
            _ => {}
        }

        let src = std::mem::take(&mut pending);
        match session.run(&src) {
            Ok(Value::Nil) => {}
            Ok(value) => println!("{value}"),
            Err(err) => err.to_diagnostics().report(&src, "<repl>"),
        }
    }
    ExitCode::SUCCESS
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
