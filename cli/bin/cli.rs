use clap::Parser;
use cli::{Cli, Commands, init_logging, run_eval, run_files, run_repl, run_stdin};
use colored::*;
use skeme::ErrorPolicy;
use std::io::{self, IsTerminal};
use std::{process, thread};
use tracing::debug;

// Evaluation recurses on the host stack, with no tail calls.
const STACK_SIZE: usize = 64 * 1024 * 1024;

fn dispatch(cli: Cli) -> Result<(), String> {
  let outcome = match cli.command {
    Some(Commands::Repl) => return run_repl(),
    None if io::stdin().is_terminal() => return run_repl(),
    None => run_stdin(ErrorPolicy::Abort)?,
    Some(Commands::Run {
      eval,
      keep_going,
      files,
    }) => {
      let policy = if keep_going {
        ErrorPolicy::Continue
      } else {
        ErrorPolicy::Abort
      };

      match (eval, files.is_empty()) {
        (Some(program), _) => run_eval(&program, policy)?,
        (None, false) => run_files(&files, policy)?,
        (None, true) => run_stdin(policy)?,
      }
    }
  };

  // Failed programs still exit normally; the diagnostic is on stdout.
  debug!(?outcome, "run finished");
  Ok(())
}

fn main() {
  init_logging();
  let cli = Cli::parse();

  let result = thread::Builder::new()
    .stack_size(STACK_SIZE)
    .spawn(move || dispatch(cli))
    .map_err(|e| format!("Failed to spawn interpreter thread: {}", e))
    .and_then(|handle| {
      handle
        .join()
        .map_err(|_| "Interpreter thread panicked".to_string())?
    });

  if let Err(e) = result {
    eprintln!("{} {}", "Error:".red().bold(), e);
    process::exit(1);
  }
}
