mod repl;

use clap::{Parser, Subcommand};
use skeme::{ErrorPolicy, Frame, Interpreter, Outcome, StdioAdapter, global_frame};
use std::env;
use std::io::{self, Read};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::repl::ReplSession;

#[derive(Parser)]
#[command(name = "skeme")]
#[command(about = "Skeme - A small Scheme interpreter", long_about = None)]
#[command(version)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Start an interactive REPL
  Repl,
  /// Run a Skeme program (read from stdin when no file is given)
  Run {
    /// Evaluate a program given on the command line
    #[arg(short, long)]
    eval: Option<String>,
    /// Report a failing top-level form and keep going instead of stopping
    #[arg(short, long)]
    keep_going: bool,
    /// Source files, run in order against one global frame
    #[arg(value_name = "FILES")]
    files: Vec<String>,
  },
}

/// Installs the stderr log subscriber, filtered by `SKEME_LOG`.
pub fn init_logging() {
  let filter = EnvFilter::try_from_env("SKEME_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .try_init();
}

fn get_prelude_path() -> Option<PathBuf> {
  if let Ok(path) = env::var("SKEME_PRELUDE") {
    return Some(PathBuf::from(path));
  }

  let mut home = dirs::home_dir()?;
  home.push(".skeme");
  home.push("prelude.scm");
  home.exists().then_some(home)
}

/// The global frame every run starts from: primitives plus whatever the
/// prelude defines.
pub fn prepare_global() -> Result<Rc<Frame>, String> {
  let global = global_frame();

  if let Some(path) = get_prelude_path() {
    let source = std::fs::read_to_string(&path)
      .map_err(|e| format!("Failed to read prelude '{}': {}", path.display(), e))?;

    let mut io = StdioAdapter::new();
    Interpreter::with_frame(&mut io, Rc::clone(&global))
      .eval_source(&source)
      .map_err(|e| format!("In prelude '{}': {}", path.display(), e))?;
    debug!(path = %path.display(), "prelude loaded");
  }

  Ok(global)
}

pub fn run_repl() -> Result<(), String> {
  let global = prepare_global()?;
  let mut session =
    ReplSession::new(global).map_err(|e| format!("Failed to initialize REPL: {}", e))?;
  session.run().map_err(|e| format!("REPL error: {}", e))
}

pub fn run_eval(program: &str, policy: ErrorPolicy) -> Result<Outcome, String> {
  let global = prepare_global()?;
  let mut io = StdioAdapter::new();
  Interpreter::with_frame(&mut io, global)
    .with_policy(policy)
    .run(program)
    .map_err(|e| format!("Failed to write output: {}", e))
}

/// Runs each file in turn. Under [`ErrorPolicy::Abort`] a failing file stops
/// the remaining ones.
pub fn run_files(paths: &[String], policy: ErrorPolicy) -> Result<Outcome, String> {
  let global = prepare_global()?;
  let mut io = StdioAdapter::new();
  let mut interpreter = Interpreter::with_frame(&mut io, global).with_policy(policy);
  let mut outcome = Outcome::Completed;

  for path in paths {
    let result = interpreter
      .load(path)
      .map_err(|e| format!("Failed to run file '{}': {}", path, e))?;

    if result == Outcome::Failed {
      outcome = Outcome::Failed;
      if policy == ErrorPolicy::Abort {
        break;
      }
    }
  }

  Ok(outcome)
}

pub fn run_stdin(policy: ErrorPolicy) -> Result<Outcome, String> {
  let mut program = String::new();
  io::stdin()
    .read_to_string(&mut program)
    .map_err(|e| format!("Failed to read stdin: {}", e))?;
  run_eval(&program, policy)
}
