use colored::*;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Editor, Result as RustyResult};
use skeme::primitives::PRIMITIVES;
use skeme::{ErrorPolicy, Frame, Interpreter, Outcome, SpecialForm, StdioAdapter};
use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::helper::ReplHelper;
use super::input::{InputHandler, LineResult, handle_eof, handle_error, handle_interrupt};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_HISTORY_SIZE: usize = 1000;
const HISTORY_TAIL: usize = 20;

const COMMANDS: &[(&str, &str)] = &[
  (":help", "Show this help"),
  (":quit, :exit", "Leave the REPL"),
  (":history", "Show recent input"),
  (":load <file>", "Run a file in this session (alias :l)"),
];

const KEYS: &[(&str, &str)] = &[
  ("Up/Down", "Browse history"),
  ("Ctrl+R", "Search history"),
  ("Tab", "Complete names and :load paths"),
  ("Ctrl+C", "Drop the pending input"),
  ("Ctrl+D", "Leave the REPL"),
];

/// Where history lives and how much of it is kept, from `SKEME_REPL_HISTORY`
/// and `SKEME_REPL_HISTORY_SIZE`.
#[derive(Debug, PartialEq)]
struct HistoryConfig {
  file: PathBuf,
  size: usize,
}

impl HistoryConfig {
  fn from_env() -> Self {
    Self::resolve(
      env::var("SKEME_REPL_HISTORY").ok(),
      env::var("SKEME_REPL_HISTORY_SIZE").ok(),
      dirs::home_dir(),
    )
  }

  fn resolve(file: Option<String>, size: Option<String>, home: Option<PathBuf>) -> Self {
    let file = file.map(PathBuf::from).unwrap_or_else(|| {
      home
        .unwrap_or_default()
        .join(".skeme_history")
    });
    let size = size
      .and_then(|size| size.parse().ok())
      .unwrap_or(DEFAULT_HISTORY_SIZE);
    Self { file, size }
  }
}

/// A line starting with `:` is a session command rather than code.
#[derive(Debug, PartialEq)]
enum Command<'a> {
  Quit,
  Help,
  History,
  Load(Option<&'a str>),
  Unknown(&'a str),
}

impl<'a> Command<'a> {
  fn parse(line: &'a str) -> Option<Self> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
      ":quit" | ":exit" => Command::Quit,
      ":help" => Command::Help,
      ":history" => Command::History,
      ":l" | ":load" => Command::Load(words.next()),
      other if other.starts_with(':') => Command::Unknown(other),
      _ => return None,
    };
    Some(command)
  }
}

pub struct ReplSession {
  editor: Editor<ReplHelper, DefaultHistory>,
  history_file: PathBuf,
  input_handler: InputHandler,
}

impl ReplSession {
  pub fn new(global: Rc<Frame>) -> RustyResult<Self> {
    let config = HistoryConfig::from_env();
    let mut editor = Editor::new()?;
    editor.set_helper(Some(ReplHelper::new(Rc::clone(&global))));
    editor.set_max_history_size(config.size)?;

    if let Err(e) = editor.load_history(&config.file) {
      tracing::debug!(error = %e, file = %config.file.display(), "no history loaded");
    }

    Ok(Self {
      editor,
      history_file: config.file,
      input_handler: InputHandler::new(global),
    })
  }

  pub fn run(&mut self) -> RustyResult<()> {
    print_banner();

    loop {
      let prompt = self.prompt();
      let line = match self.editor.readline(&prompt) {
        Ok(line) => line,
        Err(ReadlineError::Interrupted) => {
          handle_interrupt(&mut self.input_handler);
          continue;
        }
        Err(ReadlineError::Eof) => {
          handle_eof();
          break;
        }
        Err(err) => {
          handle_error(err);
          break;
        }
      };

      if !self.input_handler.is_multiline() {
        if line.trim().is_empty() {
          continue;
        }
        if let Some(command) = Command::parse(&line) {
          if command == Command::Quit {
            handle_eof();
            break;
          }
          self.execute(command);
          continue;
        }
      }

      match self.input_handler.handle_line(line, &mut self.editor)? {
        LineResult::Complete(results) => {
          for result in results {
            println!("{} {}", "=>".bright_green().bold(), result.bright_white());
          }
        }
        LineResult::NeedMore => {}
        LineResult::Error(msg) => report(&msg),
      }
    }

    if let Err(e) = self.editor.save_history(&self.history_file) {
      eprintln!("Warning: Could not save history: {}", e);
    }

    Ok(())
  }

  fn prompt(&self) -> String {
    if self.input_handler.is_multiline() {
      format!("{} ", "....".bright_black())
    } else {
      format!(
        "{}{}> ",
        "skeme".bright_cyan().bold(),
        format!("[{}]", self.input_handler.line_number()).bright_black()
      )
    }
  }

  fn execute(&mut self, command: Command<'_>) {
    match command {
      Command::Quit => {}
      Command::Help => print_help(),
      Command::History => print_history(self.editor.history()),
      Command::Load(Some(file)) => self.load_file(Path::new(file)),
      Command::Load(None) => report(&format!("{} needs a file path", ":load".bright_green())),
      Command::Unknown(name) => report(&format!(
        "Unknown command {} (try {})",
        name.bright_yellow(),
        ":help".bright_green()
      )),
    }
  }

  /// Runs a file in the session's global frame, printing results the way
  /// `skeme run --keep-going` would.
  fn load_file(&mut self, path: &Path) {
    let shown = path.display().to_string();
    let Some(file) = path.to_str() else {
      report(&format!("Path is not valid UTF-8: {}", shown.bright_yellow()));
      return;
    };

    let mut io = StdioAdapter::new();
    let outcome = Interpreter::with_frame(&mut io, Rc::clone(self.input_handler.global()))
      .with_policy(ErrorPolicy::Continue)
      .load(file);

    match outcome {
      Ok(Outcome::Completed) => println!("{} {}", "loaded".bright_green(), shown.bright_cyan()),
      Ok(Outcome::Failed) => println!(
        "{} {} {}",
        "loaded".bright_yellow(),
        shown.bright_cyan(),
        "with errors".bright_yellow()
      ),
      Err(e) => report(&format!("Cannot read {}: {}", shown.bright_yellow(), e)),
    }
  }
}

fn report(message: &str) {
  eprintln!("{} {}", "Error:".red().bold(), message);
}

fn print_banner() {
  println!(
    "\n  {} {} {}",
    "Skeme".bright_cyan().bold(),
    VERSION.bright_black(),
    "a small Scheme".bright_white()
  );
  println!(
    "  {} {} {} {}\n",
    "Type".bright_white(),
    ":help".bright_green().bold(),
    "for help,".bright_white(),
    ":quit".bright_green().bold(),
  );
}

fn print_section(title: &str, rows: &[(&str, &str)]) {
  println!("\n  {}", title.bright_yellow().bold());
  for (key, description) in rows {
    println!("    {:16} {}", key.bright_green(), description);
  }
}

fn print_words(title: &str, words: &[&str]) {
  println!("\n  {}", title.bright_yellow().bold());
  println!("    {}", words.join(" ").bright_white());
}

fn print_help() {
  print_section("Commands", COMMANDS);
  print_section("Keys", KEYS);

  let forms: Vec<&str> = SpecialForm::ALL.iter().map(|form| form.keyword()).collect();
  let primitives: Vec<&str> = PRIMITIVES.iter().map(|(name, _)| *name).collect();
  print_words("Special forms", &forms);
  print_words("Primitives", &primitives);

  print_section(
    "Examples",
    &[
      ("(define sq (lambda (x) (* x x)))", ""),
      ("(sq 4)", "=> 16.000000"),
      ("(cons 1 2)", "=> (1 . 2)"),
    ],
  );
  println!();
}

fn print_history(history: &DefaultHistory) {
  if history.is_empty() {
    println!("  {}", "(no history yet)".bright_black().italic());
    return;
  }

  let start = history.len().saturating_sub(HISTORY_TAIL);
  if start > 0 {
    println!("  {}", format!("({} older entries)", start).bright_black());
  }
  for (index, entry) in history.iter().enumerate().skip(start) {
    println!("  {:>4}  {}", (index + 1).to_string().bright_black(), entry);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_command_parsing() {
    assert_eq!(Command::parse(":quit"), Some(Command::Quit));
    assert_eq!(Command::parse("  :exit  "), Some(Command::Quit));
    assert_eq!(Command::parse(":help"), Some(Command::Help));
    assert_eq!(Command::parse(":history"), Some(Command::History));
    assert_eq!(
      Command::parse(":l lib/util.scm"),
      Some(Command::Load(Some("lib/util.scm")))
    );
    assert_eq!(Command::parse(":load"), Some(Command::Load(None)));
    assert_eq!(Command::parse(":frobnicate"), Some(Command::Unknown(":frobnicate")));
    assert_eq!(Command::parse("(+ 1 2)"), None);
    assert_eq!(Command::parse("'sym"), None);
  }

  #[test]
  fn test_history_config_defaults() {
    let config = HistoryConfig::resolve(None, None, Some(PathBuf::from("/home/u")));
    assert_eq!(config.file, PathBuf::from("/home/u/.skeme_history"));
    assert_eq!(config.size, DEFAULT_HISTORY_SIZE);

    let config = HistoryConfig::resolve(None, Some("not a number".into()), None);
    assert_eq!(config.file, PathBuf::from(".skeme_history"));
    assert_eq!(config.size, DEFAULT_HISTORY_SIZE);
  }

  #[test]
  fn test_history_config_overrides() {
    let config = HistoryConfig::resolve(
      Some("/tmp/hist".into()),
      Some("50".into()),
      Some(PathBuf::from("/home/u")),
    );
    assert_eq!(
      config,
      HistoryConfig {
        file: PathBuf::from("/tmp/hist"),
        size: 50,
      }
    );
  }
}
