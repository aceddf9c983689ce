use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};

/// Where the interpreter sends its output and finds source files.
pub trait IoAdapter {
  fn print(&mut self, text: &str) -> io::Result<()>;

  fn println(&mut self, text: &str) -> io::Result<()> {
    self.print(text)?;
    self.print("\n")
  }

  fn read_file(&self, path: &str) -> io::Result<String>;
}

pub struct StdioAdapter {
  stdout: io::Stdout,
}

impl StdioAdapter {
  pub fn new() -> Self {
    Self {
      stdout: io::stdout(),
    }
  }
}

impl Default for StdioAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl IoAdapter for StdioAdapter {
  fn print(&mut self, text: &str) -> io::Result<()> {
    write!(self.stdout, "{}", text)?;
    self.stdout.flush()
  }

  fn read_file(&self, path: &str) -> io::Result<String> {
    fs::read_to_string(path)
  }
}

/// Collects output in memory and serves files from a fixed table.
#[derive(Default)]
pub struct StringIoAdapter {
  files: HashMap<String, String>,
  output: String,
}

impl StringIoAdapter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
    self.files.insert(path.into(), contents.into());
    self
  }

  pub fn output(&self) -> &str {
    &self.output
  }

  pub fn take_output(&mut self) -> String {
    std::mem::take(&mut self.output)
  }
}

impl IoAdapter for StringIoAdapter {
  fn print(&mut self, text: &str) -> io::Result<()> {
    self.output.push_str(text);
    Ok(())
  }

  fn read_file(&self, path: &str) -> io::Result<String> {
    self.files.get(path).cloned().ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::NotFound,
        format!("{path}: no such file in StringIoAdapter"),
      )
    })
  }
}
