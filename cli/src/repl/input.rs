use colored::*;
use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::{Editor, Helper, Result as RustyResult};
use skeme::Frame;
use std::rc::Rc;

use super::eval::{InputError, process_input};

/// Buffers lines until they form a complete program, then evaluates it.
pub struct InputHandler {
  buffer: String,
  line_number: usize,
  global: Rc<Frame>,
}

impl InputHandler {
  pub fn new(global: Rc<Frame>) -> Self {
    Self {
      buffer: String::new(),
      line_number: 1,
      global,
    }
  }

  pub fn line_number(&self) -> usize {
    self.line_number
  }

  pub fn is_multiline(&self) -> bool {
    !self.buffer.is_empty()
  }

  pub fn clear_buffer(&mut self) {
    self.buffer.clear();
  }

  pub fn global(&self) -> &Rc<Frame> {
    &self.global
  }

  pub fn handle_line<H: Helper, I: History>(
    &mut self,
    line: String,
    editor: &mut Editor<H, I>,
  ) -> RustyResult<LineResult> {
    if !self.buffer.is_empty() {
      self.buffer.push('\n');
    }
    self.buffer.push_str(&line);

    match process_input(&self.buffer, &self.global) {
      Ok(results) => {
        editor.add_history_entry(self.buffer.as_str())?;
        self.buffer.clear();
        self.line_number += 1;
        Ok(LineResult::Complete(results))
      }
      Err(InputError::Incomplete) => Ok(LineResult::NeedMore),
      Err(InputError::Error(msg)) => {
        editor.add_history_entry(self.buffer.as_str())?;
        self.buffer.clear();
        Ok(LineResult::Error(msg))
      }
    }
  }
}

pub enum LineResult {
  Complete(Vec<String>),
  NeedMore,
  Error(String),
}

pub fn handle_interrupt(handler: &mut InputHandler) {
  println!("{}", "^C".yellow());
  handler.clear_buffer();
}

pub fn handle_eof() {
  println!(
    "\n{} {}",
    "👋".bright_yellow(),
    "Thanks for using Skeme! Goodbye!".bright_cyan().italic()
  );
}

pub fn handle_error(err: ReadlineError) {
  eprintln!("{} {:?}", "Error:".red().bold(), err);
}
