use std::io;
use std::rc::Rc;

use tracing::debug;

use crate::Error;
use crate::eval::evaluate;
use crate::frame::Frame;
use crate::io::IoAdapter;
use crate::parser::read;
use crate::primitives::global_frame;
use crate::value::Value;

/// What the driver does once a top-level form fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
  /// Stop at the first failing form.
  #[default]
  Abort,
  /// Report the failure and go on with the next form.
  Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Completed,
  /// At least one diagnostic was printed.
  Failed,
}

/// Runs whole programs against one global frame, printing each top-level
/// result through an [`IoAdapter`].
pub struct Interpreter<'io> {
  io: &'io mut dyn IoAdapter,
  global: Rc<Frame>,
  policy: ErrorPolicy,
}

impl<'io> Interpreter<'io> {
  pub fn new(io: &'io mut dyn IoAdapter) -> Self {
    Self::with_frame(io, global_frame())
  }

  pub fn with_frame(io: &'io mut dyn IoAdapter, global: Rc<Frame>) -> Self {
    Self {
      io,
      global,
      policy: ErrorPolicy::default(),
    }
  }

  pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn global(&self) -> &Rc<Frame> {
    &self.global
  }

  /// Evaluates every top-level form of `program` in order. Each result other
  /// than void is printed on its own line; a failure prints one diagnostic
  /// line and, under [`ErrorPolicy::Abort`], ends the run.
  pub fn interpret(&mut self, program: &Value) -> io::Result<Outcome> {
    debug!(forms = program.sequence_length(), "interpreting program");
    let mut outcome = Outcome::Completed;

    for form in program.iter() {
      match evaluate(form, &self.global) {
        Ok(value) if value.is_void() => {}
        Ok(value) => self.io.println(&value.to_string())?,
        Err(error) => {
          debug!(%error, %form, "top-level form failed");
          self.io.println(&Error::from(error).to_string())?;
          outcome = Outcome::Failed;
          if self.policy == ErrorPolicy::Abort {
            break;
          }
        }
      }
    }

    Ok(outcome)
  }

  /// Reads and interprets `source`. A syntax error anywhere in the source is
  /// reported before any form runs.
  pub fn run(&mut self, source: &str) -> io::Result<Outcome> {
    match read(source) {
      Ok(program) => self.interpret(&program),
      Err(error) => {
        debug!(%error, "source rejected");
        self.io.println(&error.to_string())?;
        Ok(Outcome::Failed)
      }
    }
  }

  /// Runs the file at `path`, read through the adapter.
  pub fn load(&mut self, path: &str) -> io::Result<Outcome> {
    debug!(path, "loading file");
    let source = self.io.read_file(path)?;
    self.run(&source)
  }

  /// Evaluates `source` without printing anything and returns the value of
  /// each form. Stops at the first error.
  pub fn eval_source(&mut self, source: &str) -> Result<Vec<Value>, Error> {
    let program = read(source)?;
    let mut values = Vec::new();
    for form in program.iter() {
      values.push(evaluate(form, &self.global)?);
    }
    Ok(values)
  }
}
