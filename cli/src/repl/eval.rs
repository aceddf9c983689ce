use skeme::{Frame, Interpreter, ParseError, StdioAdapter};
use std::rc::Rc;

#[derive(Debug, PartialEq)]
pub enum InputError {
  /// The buffered text is a prefix of a complete program.
  Incomplete,
  Error(String),
}

impl From<skeme::Error> for InputError {
  fn from(err: skeme::Error) -> Self {
    match err {
      skeme::Error::Parse(ParseError::UnmatchedOpen) => InputError::Incomplete,
      other => InputError::Error(other.to_string()),
    }
  }
}

/// Evaluates every form in `input` against `global` and renders the results
/// worth showing. Nothing runs unless the whole input parses.
pub fn process_input(input: &str, global: &Rc<Frame>) -> Result<Vec<String>, InputError> {
  let mut io = StdioAdapter::new();
  let values = Interpreter::with_frame(&mut io, Rc::clone(global)).eval_source(input)?;

  Ok(
    values
      .iter()
      .filter(|value| !value.is_void())
      .map(|value| value.to_string())
      .collect(),
  )
}
