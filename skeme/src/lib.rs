pub mod eval;
pub mod frame;
pub mod interpreter;
pub mod io;
pub mod parser;
pub mod primitives;
pub mod special_forms;
pub mod tokenizer;
pub mod value;

pub use eval::{EvalError, apply, evaluate};
pub use frame::Frame;
pub use interpreter::{ErrorPolicy, Interpreter, Outcome};
pub use io::{IoAdapter, StdioAdapter, StringIoAdapter};
pub use parser::{ParseError, parse, read};
pub use primitives::global_frame;
pub use special_forms::SpecialForm;
pub use tokenizer::{Token, TokenizeError, tokenize};
pub use value::Value;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Syntax error: {0}")]
  Tokenize(#[from] TokenizeError),

  #[error("Syntax error: {0}")]
  Parse(#[from] ParseError),

  #[error("Evaluation error: {0}")]
  Eval(#[from] EvalError),
}
