use thiserror::Error;

use crate::tokenizer::{Token, tokenize};
use crate::value::{Value, list, list_with_tail};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
  #[error("Unexpected ')'")]
  UnmatchedClose,

  #[error("Input ended inside a list: missing ')'")]
  UnmatchedOpen,

  #[error("Misplaced '.'")]
  MisplacedDot,

  #[error("Quote is not followed by a datum")]
  DanglingQuote,
}

struct Reader<'a> {
  tokens: &'a [Token],
  position: usize,
}

impl<'a> Reader<'a> {
  fn peek(&self) -> Option<&'a Token> {
    self.tokens.get(self.position)
  }

  fn advance(&mut self) -> Option<&'a Token> {
    let token = self.peek()?;
    self.position += 1;
    Some(token)
  }

  /// Reads one datum. The caller has checked that a token is available.
  fn datum(&mut self) -> Result<Value, ParseError> {
    let Some(token) = self.advance() else {
      return Err(ParseError::UnmatchedOpen);
    };

    match token {
      Token::Open => self.list(),
      Token::Close => Err(ParseError::UnmatchedClose),
      Token::Dot => Err(ParseError::MisplacedDot),
      Token::Quote => match self.peek() {
        None | Some(Token::Close) | Some(Token::Dot) => Err(ParseError::DanglingQuote),
        Some(_) => Ok(list(vec![Value::symbol("quote"), self.datum()?])),
      },
      Token::Integer(n) => Ok(Value::Integer(*n)),
      Token::Double(n) => Ok(Value::Double(*n)),
      Token::Boolean(b) => Ok(Value::Boolean(*b)),
      Token::Str(text) => Ok(Value::String(text.clone())),
      Token::Symbol(name) => Ok(Value::Symbol(name.clone())),
    }
  }

  /// Reads the rest of a list whose `(` was just consumed.
  fn list(&mut self) -> Result<Value, ParseError> {
    let mut items = Vec::new();

    loop {
      match self.peek() {
        None => return Err(ParseError::UnmatchedOpen),
        Some(Token::Close) => {
          self.position += 1;
          return Ok(list(items));
        }
        Some(Token::Dot) => {
          self.position += 1;
          return self.dotted_tail(items);
        }
        Some(_) => items.push(self.datum()?),
      }
    }
  }

  fn dotted_tail(&mut self, items: Vec<Value>) -> Result<Value, ParseError> {
    if items.is_empty() {
      return Err(ParseError::MisplacedDot);
    }

    let tail = match self.peek() {
      None => return Err(ParseError::UnmatchedOpen),
      Some(Token::Close | Token::Dot) => return Err(ParseError::MisplacedDot),
      Some(_) => self.datum()?,
    };

    match self.advance() {
      None => Err(ParseError::UnmatchedOpen),
      Some(Token::Close) => Ok(list_with_tail(items, tail)),
      Some(_) => Err(ParseError::MisplacedDot),
    }
  }
}

/// Builds the program tree: `Empty` when there are no forms, otherwise a
/// proper list of the top-level forms in source order.
pub fn parse(tokens: &[Token]) -> Result<Value, ParseError> {
  let mut reader = Reader {
    tokens,
    position: 0,
  };
  let mut forms = Vec::new();

  while reader.peek().is_some() {
    forms.push(reader.datum()?);
  }

  Ok(list(forms))
}

/// Tokenizes and parses `source` in one step.
pub fn read(source: &str) -> Result<Value, crate::Error> {
  let tokens = tokenize(source)?;
  Ok(parse(&tokens)?)
}
