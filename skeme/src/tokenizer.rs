use ecow::EcoString;
use nom::{
  IResult, Parser,
  branch::alt,
  bytes::complete::{tag, take_while},
  character::complete::{char, digit1, multispace1, one_of, satisfy},
  combinator::{map, map_res, not, opt, recognize, value},
  multi::many0,
  sequence::{delimited, preceded},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
  Open,
  Close,
  Quote,
  Dot,
  Integer(i64),
  Double(f64),
  Boolean(bool),
  Str(EcoString),
  Symbol(EcoString),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenizeError {
  #[error("Unterminated string: {0}")]
  UnterminatedString(String),

  #[error("Invalid boolean: {0}")]
  InvalidBoolean(String),

  #[error("Invalid number: {0}")]
  InvalidNumber(String),

  #[error("Untokenizable input: {0}")]
  Untokenizable(String),
}

#[inline]
fn is_delimiter(c: char) -> bool {
  c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"' | ';')
}

#[inline]
fn is_symbol_initial(c: char) -> bool {
  c.is_alphabetic() || "!$%&*/:<=>?~_^".contains(c)
}

#[inline]
fn is_symbol_subsequent(c: char) -> bool {
  is_symbol_initial(c) || c.is_ascii_digit() || matches!(c, '.' | '+' | '-')
}

/// Rejects a match that runs straight into another atom, so `12abc` is an
/// error rather than a number followed by a symbol.
#[inline]
fn with_delimiter_check<'a, O, F>(mut parser: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
  F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
  move |i: &'a str| {
    let (rest, value) = parser.parse(i)?;
    if let Some(next_char) = rest.chars().next()
      && !is_delimiter(next_char)
    {
      return Err(nom::Err::Failure(nom::error::Error::new(
        i,
        nom::error::ErrorKind::Verify,
      )));
    }
    Ok((rest, value))
  }
}

fn punctuation(i: &str) -> IResult<&str, Token> {
  alt((
    value(Token::Open, char('(')),
    value(Token::Close, char(')')),
    value(Token::Quote, char('\'')),
  ))
  .parse(i)
}

fn double(i: &str) -> IResult<&str, Token> {
  with_delimiter_check(map_res(
    alt((
      recognize((opt(one_of("+-")), digit1, char('.'), opt(digit1))),
      recognize((opt(one_of("+-")), char('.'), digit1)),
    )),
    |s: &str| s.parse::<f64>().map(Token::Double),
  ))(i)
}

fn integer(i: &str) -> IResult<&str, Token> {
  with_delimiter_check(map_res(recognize((opt(one_of("+-")), digit1)), |s: &str| {
    s.parse::<i64>().map(Token::Integer)
  }))(i)
}

fn boolean(i: &str) -> IResult<&str, Token> {
  with_delimiter_check(alt((
    value(Token::Boolean(true), tag("#t")),
    value(Token::Boolean(false), tag("#f")),
  )))(i)
}

/// Strings stay on one line and carry no escapes.
fn string(i: &str) -> IResult<&str, Token> {
  with_delimiter_check(map(
    delimited(char('"'), take_while(|c: char| c != '"' && c != '\n'), char('"')),
    |text: &str| Token::Str(text.into()),
  ))(i)
}

/// A bare `+` or `-` is a symbol unless a number follows it.
fn symbol(i: &str) -> IResult<&str, Token> {
  with_delimiter_check(map(
    alt((
      recognize((satisfy(is_symbol_initial), take_while(is_symbol_subsequent))),
      recognize((
        one_of("+-"),
        not(satisfy(|c| c.is_ascii_digit() || c == '.')),
        take_while(is_symbol_subsequent),
      )),
    )),
    |name: &str| Token::Symbol(name.into()),
  ))(i)
}

fn dot(i: &str) -> IResult<&str, Token> {
  with_delimiter_check(value(Token::Dot, char('.')))(i)
}

fn token(i: &str) -> IResult<&str, Token> {
  alt((punctuation, double, integer, boolean, string, symbol, dot)).parse(i)
}

#[inline]
fn parse_comment(i: &str) -> IResult<&str, ()> {
  value((), preceded(char(';'), take_while(|c: char| c != '\n'))).parse(i)
}

#[inline]
fn skip_ws_and_comments(i: &str) -> IResult<&str, ()> {
  value((), many0(alt((value((), multispace1), parse_comment)))).parse(i)
}

/// Names what went wrong at `rest`, where no token could be read.
fn classify(rest: &str) -> TokenizeError {
  let mut chars = rest.chars();
  let first = chars.next();
  let second = chars.next();

  match first {
    Some('"') => {
      let line = rest.lines().next().unwrap_or(rest);
      if line[1..].contains('"') {
        TokenizeError::Untokenizable(snippet(rest))
      } else {
        TokenizeError::UnterminatedString(line.to_string())
      }
    }
    Some('#') => TokenizeError::InvalidBoolean(snippet(rest)),
    Some(c) if c.is_ascii_digit() => TokenizeError::InvalidNumber(snippet(rest)),
    Some('+' | '-' | '.') if second.is_some_and(|c| c.is_ascii_digit()) => {
      TokenizeError::InvalidNumber(snippet(rest))
    }
    _ => TokenizeError::Untokenizable(snippet(rest)),
  }
}

fn snippet(rest: &str) -> String {
  rest
    .split(char::is_whitespace)
    .next()
    .unwrap_or(rest)
    .chars()
    .take(20)
    .collect()
}

/// Splits `source` into tokens. Whitespace and `;` comments separate tokens
/// and are dropped.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizeError> {
  let mut tokens = Vec::new();
  let mut input = source;

  loop {
    input = match skip_ws_and_comments(input) {
      Ok((rest, _)) => rest,
      Err(_) => input,
    };

    if input.is_empty() {
      return Ok(tokens);
    }

    match token(input) {
      Ok((rest, token)) => {
        tokens.push(token);
        input = rest;
      }
      Err(_) => return Err(classify(input)),
    }
  }
}
