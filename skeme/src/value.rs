use std::{fmt, mem, rc::Rc};

use ecow::EcoString;

use crate::eval::EvalError;
use crate::frame::Frame;

/// Host function behind a primitive procedure. It receives the whole evaluated
/// argument list as one list value and validates its own shape.
pub type PrimitiveFn = fn(&Value) -> Result<Value, EvalError>;

#[derive(Debug, Clone)]
pub enum Value {
  Integer(i64),
  Double(f64),
  Boolean(bool),
  String(EcoString),
  Symbol(EcoString),
  Pair(Rc<Value>, Rc<Value>),
  /// The empty list, terminator of every proper list.
  Empty,
  /// Result of side-effecting forms. Never printed.
  Void,
  Closure(Rc<Closure>),
  Primitive(Primitive),
}

/// A procedure created by `lambda`.
///
/// `formals` is a possibly improper list of symbols, `body` a proper list of
/// expressions. The defining frame is shared, so it stays alive for as long as
/// the closure does.
pub struct Closure {
  pub formals: Value,
  pub body: Value,
  pub frame: Rc<Frame>,
}

impl fmt::Debug for Closure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // The captured frame may hold this very closure, so it is left out.
    f.debug_struct("Closure")
      .field("formals", &self.formals)
      .field("body", &self.body)
      .finish_non_exhaustive()
  }
}

#[derive(Clone, Copy)]
pub struct Primitive {
  pub name: &'static str,
  pub func: PrimitiveFn,
}

impl fmt::Debug for Primitive {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#<primitive {}>", self.name)
  }
}

impl PartialEq for Primitive {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}

/// Unlinks uniquely owned tails one cell at a time, so dropping a long list
/// does not recurse once per pair.
impl Drop for Value {
  fn drop(&mut self) {
    let mut next = match self {
      Value::Pair(_, tail) => take_owned_pair(tail),
      _ => None,
    };

    while let Some(cell) = next {
      next = match Rc::try_unwrap(cell) {
        Ok(mut value) => match &mut value {
          Value::Pair(_, tail) => take_owned_pair(tail),
          _ => None,
        },
        Err(_) => None,
      };
    }
  }
}

fn take_owned_pair(tail: &mut Rc<Value>) -> Option<Rc<Value>> {
  if Rc::strong_count(tail) == 1 && matches!(**tail, Value::Pair(_, _)) {
    Some(mem::replace(tail, Rc::new(Value::Empty)))
  } else {
    None
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Integer(a), Value::Integer(b)) => a == b,
      (Value::Double(a), Value::Double(b)) => a == b,
      (Value::Boolean(a), Value::Boolean(b)) => a == b,
      (Value::String(a), Value::String(b)) => a == b,
      (Value::Symbol(a), Value::Symbol(b)) => a == b,
      (Value::Pair(_, _), Value::Pair(_, _)) => {
        // Walk the spine so long lists compare without deep recursion
        let (mut a, mut b) = (self, other);
        loop {
          match (a, b) {
            (Value::Pair(head_a, tail_a), Value::Pair(head_b, tail_b)) => {
              if head_a != head_b {
                return false;
              }
              a = tail_a;
              b = tail_b;
            }
            _ => return a == b,
          }
        }
      }
      (Value::Empty, Value::Empty) | (Value::Void, Value::Void) => true,
      (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
      (Value::Primitive(a), Value::Primitive(b)) => a == b,
      _ => false,
    }
  }
}

impl Value {
  pub fn symbol(name: impl Into<EcoString>) -> Self {
    Value::Symbol(name.into())
  }

  pub fn string(text: impl Into<EcoString>) -> Self {
    Value::String(text.into())
  }

  /// Head of a pair.
  pub fn first(&self) -> Result<&Value, EvalError> {
    match self {
      Value::Pair(head, _) => Ok(head),
      _ => Err(EvalError::type_error("first", "pair", self)),
    }
  }

  /// Tail of a pair.
  pub fn rest(&self) -> Result<&Value, EvalError> {
    match self {
      Value::Pair(_, tail) => Ok(tail),
      _ => Err(EvalError::type_error("rest", "pair", self)),
    }
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, Value::Empty)
  }

  pub fn is_void(&self) -> bool {
    matches!(self, Value::Void)
  }

  pub fn as_symbol(&self) -> Option<&EcoString> {
    match self {
      Value::Symbol(name) => Some(name),
      _ => None,
    }
  }

  /// `#f` and numeric zero (integer or double) are false, everything else is true.
  pub fn is_truthy(&self) -> bool {
    match self {
      Value::Boolean(flag) => *flag,
      Value::Integer(n) => *n != 0,
      Value::Double(n) => *n != 0.0,
      _ => true,
    }
  }

  /// True for a chain of pairs ending in `Empty`.
  pub fn is_list(&self) -> bool {
    let mut current = self;
    while let Value::Pair(_, tail) = current {
      current = tail;
    }
    current.is_empty()
  }

  /// Number of pair links before the first non-pair tail. Improper lists are
  /// counted up to their dotted tail.
  pub fn sequence_length(&self) -> usize {
    self.iter().count()
  }

  /// A new list holding the same elements in the opposite order, built from
  /// fresh pairs. A dotted tail is dropped; a non-pair is returned unchanged.
  pub fn reverse_list(&self) -> Value {
    match self {
      Value::Pair(_, _) => self
        .iter()
        .fold(Value::Empty, |reversed, item| cons(item.clone(), reversed)),
      _ => self.clone(),
    }
  }

  pub fn iter(&self) -> ListIter<'_> {
    ListIter { current: self }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Integer(_) => "integer",
      Value::Double(_) => "double",
      Value::Boolean(_) => "boolean",
      Value::String(_) => "string",
      Value::Symbol(_) => "symbol",
      Value::Pair(_, _) => "pair",
      Value::Empty => "empty list",
      Value::Void => "void",
      Value::Closure(_) | Value::Primitive(_) => "procedure",
    }
  }

  /// Rendering used in diagnostics, where an invisible void would be confusing.
  pub fn repr(&self) -> String {
    match self {
      Value::Void => "#<void>".to_string(),
      Value::String(text) => format!("\"{text}\""),
      other => other.to_string(),
    }
  }
}

/// Walks the heads of a chain of pairs. Once exhausted, [`ListIter::tail`]
/// holds whatever terminated the chain.
pub struct ListIter<'a> {
  current: &'a Value,
}

impl<'a> ListIter<'a> {
  pub fn tail(&self) -> &'a Value {
    self.current
  }
}

impl<'a> Iterator for ListIter<'a> {
  type Item = &'a Value;

  fn next(&mut self) -> Option<Self::Item> {
    match self.current {
      Value::Pair(head, tail) => {
        self.current = tail;
        Some(head)
      }
      _ => None,
    }
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Value::Integer(value)
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Double(value)
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Boolean(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::String(value.into())
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Integer(value) => write!(f, "{value}"),
      Value::Double(value) => write!(f, "{value:.6}"),
      Value::Boolean(true) => write!(f, "#t"),
      Value::Boolean(false) => write!(f, "#f"),
      Value::String(text) | Value::Symbol(text) => write!(f, "{text}"),
      Value::Empty => write!(f, "()"),
      Value::Void => Ok(()),
      Value::Closure(_) | Value::Primitive(_) => write!(f, "#<procedure>"),
      Value::Pair(_, _) => {
        write!(f, "(")?;

        let mut items = self.iter();
        let mut first = true;
        for item in items.by_ref() {
          if !first {
            write!(f, " ")?;
          }
          write!(f, "{item}")?;
          first = false;
        }

        let tail = items.tail();
        if !tail.is_empty() {
          write!(f, " . {tail}")?;
        }

        write!(f, ")")
      }
    }
  }
}

pub fn cons(head: Value, tail: Value) -> Value {
  Value::Pair(Rc::new(head), Rc::new(tail))
}

pub fn list(items: Vec<Value>) -> Value {
  list_with_tail(items, Value::Empty)
}

/// Builds `(a b ... . tail)`; with an `Empty` tail this is a proper list.
pub fn list_with_tail(items: Vec<Value>, tail: Value) -> Value {
  items
    .into_iter()
    .rev()
    .fold(tail, |acc, item| cons(item, acc))
}

pub struct Symbol(pub &'static str);

impl From<Symbol> for Value {
  fn from(value: Symbol) -> Self {
    Value::Symbol(value.0.into())
  }
}

#[macro_export]
macro_rules! skeme_list {
    [] => {
        $crate::value::Value::Empty
    };
    [$($elem:expr),* $(,)?] => {{
        let elems: Vec<$crate::value::Value> = vec![$(<$crate::value::Value as From<_>>::from($elem)),*];
        $crate::value::list(elems)
    }};
}

#[macro_export]
macro_rules! sym {
    ($s:expr) => {
        $crate::value::Symbol($s)
    };
}
