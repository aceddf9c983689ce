use std::rc::Rc;

use ecow::EcoString;
use thiserror::Error;
use tracing::debug;

use crate::frame::Frame;
use crate::special_forms::{self, SpecialForm};
use crate::value::{Closure, Value, cons};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
  #[error("Unbound symbol: {0}")]
  UnboundSymbol(EcoString),

  #[error("Malformed {form}: {reason}")]
  Malformed { form: &'static str, reason: String },

  #[error("Duplicate binding of {name} in {form}")]
  DuplicateBinding { form: &'static str, name: EcoString },

  #[error("{procedure}: expected {expected} argument(s), got {got}")]
  Arity {
    procedure: EcoString,
    expected: String,
    got: usize,
  },

  #[error("{procedure}: expected {expected}, got {got}")]
  Type {
    procedure: EcoString,
    expected: &'static str,
    got: String,
  },

  #[error("Not a procedure: {0}")]
  NotCallable(String),

  #[error("{0}: division by zero")]
  DivisionByZero(&'static str),
}

impl EvalError {
  pub fn malformed(form: &'static str, reason: impl Into<String>) -> Self {
    EvalError::Malformed {
      form,
      reason: reason.into(),
    }
  }

  pub fn arity(procedure: impl Into<EcoString>, expected: impl ToString, got: usize) -> Self {
    EvalError::Arity {
      procedure: procedure.into(),
      expected: expected.to_string(),
      got,
    }
  }

  pub fn type_error(procedure: impl Into<EcoString>, expected: &'static str, got: &Value) -> Self {
    EvalError::Type {
      procedure: procedure.into(),
      expected,
      got: got.repr(),
    }
  }
}

/// Evaluates `expr` in `frame`.
///
/// Literals evaluate to themselves, symbols are looked up along the frame
/// chain, and pairs are either special forms (when headed by a keyword) or
/// applications. Recursion follows the nesting of the expression and of user
/// procedure calls; there is no tail-call elimination, so unbounded user
/// recursion eventually exhausts the host stack.
pub fn evaluate(expr: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  match expr {
    Value::Integer(_) | Value::Double(_) | Value::Boolean(_) | Value::String(_) => {
      Ok(expr.clone())
    }

    Value::Symbol(name) => frame.lookup(name),

    Value::Pair(head, tail) => {
      // A form headed by the empty list denotes itself
      if head.is_empty() {
        return Ok(expr.clone());
      }

      if let Value::Symbol(name) = head.as_ref()
        && let Some(form) = SpecialForm::from_keyword(name)
      {
        debug!(%form, "special form");
        return special_forms::evaluate(form, tail, frame);
      }

      let operator = evaluate(head, frame)?;
      let arguments = evaluate_arguments(tail, frame)?;
      apply(&operator, &arguments)
    }

    Value::Empty | Value::Void | Value::Closure(_) | Value::Primitive(_) => Err(
      EvalError::malformed("expression", format!("cannot evaluate {}", expr.repr())),
    ),
  }
}

/// Applies a procedure to an already evaluated argument list.
pub fn apply(operator: &Value, arguments: &Value) -> Result<Value, EvalError> {
  match operator {
    Value::Closure(closure) => apply_closure(closure, arguments),
    Value::Primitive(primitive) => {
      debug!(primitive = primitive.name, "apply primitive");
      (primitive.func)(arguments)
    }
    other => Err(EvalError::NotCallable(other.repr())),
  }
}

fn apply_closure(closure: &Closure, arguments: &Value) -> Result<Value, EvalError> {
  debug!(
    formals = %closure.formals,
    arguments = arguments.sequence_length(),
    "apply closure"
  );

  let frame = Frame::child(&closure.frame);
  bind_formals(&closure.formals, arguments, &frame)?;
  evaluate_sequence(&closure.body, &frame)
}

/// Binds each formal to its argument. A dotted tail in the formals (or a bare
/// symbol in place of the list) collects the remaining arguments as a list.
fn bind_formals(formals: &Value, arguments: &Value, frame: &Frame) -> Result<(), EvalError> {
  let arity_error = || {
    let fixed = formals.sequence_length();
    let expected = if formals.is_list() {
      fixed.to_string()
    } else {
      format!("at least {fixed}")
    };
    EvalError::arity("#<procedure>", expected, arguments.sequence_length())
  };

  let mut params = formals.iter();
  let mut args = arguments.iter();

  for param in params.by_ref() {
    let arg = args.next().ok_or_else(arity_error)?;
    frame.bind(formal_name(param)?, arg.clone());
  }

  match params.tail() {
    Value::Empty if args.next().is_some() => Err(arity_error()),
    Value::Empty => Ok(()),
    rest => {
      frame.bind(formal_name(rest)?, args.tail().clone());
      Ok(())
    }
  }
}

fn formal_name(param: &Value) -> Result<EcoString, EvalError> {
  param
    .as_symbol()
    .cloned()
    .ok_or_else(|| EvalError::malformed("lambda", format!("formal {} is not a symbol", param.repr())))
}

/// Evaluates every element of an argument list left to right.
fn evaluate_arguments(tail: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  let mut items = tail.iter();
  let mut reversed = Value::Empty;

  for item in items.by_ref() {
    reversed = cons(evaluate(item, frame)?, reversed);
  }

  if !items.tail().is_empty() {
    return Err(EvalError::malformed(
      "application",
      "argument list is not a proper list",
    ));
  }

  Ok(reversed.reverse_list())
}

/// Evaluates a proper list of expressions in order and returns the last
/// result, or `Void` for an empty sequence.
pub(crate) fn evaluate_sequence(body: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  let mut result = Value::Void;
  for expr in body.iter() {
    result = evaluate(expr, frame)?;
  }
  Ok(result)
}
