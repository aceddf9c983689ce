use std::rc::Rc;

use crate::eval::EvalError;
use crate::frame::Frame;
use crate::value::{Primitive, PrimitiveFn, Value, cons};

pub const PRIMITIVES: &[(&str, PrimitiveFn)] = &[
  ("+", add),
  ("-", subtract),
  ("*", multiply),
  ("/", divide),
  ("<", less),
  (">", greater),
  ("<=", less_or_equal),
  (">=", greater_or_equal),
  ("=", numeric_equal),
  ("modulo", modulo),
  ("null?", is_null),
  ("car", car),
  ("cdr", cdr),
  ("cons", construct),
  ("list", list),
  ("not", not),
  ("pair?", is_pair),
  ("equal?", equal),
  ("length", length),
];

/// Binds every primitive into `frame`.
pub fn install(frame: &Frame) {
  for &(name, func) in PRIMITIVES {
    frame.bind(name, Value::Primitive(Primitive { name, func }));
  }
}

/// A fresh root frame holding the primitive bindings.
pub fn global_frame() -> Rc<Frame> {
  let frame = Frame::root();
  install(&frame);
  frame
}

fn arguments<'a>(name: &'static str, args: &'a Value) -> Result<Vec<&'a Value>, EvalError> {
  let mut items = args.iter();
  let collected: Vec<&'a Value> = items.by_ref().collect();
  if !items.tail().is_empty() {
    return Err(EvalError::type_error(name, "argument list", args));
  }
  Ok(collected)
}

fn exactly<'a, const N: usize>(
  name: &'static str,
  args: &'a Value,
) -> Result<[&'a Value; N], EvalError> {
  let items = arguments(name, args)?;
  let got = items.len();
  items
    .try_into()
    .map_err(|_| EvalError::arity(name, N, got))
}

fn to_number(name: &'static str, value: &Value) -> Result<f64, EvalError> {
  match value {
    Value::Integer(n) => Ok(*n as f64),
    Value::Double(n) => Ok(*n),
    other => Err(EvalError::type_error(name, "number", other)),
  }
}

/// Integers, and doubles without a fractional part.
fn to_integer(name: &'static str, value: &Value) -> Result<i64, EvalError> {
  match value {
    Value::Integer(n) => Ok(*n),
    Value::Double(n) if n.fract() == 0.0 && n.is_finite() => Ok(*n as i64),
    other => Err(EvalError::type_error(name, "integer", other)),
  }
}

fn numbers(name: &'static str, args: &Value) -> Result<Vec<f64>, EvalError> {
  arguments(name, args)?
    .into_iter()
    .map(|value| to_number(name, value))
    .collect()
}

fn add(args: &Value) -> Result<Value, EvalError> {
  Ok(Value::Double(
    numbers("+", args)?.into_iter().fold(0.0, |acc, n| acc + n),
  ))
}

fn multiply(args: &Value) -> Result<Value, EvalError> {
  Ok(Value::Double(
    numbers("*", args)?.into_iter().fold(1.0, |acc, n| acc * n),
  ))
}

fn subtract(args: &Value) -> Result<Value, EvalError> {
  match numbers("-", args)?.as_slice() {
    [] => Err(EvalError::arity("-", "at least 1", 0)),
    [only] => Ok(Value::Double(-only)),
    [first, rest @ ..] => Ok(Value::Double(rest.iter().fold(*first, |acc, n| acc - n))),
  }
}

fn divide(args: &Value) -> Result<Value, EvalError> {
  match numbers("/", args)?.as_slice() {
    [] => Err(EvalError::arity("/", "at least 1", 0)),
    [only] => Ok(Value::Double(1.0 / only)),
    [first, rest @ ..] => Ok(Value::Double(rest.iter().fold(*first, |acc, n| acc / n))),
  }
}

/// Every argument after the first is compared against the first one.
fn compare(name: &'static str, args: &Value, holds: fn(f64, f64) -> bool) -> Result<Value, EvalError> {
  let values = numbers(name, args)?;
  let [first, rest @ ..] = values.as_slice() else {
    return Err(EvalError::arity(name, "at least 2", 0));
  };
  if rest.is_empty() {
    return Err(EvalError::arity(name, "at least 2", 1));
  }
  Ok(Value::Boolean(rest.iter().all(|other| holds(*first, *other))))
}

fn less(args: &Value) -> Result<Value, EvalError> {
  compare("<", args, |a, b| a < b)
}

fn greater(args: &Value) -> Result<Value, EvalError> {
  compare(">", args, |a, b| a > b)
}

fn less_or_equal(args: &Value) -> Result<Value, EvalError> {
  compare("<=", args, |a, b| a <= b)
}

fn greater_or_equal(args: &Value) -> Result<Value, EvalError> {
  compare(">=", args, |a, b| a >= b)
}

fn numeric_equal(args: &Value) -> Result<Value, EvalError> {
  compare("=", args, |a, b| a == b)
}

/// The result takes the sign of the divisor.
fn modulo(args: &Value) -> Result<Value, EvalError> {
  let [dividend, divisor] = exactly::<2>("modulo", args)?;
  let dividend = to_integer("modulo", dividend)?;
  let divisor = to_integer("modulo", divisor)?;
  if divisor == 0 {
    return Err(EvalError::DivisionByZero("modulo"));
  }

  let remainder = dividend.wrapping_rem(divisor);
  let result = if remainder != 0 && (remainder < 0) != (divisor < 0) {
    remainder + divisor
  } else {
    remainder
  };
  Ok(Value::Integer(result))
}

fn is_null(args: &Value) -> Result<Value, EvalError> {
  let [value] = exactly::<1>("null?", args)?;
  Ok(Value::Boolean(value.is_empty()))
}

fn car(args: &Value) -> Result<Value, EvalError> {
  let [value] = exactly::<1>("car", args)?;
  match value {
    Value::Pair(head, _) => Ok((**head).clone()),
    other => Err(EvalError::type_error("car", "pair", other)),
  }
}

fn cdr(args: &Value) -> Result<Value, EvalError> {
  let [value] = exactly::<1>("cdr", args)?;
  match value {
    Value::Pair(_, tail) => Ok((**tail).clone()),
    other => Err(EvalError::type_error("cdr", "pair", other)),
  }
}

fn construct(args: &Value) -> Result<Value, EvalError> {
  let [head, tail] = exactly::<2>("cons", args)?;
  Ok(cons(head.clone(), tail.clone()))
}

fn list(args: &Value) -> Result<Value, EvalError> {
  arguments("list", args)?;
  Ok(args.clone())
}

fn not(args: &Value) -> Result<Value, EvalError> {
  let [value] = exactly::<1>("not", args)?;
  Ok(Value::Boolean(matches!(value, Value::Boolean(false))))
}

fn is_pair(args: &Value) -> Result<Value, EvalError> {
  let [value] = exactly::<1>("pair?", args)?;
  Ok(Value::Boolean(matches!(value, Value::Pair(_, _))))
}

fn equal(args: &Value) -> Result<Value, EvalError> {
  let [left, right] = exactly::<2>("equal?", args)?;
  Ok(Value::Boolean(left == right))
}

fn length(args: &Value) -> Result<Value, EvalError> {
  let [value] = exactly::<1>("length", args)?;
  if !value.is_list() {
    return Err(EvalError::type_error("length", "list", value));
  }
  Ok(Value::Integer(value.sequence_length() as i64))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::eval::evaluate;
  use crate::{read, skeme_list, sym};

  fn call(name: &str, args: Value) -> Result<Value, EvalError> {
    let (_, func) = PRIMITIVES
      .iter()
      .find(|(primitive, _)| *primitive == name)
      .expect("primitive exists");
    func(&args)
  }

  fn run(source: &str) -> Result<Value, EvalError> {
    let frame = global_frame();
    let program = read(source).expect("Failed to read source");
    let mut result = Value::Void;
    for form in program.iter() {
      result = evaluate(form, &frame)?;
    }
    Ok(result)
  }

  #[test]
  fn test_global_frame_binds_every_primitive() {
    let frame = global_frame();
    for (name, _) in PRIMITIVES {
      assert!(frame.is_bound_locally(name), "{name} is not bound");
      assert!(matches!(frame.lookup(name), Ok(Value::Primitive(_))));
    }
    assert_eq!(frame.visible_names().len(), PRIMITIVES.len());
  }

  #[test]
  fn test_arithmetic_returns_doubles() {
    assert_eq!(call("+", skeme_list![]), Ok(Value::Double(0.0)));
    assert_eq!(call("+", skeme_list![1, 2, 3.5]), Ok(Value::Double(6.5)));
    assert_eq!(call("*", skeme_list![]), Ok(Value::Double(1.0)));
    assert_eq!(call("*", skeme_list![2, 3]), Ok(Value::Double(6.0)));
    assert_eq!(call("-", skeme_list![10, 4, 1]), Ok(Value::Double(5.0)));
    assert_eq!(call("/", skeme_list![9, 2]), Ok(Value::Double(4.5)));
  }

  #[test]
  fn test_unary_minus_and_divide() {
    assert_eq!(run("(- 5)"), Ok(Value::Double(-5.0)));
    assert_eq!(run("(/ 2)"), Ok(Value::Double(0.5)));
    assert_eq!(run("(+ )"), Ok(Value::Double(0.0)));
  }

  #[test]
  fn test_empty_sum_is_positive_zero() {
    let sum = call("+", skeme_list![]).expect("empty sum");
    assert_eq!(sum.to_string(), "0.000000");
    assert!(matches!(&sum, Value::Double(n) if n.is_sign_positive()));
    assert_eq!(run("(+)").expect("empty sum").to_string(), "0.000000");
  }

  #[test]
  fn test_minus_and_divide_need_an_argument() {
    assert!(matches!(
      call("-", skeme_list![]),
      Err(EvalError::Arity { got: 0, .. })
    ));
    assert!(matches!(
      call("/", skeme_list![]),
      Err(EvalError::Arity { got: 0, .. })
    ));
  }

  #[test]
  fn test_arithmetic_type_errors() {
    assert_eq!(
      call("+", skeme_list![1, "two"]),
      Err(EvalError::Type {
        procedure: "+".into(),
        expected: "number",
        got: "\"two\"".to_string(),
      })
    );
    assert!(matches!(
      call("*", skeme_list![sym!("x")]),
      Err(EvalError::Type { .. })
    ));
  }

  #[test]
  fn test_division_by_zero_follows_floats() {
    assert_eq!(call("/", skeme_list![1, 0]), Ok(Value::Double(f64::INFINITY)));
  }

  #[test]
  fn test_comparisons_against_first() {
    assert_eq!(call("<", skeme_list![1, 2]), Ok(Value::Boolean(true)));
    assert_eq!(call("<", skeme_list![2, 1]), Ok(Value::Boolean(false)));
    assert_eq!(call(">", skeme_list![3, 1, 2]), Ok(Value::Boolean(true)));
    // Both 5 and 3 exceed 1, though 5 > 3 would fail a chained comparison.
    assert_eq!(call("<", skeme_list![1, 5, 3]), Ok(Value::Boolean(true)));
    assert_eq!(call("<=", skeme_list![2, 2]), Ok(Value::Boolean(true)));
    assert_eq!(call(">=", skeme_list![1, 2]), Ok(Value::Boolean(false)));
    assert_eq!(call("=", skeme_list![2, 2.0, 2]), Ok(Value::Boolean(true)));
    assert_eq!(call("=", skeme_list![2, 3]), Ok(Value::Boolean(false)));
  }

  #[test]
  fn test_comparisons_need_two_numbers() {
    assert!(matches!(
      call("<", skeme_list![1]),
      Err(EvalError::Arity { got: 1, .. })
    ));
    assert!(matches!(
      call("=", skeme_list![]),
      Err(EvalError::Arity { got: 0, .. })
    ));
    assert!(matches!(
      call(">", skeme_list![1, true]),
      Err(EvalError::Type { .. })
    ));
  }

  #[test]
  fn test_modulo() {
    assert_eq!(call("modulo", skeme_list![7, 3]), Ok(Value::Integer(1)));
    assert_eq!(call("modulo", skeme_list![-7, 3]), Ok(Value::Integer(2)));
    assert_eq!(call("modulo", skeme_list![7, -3]), Ok(Value::Integer(-2)));
    assert_eq!(call("modulo", skeme_list![6, 3]), Ok(Value::Integer(0)));
    assert_eq!(call("modulo", skeme_list![7.0, 2]), Ok(Value::Integer(1)));
    assert_eq!(run("(modulo (+ 4 3) 4)"), Ok(Value::Integer(3)));
  }

  #[test]
  fn test_modulo_errors() {
    assert_eq!(
      call("modulo", skeme_list![1, 0]),
      Err(EvalError::DivisionByZero("modulo"))
    );
    assert!(matches!(
      call("modulo", skeme_list![7.5, 2]),
      Err(EvalError::Type { .. })
    ));
    assert!(matches!(
      call("modulo", skeme_list![7]),
      Err(EvalError::Arity { got: 1, .. })
    ));
  }

  #[test]
  fn test_null() {
    assert_eq!(run("(null? (quote ()))"), Ok(Value::Boolean(true)));
    assert_eq!(run("(null? (quote (1)))"), Ok(Value::Boolean(false)));
    assert_eq!(run("(null? 0)"), Ok(Value::Boolean(false)));
    assert!(matches!(
      run("(null? 1 2)"),
      Err(EvalError::Arity { got: 2, .. })
    ));
  }

  #[test]
  fn test_car_and_cdr() {
    assert_eq!(run("(car (quote (1 2 3)))"), Ok(Value::Integer(1)));
    assert_eq!(run("(cdr (quote (1 2 3)))"), Ok(skeme_list![2, 3]));
    assert_eq!(run("(cdr (cons 1 2))"), Ok(Value::Integer(2)));
    assert_eq!(run("(cdr (quote (1)))"), Ok(Value::Empty));
  }

  #[test]
  fn test_car_of_empty_is_a_type_error() {
    assert_eq!(
      run("(car (quote ()))"),
      Err(EvalError::Type {
        procedure: "car".into(),
        expected: "pair",
        got: "()".to_string(),
      })
    );
    assert!(matches!(run("(cdr 5)"), Err(EvalError::Type { .. })));
    assert!(matches!(
      run("(car)"),
      Err(EvalError::Arity { got: 0, .. })
    ));
  }

  #[test]
  fn test_cons() {
    assert_eq!(run("(cons 1 2)"), Ok(cons(1.into(), 2.into())));
    assert_eq!(run("(cons 1 (quote (2)))"), Ok(skeme_list![1, 2]));
    assert_eq!(run("(cons 1 2)").map(|v| v.to_string()), Ok("(1 . 2)".to_string()));
    assert!(matches!(
      run("(cons 1)"),
      Err(EvalError::Arity { got: 1, .. })
    ));
  }

  #[test]
  fn test_list_and_length() {
    assert_eq!(run("(list)"), Ok(Value::Empty));
    assert_eq!(run("(list 1 (+ 1 1) \"c\")"), Ok(skeme_list![1, 2.0, "c"]));
    assert_eq!(run("(length (list 1 2 3))"), Ok(Value::Integer(3)));
    assert_eq!(run("(length (quote ()))"), Ok(Value::Integer(0)));
    assert!(matches!(
      run("(length (cons 1 2))"),
      Err(EvalError::Type { .. })
    ));
  }

  #[test]
  fn test_predicates() {
    assert_eq!(run("(not #f)"), Ok(Value::Boolean(true)));
    assert_eq!(run("(not 0)"), Ok(Value::Boolean(false)));
    assert_eq!(run("(pair? (cons 1 2))"), Ok(Value::Boolean(true)));
    assert_eq!(run("(pair? (quote ()))"), Ok(Value::Boolean(false)));
    assert_eq!(
      run("(equal? (list 1 (list 2)) (quote (1 (2))))"),
      Ok(Value::Boolean(true))
    );
    assert_eq!(run("(equal? 1 1.0)"), Ok(Value::Boolean(false)));
    assert_eq!(run("(equal? car car)"), Ok(Value::Boolean(true)));
  }
}
