use std::fmt;
use std::rc::Rc;

use ecow::EcoString;

use crate::eval::{self, EvalError, evaluate_sequence};
use crate::frame::Frame;
use crate::value::{Closure, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
  If,
  Quote,
  Define,
  Set,
  Lambda,
  Begin,
  And,
  Or,
  Cond,
  Let,
  LetStar,
  Letrec,
}

impl SpecialForm {
  pub const ALL: [SpecialForm; 12] = [
    SpecialForm::If,
    SpecialForm::Quote,
    SpecialForm::Define,
    SpecialForm::Set,
    SpecialForm::Lambda,
    SpecialForm::Begin,
    SpecialForm::And,
    SpecialForm::Or,
    SpecialForm::Cond,
    SpecialForm::Let,
    SpecialForm::LetStar,
    SpecialForm::Letrec,
  ];

  pub fn from_keyword(keyword: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|form| form.keyword() == keyword)
  }

  pub fn keyword(self) -> &'static str {
    match self {
      SpecialForm::If => "if",
      SpecialForm::Quote => "quote",
      SpecialForm::Define => "define",
      SpecialForm::Set => "set!",
      SpecialForm::Lambda => "lambda",
      SpecialForm::Begin => "begin",
      SpecialForm::And => "and",
      SpecialForm::Or => "or",
      SpecialForm::Cond => "cond",
      SpecialForm::Let => "let",
      SpecialForm::LetStar => "let*",
      SpecialForm::Letrec => "letrec",
    }
  }
}

impl fmt::Display for SpecialForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.keyword())
  }
}

/// Evaluates the special form `form` whose unevaluated operands are `args`.
pub fn evaluate(form: SpecialForm, args: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  match form {
    SpecialForm::If => eval_if(args, frame),
    SpecialForm::Quote => {
      let [datum] = exactly::<1>(form, args)?;
      Ok(datum.clone())
    }
    SpecialForm::Define => {
      let (name, expr) = target_and_expr(form, args)?;
      let value = eval::evaluate(expr, frame)?;
      frame.bind(name, value);
      Ok(Value::Void)
    }
    SpecialForm::Set => {
      let (name, expr) = target_and_expr(form, args)?;
      let value = eval::evaluate(expr, frame)?;
      frame.set_existing(&name, value)?;
      Ok(Value::Void)
    }
    SpecialForm::Lambda => eval_lambda(args, frame),
    SpecialForm::Begin => {
      elements(form, args)?;
      evaluate_sequence(args, frame)
    }
    SpecialForm::And => {
      let mut result = Value::Boolean(true);
      for expr in elements(form, args)? {
        result = eval::evaluate(expr, frame)?;
        if matches!(result, Value::Boolean(false)) {
          break;
        }
      }
      Ok(result)
    }
    SpecialForm::Or => {
      for expr in elements(form, args)? {
        let value = eval::evaluate(expr, frame)?;
        if !matches!(value, Value::Boolean(false)) {
          return Ok(value);
        }
      }
      Ok(Value::Boolean(false))
    }
    SpecialForm::Cond => eval_cond(args, frame),
    SpecialForm::Let | SpecialForm::LetStar | SpecialForm::Letrec => eval_let(form, args, frame),
  }
}

/// The operands of a form as a vector, rejecting a dotted operand list.
fn elements(form: SpecialForm, args: &Value) -> Result<Vec<&Value>, EvalError> {
  let mut items = args.iter();
  let collected: Vec<&Value> = items.by_ref().collect();
  if !items.tail().is_empty() {
    return Err(EvalError::malformed(
      form.keyword(),
      "operands are not a proper list",
    ));
  }
  Ok(collected)
}

fn exactly<const N: usize>(form: SpecialForm, args: &Value) -> Result<[&Value; N], EvalError> {
  let items = elements(form, args)?;
  let got = items.len();
  items.try_into().map_err(|_| {
    EvalError::malformed(
      form.keyword(),
      format!("expected {N} operand(s), got {got}"),
    )
  })
}

fn target_and_expr(form: SpecialForm, args: &Value) -> Result<(EcoString, &Value), EvalError> {
  let [target, expr] = exactly::<2>(form, args)?;
  let name = target.as_symbol().ok_or_else(|| {
    EvalError::malformed(
      form.keyword(),
      format!("target {} is not a symbol", target.repr()),
    )
  })?;
  Ok((name.clone(), expr))
}

fn eval_if(args: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  let items = elements(SpecialForm::If, args)?;
  let (test, then, otherwise) = match items.as_slice() {
    [test, then] => (*test, *then, None),
    [test, then, otherwise] => (*test, *then, Some(*otherwise)),
    _ => {
      return Err(EvalError::malformed(
        "if",
        format!("expected 2 or 3 operands, got {}", items.len()),
      ));
    }
  };

  if eval::evaluate(test, frame)?.is_truthy() {
    eval::evaluate(then, frame)
  } else if let Some(otherwise) = otherwise {
    eval::evaluate(otherwise, frame)
  } else {
    Ok(Value::Void)
  }
}

fn eval_lambda(args: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  let Value::Pair(formals, body) = args else {
    return Err(EvalError::malformed("lambda", "missing formals"));
  };

  if body.is_empty() {
    return Err(EvalError::malformed("lambda", "empty body"));
  }
  elements(SpecialForm::Lambda, body)?;

  let mut params = formals.iter();
  let mut seen: Vec<&EcoString> = Vec::new();
  for param in params.by_ref() {
    check_formal(param, &mut seen)?;
  }
  match params.tail() {
    Value::Empty => {}
    rest => check_formal(rest, &mut seen)?,
  }

  Ok(Value::Closure(Rc::new(Closure {
    formals: (**formals).clone(),
    body: (**body).clone(),
    frame: Rc::clone(frame),
  })))
}

fn check_formal<'a>(param: &'a Value, seen: &mut Vec<&'a EcoString>) -> Result<(), EvalError> {
  let name = param.as_symbol().ok_or_else(|| {
    EvalError::malformed("lambda", format!("formal {} is not a symbol", param.repr()))
  })?;
  if seen.contains(&name) {
    return Err(EvalError::DuplicateBinding {
      form: "lambda",
      name: name.clone(),
    });
  }
  seen.push(name);
  Ok(())
}

fn eval_cond(args: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  let clauses = elements(SpecialForm::Cond, args)?;
  let last = clauses.len().saturating_sub(1);

  for (index, clause) in clauses.into_iter().enumerate() {
    let Value::Pair(test, body) = clause else {
      return Err(EvalError::malformed(
        "cond",
        format!("clause {} is not a list", clause.repr()),
      ));
    };
    elements(SpecialForm::Cond, body)?;

    if test.as_symbol().is_some_and(|name| name == "else") {
      if index != last {
        return Err(EvalError::malformed("cond", "else must be the last clause"));
      }
      if body.is_empty() {
        return Err(EvalError::malformed("cond", "else clause has no expressions"));
      }
      return evaluate_sequence(body, frame);
    }

    let value = eval::evaluate(test, frame)?;
    if value.is_truthy() {
      if body.is_empty() {
        return Ok(value);
      }
      return evaluate_sequence(body, frame);
    }
  }

  Ok(Value::Void)
}

/// `let`, `let*` and `letrec` share their shape and differ only in which
/// frame sees each initializer:
/// - `let` evaluates every initializer in the enclosing frame,
/// - `let*` in the new frame as it fills up,
/// - `letrec` in the new frame after every name has been declared.
fn eval_let(form: SpecialForm, args: &Value, frame: &Rc<Frame>) -> Result<Value, EvalError> {
  let Value::Pair(bindings, body) = args else {
    return Err(EvalError::malformed(form.keyword(), "missing bindings"));
  };
  if body.is_empty() {
    return Err(EvalError::malformed(form.keyword(), "empty body"));
  }
  elements(form, body)?;

  let bindings = elements(form, bindings)?
    .into_iter()
    .map(|binding| let_binding(form, binding))
    .collect::<Result<Vec<_>, _>>()?;

  let child = Frame::child(frame);

  if form == SpecialForm::Letrec {
    for (name, _) in &bindings {
      declare(form, &child, name, Value::Void)?;
    }
    for (name, init) in &bindings {
      let value = eval::evaluate(init, &child)?;
      child.set_existing(name, value)?;
    }
  } else {
    for (name, init) in &bindings {
      if child.is_bound_locally(name) {
        return Err(duplicate(form, name));
      }
      let scope = if form == SpecialForm::LetStar { &child } else { frame };
      let value = eval::evaluate(init, scope)?;
      child.bind(name.clone(), value);
    }
  }

  evaluate_sequence(body, &child)
}

fn let_binding(form: SpecialForm, binding: &Value) -> Result<(EcoString, Value), EvalError> {
  let malformed = || {
    EvalError::malformed(
      form.keyword(),
      format!("binding {} is not (symbol expr)", binding.repr()),
    )
  };

  let items = elements(form, binding).map_err(|_| malformed())?;
  match items.as_slice() {
    [Value::Symbol(name), init] => Ok((name.clone(), (*init).clone())),
    _ => Err(malformed()),
  }
}

fn declare(form: SpecialForm, frame: &Frame, name: &EcoString, value: Value) -> Result<(), EvalError> {
  if frame.is_bound_locally(name) {
    return Err(duplicate(form, name));
  }
  frame.bind(name.clone(), value);
  Ok(())
}

fn duplicate(form: SpecialForm, name: &EcoString) -> EvalError {
  EvalError::DuplicateBinding {
    form: form.keyword(),
    name: name.clone(),
  }
}
