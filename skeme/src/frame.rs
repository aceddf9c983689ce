use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ecow::EcoString;
use tracing::trace;

use crate::eval::EvalError;
use crate::value::Value;

/// One lexical scope: its bindings plus a link to the enclosing scope.
///
/// Frames are shared through `Rc` because closures keep their defining frame
/// alive after the call that created it has returned. Bindings sit behind a
/// `RefCell` so `define` and `set!` can mutate a frame every closure sees.
pub struct Frame {
  bindings: RefCell<Vec<(EcoString, Value)>>,
  parent: Option<Rc<Frame>>,
}

impl Frame {
  /// A frame with no parent. The global frame is one of these.
  pub fn root() -> Rc<Frame> {
    Rc::new(Frame {
      bindings: RefCell::new(Vec::new()),
      parent: None,
    })
  }

  pub fn child(parent: &Rc<Frame>) -> Rc<Frame> {
    trace!(depth = parent.depth() + 1, "new child frame");
    Rc::new(Frame {
      bindings: RefCell::new(Vec::new()),
      parent: Some(Rc::clone(parent)),
    })
  }

  /// Adds a binding without checking for an existing one; the newest binding
  /// of a name shadows older ones in the same frame.
  pub fn bind(&self, name: impl Into<EcoString>, value: Value) {
    self.bindings.borrow_mut().push((name.into(), value));
  }

  pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
    self
      .chain()
      .find_map(|frame| frame.local(name))
      .ok_or_else(|| EvalError::UnboundSymbol(name.into()))
  }

  /// Only this frame's own bindings are searched.
  pub fn is_bound_locally(&self, name: &str) -> bool {
    self.local(name).is_some()
  }

  /// Overwrites the nearest binding of `name` along the chain.
  pub fn set_existing(&self, name: &str, value: Value) -> Result<(), EvalError> {
    for frame in self.chain() {
      let mut bindings = frame.bindings.borrow_mut();
      if let Some((_, slot)) = bindings.iter_mut().rev().find(|(bound, _)| bound == name) {
        *slot = value;
        return Ok(());
      }
    }
    Err(EvalError::UnboundSymbol(name.into()))
  }

  /// Names visible from this frame, nearest first, without duplicates.
  pub fn visible_names(&self) -> Vec<EcoString> {
    let mut names: Vec<EcoString> = Vec::new();
    for frame in self.chain() {
      for (name, _) in frame.bindings.borrow().iter().rev() {
        if !names.contains(name) {
          names.push(name.clone());
        }
      }
    }
    names
  }

  fn local(&self, name: &str) -> Option<Value> {
    self
      .bindings
      .borrow()
      .iter()
      .rev()
      .find(|(bound, _)| bound == name)
      .map(|(_, value)| value.clone())
  }

  fn depth(&self) -> usize {
    self.chain().count() - 1
  }

  fn chain(&self) -> impl Iterator<Item = &Frame> {
    std::iter::successors(Some(self), |frame| frame.parent.as_deref())
  }
}

impl fmt::Debug for Frame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<EcoString> = self
      .bindings
      .borrow()
      .iter()
      .map(|(name, _)| name.clone())
      .collect();
    f.debug_struct("Frame")
      .field("names", &names)
      .field("depth", &self.depth())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lookup_walks_the_chain() {
    let root = Frame::root();
    root.bind("x", Value::Integer(1));
    root.bind("y", Value::Integer(2));

    let child = Frame::child(&root);
    child.bind("x", Value::Integer(10));

    assert_eq!(child.lookup("x"), Ok(Value::Integer(10)));
    assert_eq!(child.lookup("y"), Ok(Value::Integer(2)));
    assert_eq!(root.lookup("x"), Ok(Value::Integer(1)));
    assert_eq!(
      child.lookup("z"),
      Err(EvalError::UnboundSymbol("z".into()))
    );
  }

  #[test]
  fn test_later_binding_shadows_in_same_frame() {
    let root = Frame::root();
    root.bind("x", Value::Integer(1));
    root.bind("x", Value::Integer(2));

    assert_eq!(root.lookup("x"), Ok(Value::Integer(2)));
  }

  #[test]
  fn test_is_bound_locally_ignores_parents() {
    let root = Frame::root();
    root.bind("x", Value::Integer(1));
    let child = Frame::child(&root);

    assert!(root.is_bound_locally("x"));
    assert!(!child.is_bound_locally("x"));

    child.bind("x", Value::Integer(5));
    assert!(child.is_bound_locally("x"));
  }

  #[test]
  fn test_set_existing_mutates_nearest_binding() {
    let root = Frame::root();
    root.bind("x", Value::Integer(1));
    let middle = Frame::child(&root);
    middle.bind("x", Value::Integer(2));
    let inner = Frame::child(&middle);

    inner
      .set_existing("x", Value::Integer(3))
      .expect("x is bound in the middle frame");

    assert_eq!(middle.lookup("x"), Ok(Value::Integer(3)));
    assert_eq!(root.lookup("x"), Ok(Value::Integer(1)));
    assert!(!inner.is_bound_locally("x"));
  }

  #[test]
  fn test_set_existing_fails_when_unbound() {
    let root = Frame::root();
    let child = Frame::child(&root);

    assert_eq!(
      child.set_existing("missing", Value::Void),
      Err(EvalError::UnboundSymbol("missing".into()))
    );
    assert!(!child.is_bound_locally("missing"));
  }

  #[test]
  fn test_lookup_has_no_side_effects() {
    let root = Frame::root();
    root.bind("x", Value::Double(1.5));

    for _ in 0..3 {
      assert_eq!(root.lookup("x"), Ok(Value::Double(1.5)));
    }
    assert_eq!(root.visible_names(), vec![EcoString::from("x")]);
  }

  #[test]
  fn test_visible_names_nearest_first() {
    let root = Frame::root();
    root.bind("a", Value::Void);
    root.bind("b", Value::Void);
    let child = Frame::child(&root);
    child.bind("c", Value::Void);
    child.bind("a", Value::Void);

    let names: Vec<String> = child
      .visible_names()
      .into_iter()
      .map(|name| name.to_string())
      .collect();
    assert_eq!(names, vec!["a", "c", "b"]);
    assert_eq!(child.depth(), 1);
    assert_eq!(root.depth(), 0);
  }
}
