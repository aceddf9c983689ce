use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use skeme::{Frame, SpecialForm};
use std::rc::Rc;

pub struct ReplHelper {
  file_completer: FilenameCompleter,
  global: Rc<Frame>,
}

impl ReplHelper {
  pub fn new(global: Rc<Frame>) -> Self {
    Self {
      file_completer: FilenameCompleter::new(),
      global,
    }
  }

  /// Special-form keywords and global names starting with `prefix`.
  fn names_starting_with(&self, prefix: &str) -> Vec<Pair> {
    let mut names: Vec<String> = SpecialForm::ALL
      .iter()
      .map(|form| form.keyword().to_string())
      .chain(self.global.visible_names().into_iter().map(|name| name.to_string()))
      .filter(|name| name.starts_with(prefix))
      .collect();
    names.sort();
    names.dedup();

    names
      .into_iter()
      .map(|name| Pair {
        display: name.clone(),
        replacement: name,
      })
      .collect()
  }
}

fn is_word_boundary(c: char) -> bool {
  c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"')
}

/// Byte offset where the word ending at `pos` begins.
fn word_start(line: &str, pos: usize) -> usize {
  line[..pos]
    .char_indices()
    .rev()
    .find(|(_, c)| is_word_boundary(*c))
    .map_or(0, |(index, c)| index + c.len_utf8())
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
  type Candidate = Pair;

  fn complete(
    &self,
    line: &str,
    pos: usize,
    ctx: &Context<'_>,
  ) -> Result<(usize, Vec<Pair>), ReadlineError> {
    if line.starts_with(":l ") || line.starts_with(":load ") {
      // Find the start position of the path argument
      let cmd_end = line.find(' ').map_or(0, |space| space + 1);

      let path_part = &line[cmd_end..pos];

      let (start, candidates) = self
        .file_completer
        .complete(path_part, path_part.len(), ctx)?;

      Ok((cmd_end + start, candidates))
    } else if line.starts_with(':') {
      Ok((pos, vec![]))
    } else {
      let start = word_start(line, pos);
      if start == pos {
        return Ok((pos, vec![]));
      }
      Ok((start, self.names_starting_with(&line[start..pos])))
    }
  }
}

impl Hinter for ReplHelper {
  type Hint = String;

  fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
    None
  }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

#[cfg(test)]
mod tests {
  use super::*;
  use skeme::{Value, global_frame};

  #[test]
  fn test_word_start() {
    assert_eq!(word_start("(le", 3), 1);
    assert_eq!(word_start("(+ 1 (ca", 8), 6);
    assert_eq!(word_start("null", 4), 0);
    assert_eq!(word_start("(f ", 3), 3);
    assert_eq!(word_start("'sy", 3), 1);
  }

  #[test]
  fn test_names_cover_forms_primitives_and_definitions() {
    let global = global_frame();
    global.bind("letter", Value::Integer(1));
    let helper = ReplHelper::new(global);

    let names: Vec<String> = helper
      .names_starting_with("let")
      .into_iter()
      .map(|pair| pair.replacement)
      .collect();
    assert_eq!(names, vec!["let", "let*", "letrec", "letter"]);

    let names: Vec<String> = helper
      .names_starting_with("ca")
      .into_iter()
      .map(|pair| pair.replacement)
      .collect();
    assert_eq!(names, vec!["car"]);
  }
}
