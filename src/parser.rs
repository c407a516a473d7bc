//! Model output parsing: free text in, validated candidate out.
//!
//! The upstream model is asked for labeled lines but routinely returns
//! markdown wrappers, shuffled or missing labels, and truncated output, so
//! parsing is an ordered rule chain where each pass only fills fields the
//! previous passes left empty:
//!
//! 1) label pass — strip markdown artifacts, scan for recognized labels
//!    (case-insensitive, any order, last occurrence wins)
//! 2) positional-inference pass — recover missing fields from line shape
//! 3) synthesis pass — default hint/explanation, terminal `?` normalization
//!
//! A candidate is only valid with a non-empty question and a usable answer.
//! We never invent a question or answer from nothing: if the passes cannot
//! recover both, the result is a `ParseFailure` carrying the partial data.

use serde::Serialize;

use crate::domain::normalize_answer;

/// Which labeled layout the prompt asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseShape {
  Riddle,
  Logic,
}

/// An unvalidated in-memory record produced by parsing, not yet accepted.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Candidate {
  pub question: String,
  pub hint: String,
  pub answer: String,
  pub explanation: String,
  pub options: Option<Vec<String>>,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("could not parse model output: {reason}")]
pub struct ParseFailure {
  pub reason: String,
  pub partial: Candidate,
}

const PLACEHOLDER_OPTIONS: [&str; 4] = ["A) ?", "B) ?", "C) ?", "D) ?"];

/// Parse raw model output into a candidate for the given shape.
/// Pure function over the input text.
pub fn parse(raw: &str, shape: ResponseShape) -> Result<Candidate, ParseFailure> {
  let lines = clean_lines(raw);
  let (mut cand, free) = label_pass(&lines);
  positional_pass(&mut cand, &free);
  synthesis_pass(&mut cand, shape);
  validate(cand, shape)
}

/// Normalize line endings, drop code-fence lines, strip emphasis markers and
/// heading prefixes, and discard blank lines.
fn clean_lines(raw: &str) -> Vec<String> {
  let mut out = Vec::new();
  for line in raw.replace("\r\n", "\n").lines() {
    let trimmed = line.trim();
    if trimmed.starts_with("```") {
      continue;
    }
    let stripped = trimmed
      .trim_start_matches('#')
      .replace("**", "")
      .replace('*', "")
      .replace('`', "");
    let stripped = stripped.trim();
    if !stripped.is_empty() {
      out.push(stripped.to_string());
    }
  }
  out
}

#[derive(Clone, Copy, Debug)]
enum Field {
  Question,
  Hint,
  Answer,
  Options,
  Explanation,
}

fn match_field(key: &str) -> Option<Field> {
  if key.eq_ignore_ascii_case("riddle") || key.eq_ignore_ascii_case("question") {
    Some(Field::Question)
  } else if key.eq_ignore_ascii_case("hint") {
    Some(Field::Hint)
  } else if key.eq_ignore_ascii_case("answer") {
    Some(Field::Answer)
  } else if key.eq_ignore_ascii_case("options") {
    Some(Field::Options)
  } else if key.eq_ignore_ascii_case("explanation") {
    Some(Field::Explanation)
  } else {
    None
  }
}

/// `"ANSWER: piano"` → `(Field::Answer, "piano")`. A head containing spaces
/// is prose with a colon in it, not a label.
fn split_label(line: &str) -> Option<(Field, String)> {
  let (head, rest) = line.split_once(':')?;
  let key = head.trim();
  if key.contains(' ') {
    return None;
  }
  Some((match_field(key)?, rest.trim().to_string()))
}

/// Scan every line for recognized labels. Returns the partially-filled
/// candidate plus the lines that carried no label (inference input).
fn label_pass(lines: &[String]) -> (Candidate, Vec<String>) {
  let mut cand = Candidate::default();
  let mut free = Vec::new();
  for line in lines {
    match split_label(line) {
      Some((field, value)) => {
        if value.is_empty() {
          continue; // truncated label line, nothing to capture
        }
        match field {
          Field::Question => cand.question = value,
          Field::Hint => cand.hint = value,
          Field::Answer => cand.answer = value,
          Field::Options => cand.options = Some(split_options(&value)),
          Field::Explanation => cand.explanation = value,
        }
      }
      None => free.push(line.clone()),
    }
  }
  (cand, free)
}

/// Strip a leading label word that lost its colon ("Answer piano").
fn strip_leading_label(line: &str) -> &str {
  for lab in ["RIDDLE", "QUESTION", "HINT", "ANSWER", "OPTIONS", "EXPLANATION"] {
    if let Some(prefix) = line.get(..lab.len()) {
      if prefix.eq_ignore_ascii_case(lab) {
        let rest = &line[lab.len()..];
        if rest.starts_with([' ', ':', '-']) {
          return rest.trim_start_matches([' ', ':', '-']).trim();
        }
      }
    }
  }
  line
}

/// True for a line that could plausibly be a bare answer word:
/// letters only, length 2-15.
fn is_bare_word(word: &str) -> bool {
  let n = word.chars().count();
  (2..=15).contains(&n) && word.chars().all(|c| c.is_alphabetic())
}

/// Fill still-empty fields from line positions and shapes.
fn positional_pass(cand: &mut Candidate, free: &[String]) {
  if cand.question.is_empty() {
    cand.question = free
      .iter()
      .find(|l| l.contains('?'))
      .or_else(|| free.first())
      .cloned()
      .unwrap_or_default();
  }
  if cand.answer.is_empty() {
    for line in free {
      if *line == cand.question {
        continue;
      }
      let word = strip_leading_label(line).trim_end_matches(['.', '!']).trim();
      if is_bare_word(word) {
        cand.answer = word.to_string();
        break;
      }
    }
  }
  if cand.hint.is_empty() {
    if let Some(second) = free.get(1) {
      if second.chars().count() < 50 && *second != cand.question && *second != cand.answer {
        cand.hint = second.clone();
      }
    }
  }
  if cand.explanation.is_empty() {
    if let Some(last) = free.last() {
      if last.chars().count() > 20 && *last != cand.question {
        cand.explanation = last.clone();
      }
    }
  }
}

/// Default whatever is still missing, and normalize the terminal `?`.
fn synthesis_pass(cand: &mut Candidate, shape: ResponseShape) {
  if cand.explanation.is_empty() && !cand.answer.is_empty() {
    cand.explanation = format!(
      "The answer '{}' fits the description.",
      normalize_answer(&cand.answer)
    );
  }
  if cand.hint.is_empty() {
    cand.hint = match shape {
      ResponseShape::Riddle => "Think carefully!".into(),
      ResponseShape::Logic => "Think logically!".into(),
    };
  }
  if !cand.question.is_empty() {
    if cand.question.ends_with('?') {
      while cand.question.ends_with("??") {
        cand.question.pop();
      }
    } else {
      let bare = cand.question.trim_end_matches(['.', '!', ' ']).to_string();
      cand.question = format!("{}?", bare);
    }
  }
  if shape == ResponseShape::Logic && cand.options.is_none() {
    cand.options = Some(PLACEHOLDER_OPTIONS.iter().map(|s| s.to_string()).collect());
  }
}

/// Reduce a logic answer to its option letter, if one can be recovered.
fn logic_letter(raw: &str) -> Option<char> {
  let norm = normalize_answer(raw);
  if norm.chars().count() == 1 {
    return norm.chars().next().filter(|c| ('a'..='d').contains(c));
  }
  let last = norm.split_whitespace().last()?;
  if last.chars().count() == 1 {
    return last.chars().next().filter(|c| ('a'..='d').contains(c));
  }
  None
}

fn validate(mut cand: Candidate, shape: ResponseShape) -> Result<Candidate, ParseFailure> {
  let question_missing = cand.question.trim_end_matches('?').trim().is_empty();
  if question_missing {
    return Err(ParseFailure { reason: "no question could be recovered".into(), partial: cand });
  }

  match shape {
    ResponseShape::Riddle => {
      // models like to answer in phrases; the contract is one word
      let first = cand.answer.split_whitespace().next().unwrap_or("").to_string();
      let norm = normalize_answer(&first);
      if norm.chars().count() < 2 {
        return Err(ParseFailure { reason: "answer missing or too short".into(), partial: cand });
      }
      cand.answer = norm;
      cand.options = None;
    }
    ResponseShape::Logic => match logic_letter(&cand.answer) {
      Some(c) => cand.answer = c.to_string(),
      None => {
        return Err(ParseFailure { reason: "answer is not an option letter".into(), partial: cand })
      }
    },
  }

  Ok(cand)
}

/// Split an OPTIONS line into ordered labeled choices.
/// `"A) 24 B) 32"` → `["A) 24", "B) 32"]`. If no marker structure is found,
/// the whole line is kept as a single choice.
fn split_options(line: &str) -> Vec<String> {
  fn is_marker(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some('A'..='F'), Some(')' | '.' | ':')))
  }

  let mut out: Vec<String> = Vec::new();
  let mut current = String::new();
  for token in line.split_whitespace() {
    if is_marker(token) && !current.is_empty() {
      out.push(current.clone());
      current.clear();
    }
    if !current.is_empty() {
      current.push(' ');
    }
    current.push_str(token);
  }
  if !current.is_empty() {
    out.push(current);
  }

  let marked = out
    .iter()
    .filter(|o| o.split_whitespace().next().map(is_marker).unwrap_or(false))
    .count();
  if marked >= 2 {
    out.retain(|o| o.split_whitespace().next().map(is_marker).unwrap_or(false));
    out
  } else {
    vec![line.trim().to_string()]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn well_formed_labeled_riddle_parses_exactly() {
    let raw = "RIDDLE: What has keys?\nHINT: music\nANSWER: Piano!\nEXPLANATION: keys for music";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.question, "What has keys?");
    assert_eq!(c.answer, "piano");
    assert_eq!(c.hint, "music");
    assert_eq!(c.explanation, "keys for music");
    assert!(c.options.is_none());
  }

  #[test]
  fn shuffled_labels_and_markdown_wrappers_still_parse() {
    let raw = "```\n**ANSWER:** coin\n\n## RIDDLE: What has a head and a tail but no body?\n*HINT:* money\nEXPLANATION: Both sides of a coin are named but there is no body.\n```";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.question, "What has a head and a tail but no body?");
    assert_eq!(c.answer, "coin");
    assert_eq!(c.hint, "money");
    assert!(c.explanation.starts_with("Both sides"));
  }

  #[test]
  fn duplicate_labels_keep_the_last_occurrence() {
    let raw = "ANSWER: towel\nRIDDLE: What gets wet while drying?\nANSWER: comb";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.answer, "comb");
  }

  #[test]
  fn unlabeled_output_is_recovered_positionally() {
    let raw = "What gets wet while drying?\nbathroom item maybe\nTowel\nIt dries you off while itself getting wetter.";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.question, "What gets wet while drying?");
    assert_eq!(c.answer, "towel");
    assert_eq!(c.hint, "bathroom item maybe");
    assert!(c.explanation.contains("dries you off"));
  }

  #[test]
  fn label_word_without_colon_is_stripped_before_inference() {
    let raw = "What has teeth but can't bite?\nAnswer comb";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.answer, "comb");
  }

  #[test]
  fn missing_question_and_answer_is_an_explicit_failure() {
    let raw = "some prose with no question\nand certainly no single word lines in sight";
    let err = parse(raw, ResponseShape::Riddle).expect_err("failure");
    assert!(err.reason.contains("answer"));
    assert_eq!(err.partial.question, "some prose with no question?");
  }

  #[test]
  fn empty_input_fails_on_the_question() {
    let err = parse("", ResponseShape::Riddle).expect_err("failure");
    assert!(err.reason.contains("question"));
  }

  #[test]
  fn missing_hint_and_explanation_are_synthesized() {
    let raw = "RIDDLE: I am tall when I am young and short when I am old.\nANSWER: candle";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.question, "I am tall when I am young and short when I am old?");
    assert_eq!(c.explanation, "The answer 'candle' fits the description.");
    assert_eq!(c.hint, "Think carefully!");
  }

  #[test]
  fn stacked_question_marks_collapse_to_one() {
    let raw = "RIDDLE: What has keys???\nANSWER: piano";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.question, "What has keys?");
  }

  #[test]
  fn inner_question_mark_is_left_alone() {
    let raw = "QUESTION: What comes next? 2, 4, 8, 16, ?\nOPTIONS: A) 24 B) 32 C) 28 D) 20\nANSWER: B";
    let c = parse(raw, ResponseShape::Logic).expect("candidate");
    assert_eq!(c.question, "What comes next? 2, 4, 8, 16, ?");
    assert_eq!(c.answer, "b");
    assert_eq!(
      c.options.as_deref(),
      Some(&["A) 24".to_string(), "B) 32".into(), "C) 28".into(), "D) 20".into()][..])
    );
  }

  #[test]
  fn logic_without_options_gets_placeholders() {
    let raw = "QUESTION: Which claim follows?\nANSWER: a";
    let c = parse(raw, ResponseShape::Logic).expect("candidate");
    assert_eq!(c.options.as_ref().map(|o| o.len()), Some(4));
  }

  #[test]
  fn logic_answer_phrasing_is_reduced_to_a_letter() {
    let raw = "QUESTION: Which way?\nANSWER: option C";
    let c = parse(raw, ResponseShape::Logic).expect("candidate");
    assert_eq!(c.answer, "c");
  }

  #[test]
  fn logic_answer_that_is_no_letter_fails() {
    let raw = "QUESTION: Which way?\nANSWER: banana";
    let err = parse(raw, ResponseShape::Logic).expect_err("failure");
    assert!(err.reason.contains("option letter"));
  }

  #[test]
  fn multi_word_riddle_answer_keeps_the_first_word() {
    let raw = "RIDDLE: What has keys?\nANSWER: piano keys";
    let c = parse(raw, ResponseShape::Riddle).expect("candidate");
    assert_eq!(c.answer, "piano");
  }

  #[test]
  fn single_letter_riddle_answer_is_rejected() {
    let raw = "RIDDLE: What is the first letter?\nANSWER: a";
    let err = parse(raw, ResponseShape::Riddle).expect_err("failure");
    assert!(err.reason.contains("too short"));
  }
}
