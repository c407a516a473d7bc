//! Duplicate suppression for generated answers.
//!
//! The guard is pure: it normalizes the candidate answer the same way the
//! store does and checks it against a snapshot of recent answers. The caller
//! decides what a rejection means (here: fall back to curated content).

use std::collections::HashSet;

use crate::domain::normalize_answer;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
  /// The normalized answer was served within the recent-history window.
  #[error("answer '{0}' was served recently")]
  Duplicate(String),
  /// Parser pathology guard: single-letter or empty answers never pass.
  #[error("normalized answer '{0}' is too short")]
  TooShort(String),
}

/// Check a candidate answer against the recent-history set.
/// On acceptance, returns the normalized form to store.
pub fn check(answer: &str, recent: &HashSet<String>) -> Result<String, RejectReason> {
  let normalized = normalize_answer(answer);
  if normalized.chars().count() < 2 {
    return Err(RejectReason::TooShort(normalized));
  }
  if recent.contains(&normalized) {
    return Err(RejectReason::Duplicate(normalized));
  }
  Ok(normalized)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn recent() -> HashSet<String> {
    ["piano", "coin"].iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn recent_answer_is_rejected_regardless_of_case_and_punctuation() {
    let err = check("Piano.", &recent()).expect_err("duplicate");
    assert_eq!(err, RejectReason::Duplicate("piano".into()));
  }

  #[test]
  fn fresh_answer_is_accepted_normalized() {
    assert_eq!(check("clock", &recent()).expect("accepted"), "clock");
    assert_eq!(check("  Towel! ", &recent()).expect("accepted"), "towel");
  }

  #[test]
  fn short_answers_are_rejected_before_the_history_check() {
    let err = check("x", &HashSet::new()).expect_err("too short");
    assert!(matches!(err, RejectReason::TooShort(_)));
    let err = check("?!", &HashSet::new()).expect_err("too short");
    assert!(matches!(err, RejectReason::TooShort(_)));
  }
}
