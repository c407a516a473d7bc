//! Domain models used by the backend: puzzle kinds/sources, the accepted
//! record, and the answer normalization shared by storage and comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of puzzle is presented to the player?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
  /// Free-answer riddle (answer = one normalized word).
  Riddle,
  /// Multiple-choice logic question (answer = option letter).
  Logic,
  /// Endurance item: resolves to a riddle or logic shape per request.
  #[serde(rename = "mixed-endurance-item")]
  Endurance,
}

impl PuzzleKind {
  /// Stable short name used for cache keys and log fields.
  pub fn as_str(&self) -> &'static str {
    match self {
      PuzzleKind::Riddle => "riddle",
      PuzzleKind::Logic => "logic",
      PuzzleKind::Endurance => "endurance",
    }
  }
}

/// Where did we get the record from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PuzzleSource {
  /// Parsed out of live model output, past the uniqueness guard.
  #[serde(rename = "generated")]
  Generated,
  /// Picked from the curated corpus.
  #[serde(rename = "fallback-curated")]
  FallbackCurated,
  /// Synthesized absolute last resort.
  #[serde(rename = "fallback-system")]
  FallbackSystem,
}

impl PuzzleSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      PuzzleSource::Generated => "generated",
      PuzzleSource::FallbackCurated => "fallback-curated",
      PuzzleSource::FallbackSystem => "fallback-system",
    }
  }
}

/// An accepted puzzle record. Never mutated after acceptance; the game
/// consumes it read-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PuzzleRecord {
  /// Assigned by the content store on acceptance.
  pub id: String,
  /// Always ends with exactly one `?`.
  pub question: String,
  pub hint: String,
  /// Stored normalized: lowercase, trimmed, boundary non-letters stripped.
  pub answer: String,
  pub explanation: String,
  /// Ordered labeled choices; present for logic shapes, absent for riddles.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  pub kind: PuzzleKind,
  /// Category tag used for fallback grouping and prompt variety.
  pub theme: String,
  pub source: PuzzleSource,
  pub created_at: DateTime<Utc>,
}

/// Normalization applied to answers for comparison and storage:
/// lowercase, trimmed, leading/trailing non-letter characters stripped.
pub fn normalize_answer(raw: &str) -> String {
  raw
    .trim()
    .trim_matches(|c: char| !c.is_alphabetic())
    .to_lowercase()
}
