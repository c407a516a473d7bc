//! The content pipeline: daily cache check, prompt build, generation,
//! parsing, duplicate suppression, tiered fallback, persistence.
//!
//! Every failure class (missing credentials, timeout, upstream error, empty
//! or unparseable output, duplicate or degenerate answers) is recovered here
//! by selecting curated fallback content. Callers always receive a complete
//! well-formed record; provenance travels in the flags.

use std::collections::HashSet;

use rand::Rng;
use tracing::{info, instrument, warn};

use crate::domain::{PuzzleKind, PuzzleRecord, PuzzleSource};
use crate::fallback;
use crate::gemini::{GenerateError, GenerationConfig};
use crate::parser::{self, ResponseShape};
use crate::state::AppState;
use crate::store::ContentStore;
use crate::themes;
use crate::uniqueness;
use crate::util::{fill_template, trunc_for_log};

/// A freshly computed daily result; what the cache stores.
#[derive(Clone, Debug)]
pub struct Computed {
  pub record: PuzzleRecord,
  pub unique: bool,
}

/// A served result: the record plus the flags the envelope reports.
#[derive(Clone, Debug)]
pub struct Served {
  pub record: PuzzleRecord,
  pub unique: bool,
  pub cached: bool,
}

/// Any single-stage failure. All of these are recovered locally by falling
/// back; none propagate to the HTTP caller.
#[derive(Debug, thiserror::Error)]
pub enum StageFailure {
  #[error(transparent)]
  Generate(#[from] GenerateError),
  #[error(transparent)]
  Parse(#[from] parser::ParseFailure),
  #[error(transparent)]
  Reject(#[from] uniqueness::RejectReason),
}

/// Serve the daily record for a content type: cached replay, or one run of
/// the full pipeline.
#[instrument(level = "info", skip(state), fields(kind = kind.as_str(), theme_hint = ?theme_hint))]
pub async fn serve_daily(state: &AppState, kind: PuzzleKind, theme_hint: Option<&str>) -> Served {
  let key = state.cache.key_for(kind);
  let (computed, cached) = state
    .cache
    .get_or_compute(&key, || compute_daily(state, kind, theme_hint))
    .await;
  if cached {
    info!(target: "puzzle", %key, id = %computed.record.id, "Serving cached daily record");
  }
  Served { record: computed.record, unique: computed.unique, cached }
}

/// One full pipeline run. Stages execute strictly in order; the first
/// failure routes to the fallback selector.
async fn compute_daily(state: &AppState, kind: PuzzleKind, theme_hint: Option<&str>) -> Computed {
  let (theme, shape) = {
    let mut rng = state.rng.lock().await;
    let theme = themes::select(theme_hint, &mut rng);
    let shape = match kind {
      PuzzleKind::Riddle => ResponseShape::Riddle,
      PuzzleKind::Logic => ResponseShape::Logic,
      // endurance items mix both shapes evenly
      PuzzleKind::Endurance => {
        if rng.gen_bool(0.5) {
          ResponseShape::Riddle
        } else {
          ResponseShape::Logic
        }
      }
    };
    (theme, shape)
  };

  let recent = state.store.recent_answers(state.tuning.history_window);

  match try_generate(state, kind, shape, &theme, &recent).await {
    Ok(record) => Computed { record, unique: true },
    Err(failure) => {
      warn!(target: "puzzle", kind = kind.as_str(), %theme, error = %failure, "Pipeline stage failed; selecting fallback");
      fallback_record(state, kind, shape, &theme, &recent).await
    }
  }
}

/// The generation leg: prompt build, one model call, parse, uniqueness,
/// persist. No retries anywhere; a failed stage means fallback.
async fn try_generate(
  state: &AppState,
  kind: PuzzleKind,
  shape: ResponseShape,
  theme: &str,
  recent: &HashSet<String>,
) -> Result<PuzzleRecord, StageFailure> {
  let client = state.gemini.as_ref().ok_or(GenerateError::NoCredentials)?;

  let prompt = build_prompt(state, shape, theme, recent);
  let raw = client.generate(&prompt, generation_config(kind, shape)).await?;
  info!(target: "puzzle", raw_preview = %trunc_for_log(&raw, 120), "Parsing model output");

  let candidate = parser::parse(&raw, shape)?;
  let answer = match shape {
    ResponseShape::Riddle => uniqueness::check(&candidate.answer, recent)?,
    // logic answers are option letters; the recent-answer window carries
    // riddle words and has nothing to say about them
    ResponseShape::Logic => candidate.answer.clone(),
  };

  let mut record = PuzzleRecord {
    id: String::new(),
    question: candidate.question,
    hint: candidate.hint,
    answer,
    explanation: candidate.explanation,
    options: candidate.options,
    kind,
    theme: theme.to_string(),
    source: PuzzleSource::Generated,
    created_at: state.clock.now(),
  };
  record.id = state.store.append(record.clone());
  info!(target: "puzzle", id = %record.id, kind = kind.as_str(), %theme, "Generated record accepted");
  Ok(record)
}

/// Theme-aware, uniqueness-aware fallback selection + persistence.
async fn fallback_record(
  state: &AppState,
  kind: PuzzleKind,
  shape: ResponseShape,
  theme: &str,
  recent: &HashSet<String>,
) -> Computed {
  let now = state.clock.now();
  let (mut record, unique) = {
    let mut rng = state.rng.lock().await;
    fallback::select(shape, theme, recent, &mut rng, now)
  };
  record.kind = kind; // an endurance request keeps its endurance tag
  record.id = state.store.append(record.clone());
  info!(
    target: "puzzle",
    id = %record.id,
    kind = kind.as_str(),
    %theme,
    source = record.source.as_str(),
    unique,
    "Fallback record served"
  );
  Computed { record, unique }
}

fn generation_config(kind: PuzzleKind, shape: ResponseShape) -> GenerationConfig {
  match (kind, shape) {
    // endurance riddles run hotter and shorter
    (PuzzleKind::Endurance, ResponseShape::Riddle) => {
      GenerationConfig { temperature: 1.0, max_output_tokens: 150 }
    }
    (_, ResponseShape::Riddle) => GenerationConfig { temperature: 0.9, max_output_tokens: 200 },
    (_, ResponseShape::Logic) => GenerationConfig { temperature: 0.8, max_output_tokens: 200 },
  }
}

/// Fill the configured template for the shape. Riddle prompts carry an
/// avoid-list built from the recent answer history.
fn build_prompt(
  state: &AppState,
  shape: ResponseShape,
  theme: &str,
  recent: &HashSet<String>,
) -> String {
  match shape {
    ResponseShape::Riddle => {
      let avoid_list = if recent.is_empty() {
        String::new()
      } else {
        let mut answers: Vec<&str> = recent.iter().map(String::as_str).collect();
        answers.sort_unstable(); // stable prompt text for identical history
        let mut block =
          String::from("Avoid riddles whose answer is one of these recent answers:\n");
        for answer in answers {
          block.push_str("- ");
          block.push_str(answer);
          block.push('\n');
        }
        block.push('\n');
        block
      };
      fill_template(
        &state.prompts.riddle_template,
        &[("avoid_list", &avoid_list), ("theme", theme)],
      )
    }
    ResponseShape::Logic => fill_template(&state.prompts.logic_template, &[("theme", theme)]),
  }
}
