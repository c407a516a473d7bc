//! Loading pipeline configuration (prompt templates + tunables) from TOML.
//!
//! See `PipelineConfig`, `Prompts` and `Tuning` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PipelineConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub tuning: Tuning,
}

/// Knobs with sensible defaults. All of these are operational tunables,
/// not semantic contracts.
#[derive(Clone, Debug, Deserialize)]
pub struct Tuning {
  /// Recent-answer window consulted for duplicate suppression. Upstream
  /// call sites historically used 10 and 15 interchangeably.
  #[serde(default = "default_history_window")]
  pub history_window: usize,
}

impl Default for Tuning {
  fn default() -> Self {
    Self { history_window: default_history_window() }
  }
}

fn default_history_window() -> usize {
  10
}

/// Prompt templates sent to the generation service. Defaults are tuned for
/// short one-word riddles and four-option logic puzzles; override them in
/// TOML to adjust tone or structure. Placeholders: `{theme}`, `{avoid_list}`.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub riddle_template: String,
  pub logic_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      riddle_template: r#"{avoid_list}Generate a UNIQUE and SIMPLE riddle about {theme}.
Answer must be ONE WORD only (like: clock, towel, comb, piano, candle).
Make it different from the examples above.

IMPORTANT: Always include EXPLANATION
Format EXACTLY:
RIDDLE: [the riddle question]
HINT: [a helpful hint]
ANSWER: [one word only]
EXPLANATION: [Explain clearly why this is the answer in 1-2 sentences]

Example:
RIDDLE: What has keys but can't open locks?
HINT: Think about musical instruments
ANSWER: piano
EXPLANATION: A piano has keys (piano keys) but they are musical keys, not keys that open locks.

Generate a unique riddle now:"#
        .into(),
      logic_template: r#"Generate a SIMPLE logic puzzle about {theme}. Make it require reasoning, not raw calculation.

Format EXACTLY:
QUESTION: [the logic question]
OPTIONS: A) [answer 1] B) [answer 2] C) [answer 3] D) [answer 4]
ANSWER: [single letter A, B, C, or D]
HINT: [a helpful hint]
EXPLANATION: [Explain the solution in 1-2 sentences]

Example:
QUESTION: There are two ducks in front of a duck, two ducks behind a duck and a duck in the middle. How many ducks are there?
OPTIONS: A) 2 B) 3 C) 4 D) 5
HINT: Draw it or visualize the ducks in a line.
ANSWER: B
EXPLANATION: Three ducks in a line satisfy all three statements at once.

Generate a new unique logic puzzle:"#
        .into(),
    }
  }
}

/// Attempt to load `PipelineConfig` from PUZZLE_CONFIG_PATH. On any
/// parsing/IO error, returns None and the defaults apply.
pub fn load_pipeline_config_from_env() -> Option<PipelineConfig> {
  let path = std::env::var("PUZZLE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<PipelineConfig>(&s) {
      Ok(cfg) => {
        info!(target: "riddlebox_backend", %path, "Loaded pipeline config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "riddlebox_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "riddlebox_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_when_sections_missing() {
    let cfg: PipelineConfig = toml::from_str("").expect("empty config");
    assert_eq!(cfg.tuning.history_window, 10);
    assert!(cfg.prompts.riddle_template.contains("{theme}"));
    assert!(cfg.prompts.riddle_template.contains("{avoid_list}"));
    assert!(cfg.prompts.logic_template.contains("OPTIONS:"));
  }

  #[test]
  fn partial_override_keeps_other_defaults() {
    let cfg: PipelineConfig = toml::from_str(
      r#"
[tuning]
history_window = 15
"#,
    )
    .expect("config");
    assert_eq!(cfg.tuning.history_window, 15);
    assert!(cfg.prompts.logic_template.contains("{theme}"));
  }
}
