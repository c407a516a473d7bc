//! Content categories used to diversify prompts and fallback pools.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// The curated theme set. Fallback records are tagged with these; generated
/// prompts mention the picked theme to steer variety.
pub const THEMES: &[&str] = &["animal", "object", "nature", "food", "time"];

/// Pick a theme for a new request. An explicit client hint wins (any
/// non-empty tag is accepted; unknown tags simply match nothing in the
/// curated corpus and degrade to the full pool). The rng is injected so
/// selection is reproducible in tests.
pub fn select(hint: Option<&str>, rng: &mut StdRng) -> String {
  if let Some(h) = hint {
    let h = h.trim().to_lowercase();
    if !h.is_empty() {
      return h;
    }
  }
  THEMES
    .choose(rng)
    .copied()
    .unwrap_or("object")
    .to_string()
}
