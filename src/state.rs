//! Application state: record store, daily cache, generation client, prompt
//! templates, clock and rng shared by all handlers.
//!
//! This module owns the wiring only; behavior lives in `pipeline`. Every
//! collaborator is injectable so tests can pin the clock and the rng.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::cache::{Clock, DailyCache, SystemClock};
use crate::config::{load_pipeline_config_from_env, PipelineConfig, Prompts, Tuning};
use crate::gemini::Gemini;
use crate::pipeline::Computed;
use crate::store::{ContentStore, MemoryStore};

pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub cache: DailyCache<Computed>,
    pub gemini: Option<Gemini>,
    pub prompts: Prompts,
    pub tuning: Tuning,
    pub clock: Arc<dyn Clock>,
    pub rng: Mutex<StdRng>,
}

impl AppState {
    /// Build state from env: optional TOML config, in-memory store, system
    /// clock, optional Gemini client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_pipeline_config_from_env().unwrap_or_default();

        let gemini = Gemini::from_env();
        if let Some(g) = &gemini {
            info!(target: "riddlebox_backend", base_url = %g.base_url, model = %g.model, "Generation enabled.");
        } else {
            info!(target: "riddlebox_backend", "Generation disabled (no GEMINI_API_KEY). Serving curated fallback content.");
        }

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::assemble(Arc::new(MemoryStore::new()), clock, gemini, cfg, StdRng::from_entropy())
    }

    fn assemble(
        store: Arc<dyn ContentStore>,
        clock: Arc<dyn Clock>,
        gemini: Option<Gemini>,
        cfg: PipelineConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            cache: DailyCache::new(clock.clone()),
            gemini,
            prompts: cfg.prompts,
            tuning: cfg.tuning,
            clock,
            rng: Mutex::new(rng),
        }
    }

    /// Deterministic state for tests: no generation client, seeded rng,
    /// fresh in-memory store.
    #[cfg(test)]
    pub fn for_tests(seed: u64) -> Self {
        Self::assemble(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            None,
            PipelineConfig::default(),
            StdRng::seed_from_u64(seed),
        )
    }
}
