//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! pipeline; every response is a success envelope with provenance flags.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::PuzzleKind;
use crate::pipeline;
use crate::protocol::*;
use crate::state::AppState;
use crate::store::ContentStore;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state), fields(theme = ?q.theme))]
pub async fn http_get_riddle(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PuzzleQuery>,
) -> impl IntoResponse {
  let served = pipeline::serve_daily(&state, PuzzleKind::Riddle, q.theme.as_deref()).await;
  info!(target: "puzzle", id = %served.record.id, cached = served.cached, "HTTP riddle served");
  Json(envelope(&served))
}

#[instrument(level = "info", skip(state), fields(theme = ?q.theme))]
pub async fn http_get_logic(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PuzzleQuery>,
) -> impl IntoResponse {
  let served = pipeline::serve_daily(&state, PuzzleKind::Logic, q.theme.as_deref()).await;
  info!(target: "puzzle", id = %served.record.id, cached = served.cached, "HTTP logic question served");
  Json(envelope(&served))
}

#[instrument(level = "info", skip(state), fields(theme = ?q.theme, time = ?q.time, q = ?q.q))]
pub async fn http_get_endurance(
  State(state): State<Arc<AppState>>,
  Query(q): Query<EnduranceQuery>,
) -> impl IntoResponse {
  let served = pipeline::serve_daily(&state, PuzzleKind::Endurance, q.theme.as_deref()).await;
  let mut env = envelope(&served);
  env.data.time_mode = Some(q.time.unwrap_or(60));
  env.data.question_number = Some(q.q.unwrap_or(1));
  info!(target: "puzzle", id = %served.record.id, cached = served.cached, "HTTP endurance item served");
  Json(env)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(StatsOut {
    count: state.store.count(),
    count_by_source: state.store.count_by_source(),
  })
}

#[instrument(level = "info", skip(state, body), fields(%body.key))]
pub async fn http_post_invalidate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<InvalidateIn>,
) -> impl IntoResponse {
  let cleared = state.cache.invalidate(&body.key).await;
  Json(InvalidateOut { cleared })
}
