//! Daily result cache: one computed result per calendar day per content type.
//!
//! This replaces what would otherwise be a module-level mutable "today's
//! result" slot with an explicit component. The clock is injected so tests
//! can cross day boundaries deterministically.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::PuzzleKind;

/// Time source abstraction. The server uses `SystemClock`; tests drive a
/// manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct Slot<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct DailyCache<V> {
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone> DailyCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, slots: Mutex::new(HashMap::new()) }
    }

    /// Cache key for a content type on the current calendar day,
    /// e.g. `riddle:2024-06-01`.
    pub fn key_for(&self, kind: PuzzleKind) -> String {
        format!("{}:{}", kind.as_str(), self.clock.now().date_naive())
    }

    /// Serve the stored value for `key`, or run `compute` and store its
    /// result with an end-of-day expiry. Returns the value plus whether it
    /// came from the cache.
    ///
    /// The lock is not held across `compute` (a generation call can take
    /// seconds), so concurrent first-of-day requests may each compute. The
    /// slot is last-write-wins; every computed record was already persisted
    /// by the caller, so only the *served* record for the day is
    /// nondeterministic.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> (V, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let now = self.clock.now();
        {
            let slots = self.slots.lock().await;
            if let Some(slot) = slots.get(key) {
                if slot.expires_at > now {
                    debug!(target: "puzzle", %key, "Daily cache hit");
                    return (slot.value.clone(), true);
                }
            }
        }

        let value = compute().await;
        let expires_at = end_of_day(now);
        let mut slots = self.slots.lock().await;
        slots.insert(key.to_string(), Slot { value: value.clone(), expires_at });
        info!(target: "puzzle", %key, %expires_at, "Daily cache slot filled");
        (value, false)
    }

    /// Drop a slot early (operational testing); the next call recomputes.
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.slots.lock().await.remove(key).is_some();
        info!(target: "puzzle", %key, removed, "Daily cache invalidation requested");
        removed
    }
}

/// Midnight after `now`. Falls back to a fixed 24h TTL on the (unreachable
/// in practice) calendar edge.
fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| now + Duration::hours(24))
}
