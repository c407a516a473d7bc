//! Minimal record store boundary: append-only persistence plus the recent
//! answer history consulted for duplicate suppression.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tracing::debug;
use uuid::Uuid;

use crate::domain::{normalize_answer, PuzzleRecord};

/// The persistence surface the pipeline relies on. Append is atomic per
/// record. History reads are snapshot reads: a record appended concurrently
/// may or may not be visible, which keeps duplicate suppression best-effort
/// rather than a strict constraint.
pub trait ContentStore: Send + Sync {
    /// Persist an accepted record, returning the id it was stored under.
    fn append(&self, record: PuzzleRecord) -> String;
    /// Normalized answers of the most recent `limit` records.
    fn recent_answers(&self, limit: usize) -> HashSet<String>;
    fn count(&self) -> usize;
    /// Record counts grouped by provenance, for diagnostics.
    fn count_by_source(&self) -> HashMap<String, usize>;
}

/// In-memory store used by the server and by tests. Records are only ever
/// appended; nothing in this subsystem mutates or deletes them.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<PuzzleRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<PuzzleRecord>> {
        // a poisoned lock only means a writer panicked mid-push; the data
        // itself is still a valid Vec
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl ContentStore for MemoryStore {
    fn append(&self, mut record: PuzzleRecord) -> String {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        let id = record.id.clone();
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.push(record);
        debug!(target: "puzzle", %id, total = records.len(), "Record appended");
        id
    }

    fn recent_answers(&self, limit: usize) -> HashSet<String> {
        self.read()
            .iter()
            .rev()
            .take(limit)
            .map(|r| normalize_answer(&r.answer))
            .filter(|a| !a.is_empty())
            .collect()
    }

    fn count(&self) -> usize {
        self.read().len()
    }

    fn count_by_source(&self) -> HashMap<String, usize> {
        let mut out = HashMap::new();
        for record in self.read().iter() {
            *out.entry(record.source.as_str().to_string()).or_insert(0) += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PuzzleKind, PuzzleSource};
    use chrono::Utc;

    fn record(answer: &str, source: PuzzleSource) -> PuzzleRecord {
        PuzzleRecord {
            id: String::new(),
            question: "What gets wet while drying?".into(),
            hint: "bathroom".into(),
            answer: answer.into(),
            explanation: "it dries you".into(),
            options: None,
            kind: PuzzleKind::Riddle,
            theme: "object".into(),
            source,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn append_assigns_an_id() {
        let store = MemoryStore::new();
        let id = store.append(record("towel", PuzzleSource::Generated));
        assert!(!id.is_empty());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn recent_answers_windows_from_the_newest_side() {
        let store = MemoryStore::new();
        for answer in ["piano", "coin", "towel", "comb"] {
            store.append(record(answer, PuzzleSource::Generated));
        }
        let recent = store.recent_answers(2);
        assert!(recent.contains("towel") && recent.contains("comb"));
        assert!(!recent.contains("piano"));
    }

    #[test]
    fn counts_group_by_provenance() {
        let store = MemoryStore::new();
        store.append(record("piano", PuzzleSource::Generated));
        store.append(record("coin", PuzzleSource::FallbackCurated));
        store.append(record("comb", PuzzleSource::FallbackCurated));
        let counts = store.count_by_source();
        assert_eq!(counts.get("generated"), Some(&1));
        assert_eq!(counts.get("fallback-curated"), Some(&2));
    }
}
