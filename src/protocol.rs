//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{PuzzleKind, PuzzleRecord, PuzzleSource};
use crate::pipeline::Served;

/// DTO for a served puzzle record.
#[derive(Debug, Serialize)]
pub struct PuzzleOut {
    pub id: String,
    pub question: String,
    pub hint: String,
    pub answer: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: PuzzleKind,
    pub source: PuzzleSource,

    // endurance request metadata, echoed back as-is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_mode: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,
}

/// Success envelope wrapped around every served record. Failures inside the
/// pipeline never surface here; provenance does.
#[derive(Debug, Serialize)]
pub struct PuzzleEnvelope {
    pub success: bool,
    pub ai_generated: bool,
    pub fallback: bool,
    pub cached: bool,
    pub unique: bool,
    pub message: String,
    pub theme: String,
    pub data: PuzzleOut,
}

/// Convert the internal record to the public DTO.
pub fn to_out(record: &PuzzleRecord) -> PuzzleOut {
    PuzzleOut {
        id: record.id.clone(),
        question: record.question.clone(),
        hint: record.hint.clone(),
        answer: record.answer.clone(),
        explanation: record.explanation.clone(),
        options: record.options.clone(),
        kind: record.kind,
        source: record.source,
        time_mode: None,
        question_number: None,
    }
}

/// Build the success envelope for a served pipeline result.
pub fn envelope(served: &Served) -> PuzzleEnvelope {
    let ai_generated = served.record.source == PuzzleSource::Generated;
    let message = match (served.cached, served.record.source) {
        (true, _) => "Serving today's puzzle".to_string(),
        (false, PuzzleSource::Generated) => "AI puzzle generated successfully!".to_string(),
        (false, PuzzleSource::FallbackCurated) => "Using fallback puzzle".to_string(),
        (false, PuzzleSource::FallbackSystem) => "Using built-in fallback puzzle".to_string(),
    };
    PuzzleEnvelope {
        success: true,
        ai_generated,
        fallback: !ai_generated,
        cached: served.cached,
        unique: served.unique,
        message,
        theme: served.record.theme.clone(),
        data: to_out(&served.record),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct PuzzleQuery {
    pub theme: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnduranceQuery {
    pub theme: Option<String>,
    /// Selected time mode in seconds.
    pub time: Option<u32>,
    /// One-based question counter within the run.
    pub q: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateIn {
    pub key: String,
}
#[derive(Serialize)]
pub struct InvalidateOut {
    pub cleared: bool,
}

#[derive(Serialize)]
pub struct StatsOut {
    pub count: usize,
    pub count_by_source: HashMap<String, usize>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize_answer;
    use chrono::Utc;

    fn record(source: PuzzleSource) -> PuzzleRecord {
        PuzzleRecord {
            id: "r1".into(),
            question: "What has keys but can't open locks?".into(),
            hint: "Think about musical instruments".into(),
            answer: normalize_answer("Piano."),
            explanation: "Musical keys, not lock keys.".into(),
            options: None,
            kind: PuzzleKind::Riddle,
            theme: "object".into(),
            source,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn envelope_flags_follow_provenance() {
        let served =
            Served { record: record(PuzzleSource::Generated), unique: true, cached: false };
        let env = envelope(&served);
        assert!(env.success && env.ai_generated && !env.fallback);

        let served =
            Served { record: record(PuzzleSource::FallbackCurated), unique: false, cached: false };
        let env = envelope(&served);
        assert!(env.success && !env.ai_generated && env.fallback);
        assert!(!env.unique);
    }

    #[test]
    fn riddle_payload_omits_optional_fields() {
        let served =
            Served { record: record(PuzzleSource::Generated), unique: true, cached: true };
        let json = serde_json::to_value(envelope(&served)).expect("json");
        assert_eq!(json["cached"], true);
        assert_eq!(json["data"]["type"], "riddle");
        assert_eq!(json["data"]["source"], "generated");
        assert!(json["data"].get("options").is_none());
        assert!(json["data"].get("time_mode").is_none());
    }
}
