//! Minimal Gemini client for our use-case.
//!
//! We only call generateContent and read back the first candidate's text.
//! Calls are instrumented and log model names, latencies, and response sizes
//! (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::util::trunc_for_log;

/// Typed failures of one generation call. The pipeline recovers every one of
/// these by falling back to curated content; none reach a client response.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
  /// Required secret absent. Raised before any network call is made.
  #[error("generation credential not configured")]
  NoCredentials,
  /// The bounded wait elapsed.
  #[error("generation request timed out")]
  Timeout,
  /// Non-success status or a transport-level failure.
  #[error("generation service error: {message}")]
  Upstream { message: String },
  /// Success status but no extractable candidate text.
  #[error("generation service returned no usable text")]
  EmptyResponse,
}

/// Per-call generation knobs. Retry policy deliberately lives with the
/// caller; this client performs exactly one request.
#[derive(Clone, Copy, Debug)]
pub struct GenerationConfig {
  pub temperature: f32,
  pub max_output_tokens: u32,
}

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// One text-in/text-out generation call with a bounded wait.
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  pub async fn generate(
    &self,
    prompt: &str,
    config: GenerationConfig,
  ) -> Result<String, GenerateError> {
    let url = format!(
      "{}/models/{}:generateContent?key={}",
      self.base_url, self.model, self.api_key
    );
    let req = GenerateContentRequest {
      contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
      generation_config: GenCfg {
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
      },
    };

    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "riddlebox-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&req)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          GenerateError::Timeout
        } else {
          GenerateError::Upstream { message: e.to_string() }
        }
      })?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(target: "riddlebox_backend", %status, "Generation call failed");
      return Err(GenerateError::Upstream { message: format!("HTTP {}: {}", status, msg) });
    }

    let body: GenerateContentResponse = res
      .json()
      .await
      .map_err(|e| GenerateError::Upstream { message: format!("bad response body: {}", e) })?;

    if let Some(usage) = &body.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        candidate_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }

    let text = body
      .candidates
      .first()
      .and_then(|c| c.content.parts.first())
      .map(|p| p.text.trim().to_string())
      .unwrap_or_default();

    let elapsed = start.elapsed();
    if text.is_empty() {
      error!(?elapsed, "Generation succeeded but carried no candidate text");
      return Err(GenerateError::EmptyResponse);
    }

    info!(?elapsed, response_len = text.len(), "Model response received");
    Ok(text)
  }
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateContentRequest {
  contents: Vec<Content>,
  #[serde(rename = "generationConfig")]
  generation_config: GenCfg,
}
#[derive(Serialize)]
struct Content {
  parts: Vec<Part>,
}
#[derive(Serialize, Deserialize)]
struct Part {
  #[serde(default)]
  text: String,
}
#[derive(Serialize)]
struct GenCfg {
  temperature: f32,
  #[serde(rename = "maxOutputTokens")]
  max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<RespCandidate>,
  #[serde(default, rename = "usageMetadata")]
  usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct RespCandidate {
  #[serde(default)]
  content: RespContent,
}
#[derive(Deserialize, Default)]
struct RespContent {
  #[serde(default)]
  parts: Vec<Part>,
}
#[derive(Deserialize)]
struct UsageMetadata {
  #[serde(default, rename = "promptTokenCount")]
  prompt_token_count: Option<u32>,
  #[serde(default, rename = "candidatesTokenCount")]
  candidates_token_count: Option<u32>,
  #[serde(default, rename = "totalTokenCount")]
  total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_body_message_is_extracted() {
    let body = r#"{"error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
    assert_eq!(extract_gemini_error(body), Some("quota exceeded".to_string()));
    assert_eq!(extract_gemini_error("<html>gateway error</html>"), None);
  }

  #[test]
  fn response_text_path_tolerates_missing_fields() {
    let body: GenerateContentResponse =
      serde_json::from_str(r#"{"candidates": [{"content": {}}]}"#).expect("body");
    let text = body
      .candidates
      .first()
      .and_then(|c| c.content.parts.first())
      .map(|p| p.text.clone());
    assert!(text.is_none());
  }
}
