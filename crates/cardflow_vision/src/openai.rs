//! Talks to an OpenAI-compatible chat-completions endpoint with vision
//! input and parses its structured JSON response into an [`ExtractionResult`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use cardflow_protocol::{ExtractedEntry, ExtractionResult, PassportCandidate, RowState};
use serde::Deserialize;

use crate::chain::VisionExtractor;
use crate::error::VisionError;

const SYSTEM_PROMPT: &str = "Extract the employee name, passport id candidates, and per-day \
work hour rows from this monthly time card photograph. Respond with JSON only.";

pub struct OpenAiVisionExtractor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiVisionExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct RawPassportCandidate {
    raw: String,
    source_region: String,
    confidence: f64,
}

#[derive(Deserialize)]
struct RawEntry {
    day: i32,
    start_time: Option<String>,
    end_time: Option<String>,
    total_hours: Option<f64>,
    row_state: RowState,
    mark_type: Option<String>,
    row_confidence: f64,
    #[serde(default)]
    evidence: Vec<String>,
}

#[derive(Deserialize)]
struct RawStructuredOutput {
    employee_name: Option<String>,
    #[serde(default)]
    passport_id_candidates: Vec<RawPassportCandidate>,
    #[serde(default)]
    entries: Vec<RawEntry>,
}

fn parse_time(value: &Option<String>) -> Option<chrono::NaiveTime> {
    value
        .as_deref()
        .and_then(|s| chrono::NaiveTime::parse_from_str(s, "%H:%M").ok())
}

#[async_trait]
impl VisionExtractor for OpenAiVisionExtractor {
    async fn extract(
        &self,
        model: &str,
        image_bytes: &[u8],
        timeout: Duration,
    ) -> Result<ExtractionResult, VisionError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);
        let body = serde_json::json!({
            "model": model,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {
                    "role": "user",
                    "content": [
                        {"type": "image_url", "image_url": {"url": format!("data:image/jpeg;base64,{encoded}")}}
                    ]
                }
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    VisionError::Timeout {
                        model: model.to_string(),
                        timeout_secs: timeout.as_secs(),
                    }
                } else {
                    VisionError::Transport {
                        model: model.to_string(),
                        source,
                    }
                }
            })?;

        let payload: serde_json::Value = response.json().await.map_err(|source| VisionError::Transport {
            model: model.to_string(),
            source,
        })?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| VisionError::Unparseable {
                model: model.to_string(),
                detail: "missing choices[0].message.content".to_string(),
            })?;

        let raw: RawStructuredOutput =
            serde_json::from_str(content).map_err(|e| VisionError::Unparseable {
                model: model.to_string(),
                detail: e.to_string(),
            })?;

        // Normalization is left to cardflow_scheduler/cardflow_matching, which
        // already own the canonical passport rules; this layer only parses
        // the model's raw structured output.
        let passport_id_candidates = raw
            .passport_id_candidates
            .into_iter()
            .map(|c| PassportCandidate {
                normalized: None,
                raw: c.raw,
                source_region: c.source_region,
                confidence: c.confidence,
            })
            .collect();

        let entries = raw
            .entries
            .into_iter()
            .map(|e| ExtractedEntry {
                day: e.day,
                start_time: parse_time(&e.start_time),
                end_time: parse_time(&e.end_time),
                total_hours: e.total_hours.and_then(rust_decimal::Decimal::from_f64_retain),
                row_state: e.row_state,
                mark_type: e.mark_type,
                row_confidence: e.row_confidence,
                evidence: e.evidence,
            })
            .collect();

        Ok(ExtractionResult {
            employee_name: raw.employee_name,
            passport_id_candidates,
            selected_passport_id_normalized: None,
            entries,
            model_name: model.to_string(),
            used_fallback: false,
        })
    }
}
