use async_trait::async_trait;
use cardflow_protocol::ExtractionResult;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::VisionError;

/// Capability interface a single model call must satisfy. Implementations
/// talk to one specific model; chaining across models is the orchestrator's
/// job, not the implementation's.
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract(
        &self,
        model: &str,
        image_bytes: &[u8],
        timeout: Duration,
    ) -> Result<ExtractionResult, VisionError>;
}

fn dedupe_models<I: IntoIterator<Item = S>, S: AsRef<str>>(models: I) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();
    for model in models {
        let candidate = model.as_ref().trim();
        if candidate.is_empty() || !seen.insert(candidate.to_string()) {
            continue;
        }
        ordered.push(candidate.to_string());
    }
    ordered
}

/// Orchestrates a primary/fallback/fast model chain over a single
/// [`VisionExtractor`] implementation, trying each model in order until one
/// returns a parseable result.
pub struct ChainVisionExtractor<E: VisionExtractor> {
    inner: E,
    models: Vec<String>,
    timeout: Duration,
}

impl<E: VisionExtractor> ChainVisionExtractor<E> {
    /// `primary`/`fallback`/`fast` plus any additional chain entries are
    /// de-duplicated in that order, mirroring the original's
    /// `_model_attempt_chain`.
    pub fn new(
        inner: E,
        primary: impl Into<String>,
        fallback: Option<String>,
        fast: Option<String>,
        extra_chain: Vec<String>,
        timeout: Duration,
    ) -> Self {
        let mut candidates = vec![primary.into()];
        candidates.extend(fallback);
        candidates.extend(fast);
        candidates.extend(extra_chain);
        Self {
            inner,
            models: dedupe_models(candidates),
            timeout,
        }
    }

    pub async fn extract(&self, image_bytes: &[u8]) -> Result<ExtractionResult, VisionError> {
        let mut last_err = None;
        for (index, model) in self.models.iter().enumerate() {
            match self.inner.extract(model, image_bytes, self.timeout).await {
                Ok(mut result) => {
                    let used_fallback = index > 0;
                    if used_fallback {
                        warn!(model, "vision extraction succeeded on a fallback model");
                    } else {
                        info!(model, "vision extraction succeeded on primary model");
                    }
                    result.model_name = model.clone();
                    result.used_fallback = used_fallback;
                    return Ok(result);
                }
                Err(err) => {
                    warn!(model, error = %err, "vision model attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(VisionError::ChainExhausted))
    }
}

/// Deterministic stand-in for tests: returns a pre-built result (or error)
/// without making any network call.
pub struct FakeVisionExtractor {
    pub result: Result<ExtractionResult, VisionError>,
}

impl Clone for FakeVisionExtractor {
    fn clone(&self) -> Self {
        Self {
            result: match &self.result {
                Ok(r) => Ok(r.clone()),
                Err(_) => Err(VisionError::ChainExhausted),
            },
        }
    }
}

#[async_trait]
impl VisionExtractor for FakeVisionExtractor {
    async fn extract(
        &self,
        _model: &str,
        _image_bytes: &[u8],
        _timeout: Duration,
    ) -> Result<ExtractionResult, VisionError> {
        match &self.result {
            Ok(r) => Ok(r.clone()),
            Err(_) => Err(VisionError::ChainExhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardflow_protocol::{ExtractedEntry, RowState};
    use rust_decimal::Decimal;

    fn sample_result(model: &str) -> ExtractionResult {
        ExtractionResult {
            employee_name: Some("Dan".to_string()),
            passport_id_candidates: vec![],
            selected_passport_id_normalized: Some("N123456".to_string()),
            entries: vec![ExtractedEntry {
                day: 1,
                start_time: None,
                end_time: None,
                total_hours: Some(Decimal::new(900, 2)),
                row_state: RowState::Worked,
                mark_type: None,
                row_confidence: 0.9,
                evidence: vec![],
            }],
            model_name: model.to_string(),
            used_fallback: false,
        }
    }

    struct FailThenSucceed {
        fail_models: Vec<String>,
    }

    #[async_trait]
    impl VisionExtractor for FailThenSucceed {
        async fn extract(
            &self,
            model: &str,
            _image_bytes: &[u8],
            _timeout: Duration,
        ) -> Result<ExtractionResult, VisionError> {
            if self.fail_models.iter().any(|m| m == model) {
                return Err(VisionError::Unparseable {
                    model: model.to_string(),
                    detail: "no json".to_string(),
                });
            }
            Ok(sample_result(model))
        }
    }

    #[tokio::test]
    async fn chain_dedupes_model_list() {
        let chain = ChainVisionExtractor::new(
            FailThenSucceed { fail_models: vec![] },
            "gpt-4.1-mini",
            Some("gpt-4.1-mini".to_string()),
            Some("gpt-4.1-mini".to_string()),
            vec![],
            Duration::from_secs(1),
        );
        assert_eq!(chain.models, vec!["gpt-4.1-mini".to_string()]);
    }

    #[tokio::test]
    async fn chain_falls_through_to_next_model_on_failure() {
        let chain = ChainVisionExtractor::new(
            FailThenSucceed {
                fail_models: vec!["primary".to_string()],
            },
            "primary",
            Some("fallback".to_string()),
            None,
            vec![],
            Duration::from_secs(1),
        );
        let result = chain.extract(b"bytes").await.unwrap();
        assert_eq!(result.model_name, "fallback");
        assert!(result.used_fallback);
    }

    #[tokio::test]
    async fn chain_exhausted_when_every_model_fails() {
        struct AlwaysFail;
        #[async_trait]
        impl VisionExtractor for AlwaysFail {
            async fn extract(
                &self,
                model: &str,
                _image_bytes: &[u8],
                _timeout: Duration,
            ) -> Result<ExtractionResult, VisionError> {
                Err(VisionError::Unparseable {
                    model: model.to_string(),
                    detail: "bad".to_string(),
                })
            }
        }
        let chain = ChainVisionExtractor::new(
            AlwaysFail,
            "primary",
            None,
            None,
            vec![],
            Duration::from_secs(1),
        );
        let err = chain.extract(b"bytes").await.unwrap_err();
        assert!(matches!(err, VisionError::Unparseable { .. }));
    }
}
