//! The structured output contract a single vision-model call must produce,
//! shared between `cardflow_vision` (producer) and `cardflow_scheduler`
//! (consumer) so neither depends on the other.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Coarse classification of a single extracted day row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowState {
    Worked,
    OffMark,
    Empty,
}

/// One passport-id reading the model surfaced, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassportCandidate {
    pub raw: String,
    pub normalized: Option<String>,
    pub source_region: String,
    pub confidence: f64,
}

/// One day row as returned by the model, before semantic gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntry {
    pub day: i32,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub total_hours: Option<Decimal>,
    pub row_state: RowState,
    pub mark_type: Option<String>,
    pub row_confidence: f64,
    pub evidence: Vec<String>,
}

/// Full single-pass result of a successful vision model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub employee_name: Option<String>,
    pub passport_id_candidates: Vec<PassportCandidate>,
    pub selected_passport_id_normalized: Option<String>,
    pub entries: Vec<ExtractedEntry>,
    /// Name of the model in the chain that produced this result.
    pub model_name: String,
    /// True if a model earlier in the chain was tried and failed first.
    pub used_fallback: bool,
}
