//! Pure transform over raw extracted rows: enforces off-mark forcing,
//! flags low-confidence total-only and time/total-conflict rows for
//! review, and rejects rows outside the valid day range.

use std::collections::BTreeMap;

use cardflow_protocol::{ExtractedEntry, RowState};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f64 = 0.8;
pub const DEFAULT_TIME_TOTAL_CONFLICT_HOURS: f64 = 0.25;

/// Tunable thresholds for the two confidence-sensitive gate rules.
/// Deliberately struct fields rather than environment variables: the
/// embedder configures these at construction time.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    pub low_confidence_threshold: f64,
    pub time_total_conflict_hours: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
            time_total_conflict_hours: DEFAULT_TIME_TOTAL_CONFLICT_HOURS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowQuality {
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityMap {
    pub row_quality_by_day: BTreeMap<i32, RowQuality>,
    pub review_required_days: Vec<i32>,
    pub off_mark_days: Vec<i32>,
}

/// Applies the four gate rules and returns the effective entries plus the
/// per-day quality diagnostics. Rows outside `[1, 31]` are dropped entirely.
pub fn apply_semantic_gate(
    entries: Vec<ExtractedEntry>,
    config: GateConfig,
) -> (Vec<ExtractedEntry>, QualityMap) {
    let mut effective = Vec::new();
    let mut quality = QualityMap::default();

    for mut entry in entries {
        if !(1..=31).contains(&entry.day) {
            continue;
        }

        let mut reasons = Vec::new();

        let has_complete_time_pair = entry.start_time.is_some() && entry.end_time.is_some();

        if entry.row_state == RowState::OffMark && !has_complete_time_pair {
            entry.total_hours = None;
            quality.off_mark_days.push(entry.day);
        }

        if entry.total_hours.is_some()
            && entry.start_time.is_none()
            && entry.end_time.is_none()
            && entry.row_confidence < config.low_confidence_threshold
        {
            reasons.push("low_conf_total_only".to_string());
            quality.review_required_days.push(entry.day);
        }

        if let (Some(start), Some(end), Some(total)) =
            (entry.start_time, entry.end_time, entry.total_hours)
        {
            let elapsed_hours = (end - start).num_minutes() as f64 / 60.0;
            let total_f64 = total.to_f64().unwrap_or(0.0);
            if (total_f64 - elapsed_hours).abs() > config.time_total_conflict_hours {
                reasons.push("time_total_conflict".to_string());
                quality.review_required_days.push(entry.day);
            }
        }

        if !reasons.is_empty() {
            quality
                .row_quality_by_day
                .entry(entry.day)
                .or_default()
                .reasons
                .extend(reasons);
        }

        effective.push(entry);
    }

    (effective, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn base_entry(day: i32) -> ExtractedEntry {
        ExtractedEntry {
            day,
            start_time: None,
            end_time: None,
            total_hours: None,
            row_state: RowState::Worked,
            mark_type: None,
            row_confidence: 0.95,
            evidence: vec![],
        }
    }

    #[test]
    fn off_mark_without_time_pair_drops_total_and_records_day() {
        let mut entry = base_entry(7);
        entry.row_state = RowState::OffMark;
        entry.mark_type = Some("SINGLE_LINE".to_string());
        entry.total_hours = Some(Decimal::new(1000, 2));
        entry.row_confidence = 0.92;

        let (entries, quality) = apply_semantic_gate(vec![entry], GateConfig::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_hours, None);
        assert_eq!(entries[0].row_state, RowState::OffMark);
        assert!(quality.off_mark_days.contains(&7));
    }

    #[test]
    fn low_confidence_total_only_flags_review() {
        let mut entry = base_entry(11);
        entry.total_hours = Some(Decimal::new(850, 2));
        entry.row_confidence = 0.6;

        let (entries, quality) = apply_semantic_gate(vec![entry], GateConfig::default());
        assert_eq!(entries.len(), 1);
        assert!(quality.review_required_days.contains(&11));
        assert!(quality.row_quality_by_day[&11]
            .reasons
            .contains(&"low_conf_total_only".to_string()));
    }

    #[test]
    fn time_total_conflict_flags_review() {
        let mut entry = base_entry(20);
        entry.start_time = Some(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        entry.end_time = Some(NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        entry.total_hours = Some(Decimal::new(400, 2));
        entry.row_confidence = 0.95;

        let (entries, quality) = apply_semantic_gate(vec![entry], GateConfig::default());
        assert_eq!(entries.len(), 1);
        assert!(quality.review_required_days.contains(&20));
        assert!(quality.row_quality_by_day[&20]
            .reasons
            .contains(&"time_total_conflict".to_string()));
    }

    #[test]
    fn day_out_of_range_is_dropped() {
        let entry_zero = base_entry(0);
        let entry_over = base_entry(32);
        let (entries, _) = apply_semantic_gate(vec![entry_zero, entry_over], GateConfig::default());
        assert!(entries.is_empty());
    }

    #[test]
    fn boundary_days_are_accepted() {
        let (entries, _) =
            apply_semantic_gate(vec![base_entry(1), base_entry(31)], GateConfig::default());
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn matching_time_and_total_is_not_flagged() {
        let mut entry = base_entry(3);
        entry.start_time = Some(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        entry.end_time = Some(NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        entry.total_hours = Some(Decimal::new(900, 2));

        let (entries, quality) = apply_semantic_gate(vec![entry], GateConfig::default());
        assert_eq!(entries.len(), 1);
        assert!(quality.review_required_days.is_empty());
    }
}
