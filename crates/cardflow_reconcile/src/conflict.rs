//! Day-level conflict classification between a card and its immediate
//! previous card, per the approval-lock rules.

use std::collections::HashMap;

use cardflow_db::WorkCardDayEntry;
use cardflow_protocol::ConflictType;

use crate::signature::EntrySignature;

#[derive(Debug, Clone, PartialEq)]
pub struct DayConflict {
    pub day_of_month: i32,
    pub has_conflict: bool,
    pub conflict_type: Option<ConflictType>,
    pub is_locked: bool,
}

/// Classifies one day against its counterpart on the previous card.
/// `previous_approved` is whether the previous card itself is APPROVED.
pub fn classify_day(
    day_of_month: i32,
    current_entry: Option<&WorkCardDayEntry>,
    previous_entry: Option<&WorkCardDayEntry>,
    previous_approved: bool,
) -> DayConflict {
    let (has_conflict, conflict_type, is_locked) = match (current_entry, previous_entry) {
        (Some(current), Some(previous)) if EntrySignature::from(current) != EntrySignature::from(previous) => {
            if previous_approved {
                (true, Some(ConflictType::WithApproved), true)
            } else {
                (true, Some(ConflictType::WithPending), false)
            }
        }
        _ => (false, None, false),
    };
    DayConflict {
        day_of_month,
        has_conflict,
        conflict_type,
        is_locked,
    }
}

/// Classifies every day present on either card. Days that only exist on the
/// previous card are included too, since they carry full-month context even
/// before they are copied forward at approval time.
pub fn classify_card(
    current_entries: &[WorkCardDayEntry],
    previous_entries: &[WorkCardDayEntry],
    previous_approved: bool,
) -> Vec<DayConflict> {
    let previous_by_day: HashMap<i32, &WorkCardDayEntry> =
        previous_entries.iter().map(|entry| (entry.day_of_month, entry)).collect();
    let current_by_day: HashMap<i32, &WorkCardDayEntry> =
        current_entries.iter().map(|entry| (entry.day_of_month, entry)).collect();

    let mut days: Vec<i32> = current_by_day.keys().chain(previous_by_day.keys()).copied().collect();
    days.sort_unstable();
    days.dedup();

    days.into_iter()
        .map(|day| {
            classify_day(
                day,
                current_by_day.get(&day).copied(),
                previous_by_day.get(&day).copied(),
                previous_approved,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardflow_ids::{UserId, WorkCardDayEntryId, WorkCardId};
    use cardflow_protocol::DayEntrySource;
    use rust_decimal::Decimal;

    fn entry(day: i32, total: i64) -> WorkCardDayEntry {
        WorkCardDayEntry {
            id: WorkCardDayEntryId::new(),
            work_card_id: WorkCardId::new(),
            day_of_month: day,
            from_time: None,
            to_time: None,
            total_hours: Some(Decimal::new(total, 2)),
            source: DayEntrySource::Extracted,
            is_valid: true,
            validation_errors: None,
            updated_by: None::<UserId>,
        }
    }

    #[test]
    fn differing_value_against_approved_previous_is_locked() {
        let current = entry(3, 800);
        let previous = entry(3, 900);
        let conflict = classify_day(3, Some(&current), Some(&previous), true);
        assert!(conflict.has_conflict);
        assert!(conflict.is_locked);
        assert_eq!(conflict.conflict_type, Some(ConflictType::WithApproved));
    }

    #[test]
    fn differing_value_against_pending_previous_is_not_locked() {
        let current = entry(3, 800);
        let previous = entry(3, 900);
        let conflict = classify_day(3, Some(&current), Some(&previous), false);
        assert!(conflict.has_conflict);
        assert!(!conflict.is_locked);
        assert_eq!(conflict.conflict_type, Some(ConflictType::WithPending));
    }

    #[test]
    fn identical_value_has_no_conflict_even_if_previous_approved() {
        let current = entry(3, 900);
        let previous = entry(3, 900);
        let conflict = classify_day(3, Some(&current), Some(&previous), true);
        assert!(!conflict.has_conflict);
        assert!(!conflict.is_locked);
    }

    #[test]
    fn missing_previous_day_is_not_a_conflict() {
        let current = entry(3, 900);
        let conflict = classify_day(3, Some(&current), None, true);
        assert!(!conflict.has_conflict);
    }
}
