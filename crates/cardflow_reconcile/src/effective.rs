//! Effective-card selection: partition cards by employee, rank
//! APPROVED-first then newest-first, take the top of each partition.

use std::collections::HashMap;

use cardflow_db::WorkCard;
use cardflow_ids::EmployeeId;

/// Rank key for which of an employee's cards "wins" on a read path.
/// Greater is better: APPROVED cards outrank everything else, then the
/// most recently created card, then the largest id as a deterministic
/// tiebreak against identical timestamps.
fn rank_key(card: &WorkCard) -> (u8, chrono::DateTime<chrono::Utc>, uuid::Uuid) {
    let tier = if card.review_status.is_approved() { 1u8 } else { 0u8 };
    (tier, card.created_at, card.id.as_uuid())
}

/// Selects the single effective card per employee from `cards`, which must
/// already be scoped to one `(business, site, month)`. If `approved_only`,
/// non-approved cards are excluded before ranking.
pub fn select_effective_cards(cards: Vec<WorkCard>, approved_only: bool) -> HashMap<EmployeeId, WorkCard> {
    let mut by_employee: HashMap<EmployeeId, Vec<WorkCard>> = HashMap::new();
    for card in cards {
        let Some(employee_id) = card.employee_id else {
            continue;
        };
        if approved_only && !card.review_status.is_approved() {
            continue;
        }
        by_employee.entry(employee_id).or_default().push(card);
    }

    by_employee
        .into_iter()
        .filter_map(|(employee_id, group)| {
            group
                .into_iter()
                .max_by(|a, b| rank_key(a).cmp(&rank_key(b)))
                .map(|card| (employee_id, card))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardflow_ids::{BusinessId, SiteId, WorkCardId};
    use cardflow_protocol::{ReviewStatus, WorkCardSource};
    use chrono::{TimeZone, Utc};

    fn card(
        id: WorkCardId,
        employee_id: EmployeeId,
        status: ReviewStatus,
        created_at: chrono::DateTime<Utc>,
    ) -> WorkCard {
        WorkCard {
            id,
            business_id: BusinessId::new(),
            site_id: Some(SiteId::new()),
            employee_id: Some(employee_id),
            processing_month: chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            source: WorkCardSource::AdminSingle,
            original_filename: "card.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            size: 100,
            review_status: status,
            approved_by: None,
            approved_at: None,
            created_at,
        }
    }

    #[test]
    fn approved_beats_newer_non_approved() {
        let employee = EmployeeId::new();
        let c1 = card(
            WorkCardId::new(),
            employee,
            ReviewStatus::Approved,
            Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap(),
        );
        let c2 = card(
            WorkCardId::new(),
            employee,
            ReviewStatus::NeedsReview,
            Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
        );
        let c3 = card(
            WorkCardId::new(),
            employee,
            ReviewStatus::Approved,
            Utc.with_ymd_and_hms(2026, 2, 1, 11, 0, 0).unwrap(),
        );
        let c1_id = c1.id;

        let effective = select_effective_cards(vec![c1, c2, c3], false);
        assert_eq!(effective.get(&employee).unwrap().id, c1_id);
        assert_eq!(effective.get(&employee).unwrap().review_status, ReviewStatus::Approved);
    }

    #[test]
    fn approved_only_excludes_non_approved_partitions() {
        let employee = EmployeeId::new();
        let c1 = card(
            WorkCardId::new(),
            employee,
            ReviewStatus::NeedsReview,
            Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap(),
        );
        let effective = select_effective_cards(vec![c1], true);
        assert!(effective.get(&employee).is_none());
    }

    #[test]
    fn unassigned_cards_are_excluded() {
        let mut card = card(
            WorkCardId::new(),
            EmployeeId::new(),
            ReviewStatus::NeedsAssignment,
            Utc::now(),
        );
        card.employee_id = None;
        let effective = select_effective_cards(vec![card], false);
        assert!(effective.is_empty());
    }
}
