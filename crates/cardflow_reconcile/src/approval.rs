//! The four-step approval protocol: detect approved-conflict days, require
//! explicit override confirmation for those, resolve every previous-day
//! slot (keep, override, or carry forward), then mark the card APPROVED.

use std::collections::HashSet;

use cardflow_db::repo::{day_entries, work_cards};
use cardflow_db::DbPool;
use cardflow_ids::{UserId, WorkCardId};

use crate::error::{ReconcileError, Result};
use crate::signature::EntrySignature;

pub struct ApprovalRequest {
    pub work_card_id: WorkCardId,
    pub approved_by: UserId,
    pub override_days: HashSet<i32>,
    pub confirm_override_approved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalSummary {
    pub carried_forward_days: Vec<i32>,
    pub overridden_days: Vec<i32>,
}

/// Runs the full approval protocol in a single transaction, committing only
/// once every day slot has been resolved and the card's terminal state is
/// about to be written.
pub async fn approve_work_card(pool: &DbPool, request: ApprovalRequest) -> Result<ApprovalSummary> {
    let card = work_cards::get(pool, request.work_card_id)
        .await
        .map_err(|_| ReconcileError::NotFound(request.work_card_id))?;

    let previous = match card.employee_id {
        Some(employee_id) => {
            work_cards::previous_card(pool, card.business_id, employee_id, card.processing_month, card.id).await?
        }
        None => None,
    };

    let Some(previous) = previous else {
        work_cards::approve(pool, card.id, request.approved_by).await?;
        return Ok(ApprovalSummary {
            carried_forward_days: vec![],
            overridden_days: vec![],
        });
    };

    let previous_entries = day_entries::list_for_card(pool, previous.id).await?;
    let current_entries = day_entries::list_for_card(pool, card.id).await?;
    let current_by_day: std::collections::HashMap<i32, _> =
        current_entries.iter().map(|entry| (entry.day_of_month, entry)).collect();

    let previous_approved = previous.review_status.is_approved();

    let approved_conflict_days: HashSet<i32> = previous_entries
        .iter()
        .filter(|previous_entry| {
            previous_approved
                && current_by_day
                    .get(&previous_entry.day_of_month)
                    .is_some_and(|current| EntrySignature::from(*current) != EntrySignature::from(*previous_entry))
        })
        .map(|entry| entry.day_of_month)
        .collect();

    let requested_overrides: Vec<i32> = request
        .override_days
        .intersection(&approved_conflict_days)
        .copied()
        .collect();
    if !requested_overrides.is_empty() && !request.confirm_override_approved {
        let mut days: Vec<i32> = approved_conflict_days.into_iter().collect();
        days.sort_unstable();
        return Err(ReconcileError::ApprovalOverrideRequired {
            approved_conflict_days: days,
        });
    }

    let mut tx = pool.begin().await.map_err(cardflow_db::DbError::from)?;
    let mut carried_forward_days = Vec::new();
    let mut overridden_days = Vec::new();

    for previous_entry in &previous_entries {
        let day = previous_entry.day_of_month;
        match current_by_day.get(&day) {
            Some(current_entry) => {
                if EntrySignature::from(*current_entry) == EntrySignature::from(previous_entry) {
                    continue;
                }
                if previous_approved {
                    if request.override_days.contains(&day) {
                        day_entries::delete_for_day(&mut *tx, previous.id, day).await?;
                        overridden_days.push(day);
                    } else {
                        day_entries::delete_for_day(&mut *tx, card.id, day).await?;
                        day_entries::clone_into(&mut *tx, previous_entry, card.id).await?;
                        carried_forward_days.push(day);
                    }
                } else {
                    day_entries::delete_for_day(&mut *tx, previous.id, day).await?;
                }
            }
            None => {
                day_entries::clone_into(&mut *tx, previous_entry, card.id).await?;
                carried_forward_days.push(day);
            }
        }
    }

    work_cards::approve(&mut *tx, card.id, request.approved_by).await?;
    tx.commit().await.map_err(cardflow_db::DbError::from)?;

    Ok(ApprovalSummary {
        carried_forward_days,
        overridden_days,
    })
}
