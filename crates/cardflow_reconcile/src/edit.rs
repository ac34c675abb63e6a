//! Bulk day-entry replacement with the locked-day rule: a day that was
//! approved on the previous card cannot be silently overwritten with a
//! different signature.

use cardflow_db::repo::{day_entries, work_cards};
use cardflow_db::DbPool;
use cardflow_ids::{UserId, WorkCardId};
use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::error::{ReconcileError, Result};
use crate::signature::EntrySignature;

#[derive(Debug, Clone)]
pub struct DayEntryEdit {
    pub day_of_month: i32,
    pub from_time: Option<NaiveTime>,
    pub to_time: Option<NaiveTime>,
    pub total_hours: Option<Decimal>,
}

/// Validates against the locked-day rule, then replaces every day entry on
/// `work_card_id` with `edits` in one statement. Rejects the whole batch if
/// any edit would silently change a day locked by an approved previous
/// card; equal-signature no-op edits for locked days are allowed through.
pub async fn update_day_entries(
    pool: &DbPool,
    work_card_id: WorkCardId,
    edits: Vec<DayEntryEdit>,
    updated_by: Option<UserId>,
) -> Result<()> {
    for edit in &edits {
        if !(1..=31).contains(&edit.day_of_month) {
            return Err(ReconcileError::DayOutOfRange(edit.day_of_month));
        }
    }

    let card = work_cards::get(pool, work_card_id)
        .await
        .map_err(|_| ReconcileError::NotFound(work_card_id))?;

    if let Some(employee_id) = card.employee_id {
        let previous =
            work_cards::previous_card(pool, card.business_id, employee_id, card.processing_month, card.id).await?;
        if let Some(previous) = previous.filter(|previous| previous.review_status.is_approved()) {
            let previous_entries = day_entries::list_for_card(pool, previous.id).await?;
            let locked: std::collections::HashMap<i32, EntrySignature> = previous_entries
                .iter()
                .map(|entry| (entry.day_of_month, EntrySignature::from(entry)))
                .collect();

            for edit in &edits {
                if let Some(previous_signature) = locked.get(&edit.day_of_month) {
                    let incoming = EntrySignature::new(edit.from_time, edit.to_time, edit.total_hours);
                    if incoming != *previous_signature {
                        return Err(ReconcileError::DayLocked {
                            day: edit.day_of_month,
                        });
                    }
                }
            }
        }
    }

    let rows: Vec<(i32, Option<NaiveTime>, Option<NaiveTime>, Option<Decimal>)> = edits
        .into_iter()
        .map(|edit| (edit.day_of_month, edit.from_time, edit.to_time, edit.total_hours))
        .collect();
    day_entries::replace_all(pool, work_card_id, &rows, updated_by).await?;
    Ok(())
}
