//! WorkCardDayEntry persistence. Write operations accept any `PgExecutor` so
//! callers (typically `cardflow_reconcile`) can run a batch of them inside a
//! single transaction.

use cardflow_ids::{UserId, WorkCardDayEntryId, WorkCardId};
use cardflow_protocol::DayEntrySource;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::WorkCardDayEntry;

pub async fn list_for_card<'c>(
    executor: impl PgExecutor<'c>,
    work_card_id: WorkCardId,
) -> Result<Vec<WorkCardDayEntry>> {
    let rows = sqlx::query_as::<_, WorkCardDayEntry>(
        "SELECT * FROM work_card_day_entries WHERE work_card_id = $1 ORDER BY day_of_month",
    )
    .bind(work_card_id.as_uuid())
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

pub async fn exists_for_day<'c>(
    executor: impl PgExecutor<'c>,
    work_card_id: WorkCardId,
    day_of_month: i32,
) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 AS present FROM work_card_day_entries WHERE work_card_id = $1 AND day_of_month = $2",
    )
    .bind(work_card_id.as_uuid())
    .bind(day_of_month)
    .fetch_optional(executor)
    .await?;
    Ok(row.is_some())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert<'c>(
    executor: impl PgExecutor<'c>,
    work_card_id: WorkCardId,
    day_of_month: i32,
    from_time: Option<NaiveTime>,
    to_time: Option<NaiveTime>,
    total_hours: Option<Decimal>,
    source: DayEntrySource,
    updated_by: Option<UserId>,
) -> Result<WorkCardDayEntryId> {
    let id = WorkCardDayEntryId::new();
    sqlx::query(
        r#"INSERT INTO work_card_day_entries
           (id, work_card_id, day_of_month, from_time, to_time, total_hours, source, is_valid, updated_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7, true, $8)"#,
    )
    .bind(id.as_uuid())
    .bind(work_card_id.as_uuid())
    .bind(day_of_month)
    .bind(from_time)
    .bind(to_time)
    .bind(total_hours)
    .bind(source)
    .bind(updated_by.map(|u| u.as_uuid()))
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn delete_for_day<'c>(
    executor: impl PgExecutor<'c>,
    work_card_id: WorkCardId,
    day_of_month: i32,
) -> Result<()> {
    sqlx::query("DELETE FROM work_card_day_entries WHERE work_card_id = $1 AND day_of_month = $2")
        .bind(work_card_id.as_uuid())
        .bind(day_of_month)
        .execute(executor)
        .await?;
    Ok(())
}

/// Clones one entry from another card into `target_card_id` for the same
/// day, tagging the new row `CARRIED_FORWARD`. Used by the approval
/// protocol's carry-forward step.
pub async fn clone_into<'c>(
    executor: impl PgExecutor<'c>,
    source: &WorkCardDayEntry,
    target_card_id: WorkCardId,
) -> Result<WorkCardDayEntryId> {
    insert(
        executor,
        target_card_id,
        source.day_of_month,
        source.from_time,
        source.to_time,
        source.total_hours,
        DayEntrySource::CarriedForward,
        None,
    )
    .await
}

/// Replaces the full set of day entries for a card in one bulk statement,
/// used by the admin bulk-edit endpoint. Locked-day rejection happens
/// before this is called, in `cardflow_reconcile`.
pub async fn replace_all<'c>(
    executor: impl PgExecutor<'c> + Copy,
    work_card_id: WorkCardId,
    entries: &[(i32, Option<NaiveTime>, Option<NaiveTime>, Option<Decimal>)],
    updated_by: Option<UserId>,
) -> Result<()> {
    sqlx::query("DELETE FROM work_card_day_entries WHERE work_card_id = $1")
        .bind(work_card_id.as_uuid())
        .execute(executor)
        .await?;
    for (day, from_time, to_time, total_hours) in entries {
        insert(
            executor,
            work_card_id,
            *day,
            *from_time,
            *to_time,
            *total_hours,
            DayEntrySource::Manual,
            updated_by,
        )
        .await?;
    }
    Ok(())
}

pub async fn get<'c>(executor: impl PgExecutor<'c>, id: WorkCardDayEntryId) -> Result<Option<WorkCardDayEntry>> {
    let row = sqlx::query_as::<_, WorkCardDayEntry>("SELECT * FROM work_card_day_entries WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(executor)
        .await?;
    Ok(row)
}
