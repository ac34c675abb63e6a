//! WorkCard persistence: creation, status transitions, and the
//! immediate-previous-card lookup the pipeline and reconciliation engine
//! both depend on.

use cardflow_ids::{BusinessId, EmployeeId, SiteId, UserId, WorkCardId};
use cardflow_protocol::{ReviewStatus, WorkCardSource};
use chrono::NaiveDate;
use sqlx::PgExecutor;

use crate::error::{DbError, Result};
use crate::models::WorkCard;

#[allow(clippy::too_many_arguments)]
pub async fn create<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    site_id: Option<SiteId>,
    employee_id: Option<EmployeeId>,
    processing_month: NaiveDate,
    source: WorkCardSource,
    original_filename: &str,
    mime_type: &str,
    size: i64,
) -> Result<WorkCardId> {
    let id = WorkCardId::new();
    let review_status = if employee_id.is_some() {
        ReviewStatus::NeedsReview
    } else {
        ReviewStatus::NeedsAssignment
    };
    sqlx::query(
        r#"INSERT INTO work_cards
           (id, business_id, site_id, employee_id, processing_month, source,
            original_filename, mime_type, size, review_status, created_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())"#,
    )
    .bind(id.as_uuid())
    .bind(business_id.as_uuid())
    .bind(site_id.map(|s| s.as_uuid()))
    .bind(employee_id.map(|e| e.as_uuid()))
    .bind(processing_month)
    .bind(source)
    .bind(original_filename)
    .bind(mime_type)
    .bind(size)
    .bind(review_status)
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn get<'c>(executor: impl PgExecutor<'c>, id: WorkCardId) -> Result<WorkCard> {
    sqlx::query_as::<_, WorkCard>("SELECT * FROM work_cards WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::not_found(format!("work card {id}")))
}

/// The card immediately preceding `current`, scoped to the same
/// `(business, employee, month)` and excluding `current` itself, ordered
/// `created_at desc`. Returns `None` if there is no such card.
pub async fn previous_card<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    employee_id: EmployeeId,
    processing_month: NaiveDate,
    current: WorkCardId,
) -> Result<Option<WorkCard>> {
    let row = sqlx::query_as::<_, WorkCard>(
        r#"SELECT * FROM work_cards
           WHERE business_id = $1 AND employee_id = $2 AND processing_month = $3 AND id != $4
           ORDER BY created_at DESC, id DESC
           LIMIT 1"#,
    )
    .bind(business_id.as_uuid())
    .bind(employee_id.as_uuid())
    .bind(processing_month)
    .bind(current.as_uuid())
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn set_review_status<'c>(
    executor: impl PgExecutor<'c>,
    id: WorkCardId,
    status: ReviewStatus,
) -> Result<()> {
    sqlx::query("UPDATE work_cards SET review_status = $2 WHERE id = $1")
        .bind(id.as_uuid())
        .bind(status)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn assign_employee<'c>(
    executor: impl PgExecutor<'c>,
    id: WorkCardId,
    employee_id: EmployeeId,
) -> Result<()> {
    sqlx::query(
        "UPDATE work_cards SET employee_id = $2, review_status = 'NEEDS_REVIEW' WHERE id = $1",
    )
    .bind(id.as_uuid())
    .bind(employee_id.as_uuid())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn approve<'c>(executor: impl PgExecutor<'c>, id: WorkCardId, approved_by: UserId) -> Result<()> {
    sqlx::query(
        r#"UPDATE work_cards
           SET review_status = 'APPROVED', approved_by = $2, approved_at = now()
           WHERE id = $1"#,
    )
    .bind(id.as_uuid())
    .bind(approved_by.as_uuid())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn reject<'c>(executor: impl PgExecutor<'c>, id: WorkCardId) -> Result<()> {
    sqlx::query("UPDATE work_cards SET review_status = 'REJECTED' WHERE id = $1")
        .bind(id.as_uuid())
        .execute(executor)
        .await?;
    Ok(())
}

/// All cards in scope for a `(business, site, month)` matrix read, used by
/// `cardflow_reconcile`'s effective-card selection when it needs full rows
/// rather than just the matrix CTE projection.
pub async fn list_in_scope<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    site_id: SiteId,
    processing_month: NaiveDate,
) -> Result<Vec<WorkCard>> {
    let rows = sqlx::query_as::<_, WorkCard>(
        r#"SELECT * FROM work_cards
           WHERE business_id = $1 AND site_id = $2 AND processing_month = $3"#,
    )
    .bind(business_id.as_uuid())
    .bind(site_id.as_uuid())
    .bind(processing_month)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}
