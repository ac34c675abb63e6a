//! Single-query materialization of the hours matrix, grounded on the
//! original's `build_hours_matrix_query` (CTE-ranked-cards, APPROVED-first
//! tiebreak, outer join to day entries).

use cardflow_ids::{BusinessId, EmployeeId, SiteId, WorkCardId};
use cardflow_protocol::ReviewStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor};

use crate::error::Result;

#[derive(Debug, Clone, FromRow)]
pub struct MatrixRow {
    pub employee_id: EmployeeId,
    pub work_card_id: Option<WorkCardId>,
    pub review_status: Option<ReviewStatus>,
    pub day_of_month: Option<i32>,
    pub total_hours: Option<Decimal>,
}

/// One CTE pass: rank cards per employee (APPROVED first, then newest,
/// then id as a deterministic tiebreak), keep rank 1, left-join to that
/// card's day entries. `approved_only` restricts the partition to
/// APPROVED cards before ranking, matching §4.6's optional filter.
pub async fn load_hours_matrix_rows<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    site_id: SiteId,
    processing_month: NaiveDate,
    approved_only: bool,
) -> Result<Vec<MatrixRow>> {
    let sql = r#"
        WITH ranked_cards AS (
            SELECT
                wc.id,
                wc.employee_id,
                wc.review_status,
                wc.created_at,
                ROW_NUMBER() OVER (
                    PARTITION BY wc.employee_id
                    ORDER BY
                        CASE WHEN wc.review_status = 'APPROVED' THEN 1 ELSE 2 END,
                        wc.created_at DESC,
                        wc.id DESC
                ) AS rank
            FROM work_cards wc
            WHERE wc.business_id = $1
              AND wc.site_id = $2
              AND wc.processing_month = $3
              AND wc.employee_id IS NOT NULL
              AND ($4 = false OR wc.review_status = 'APPROVED')
        ),
        selected_cards AS (
            SELECT id, employee_id, review_status FROM ranked_cards WHERE rank = 1
        )
        SELECT
            sc.employee_id AS employee_id,
            sc.id AS work_card_id,
            sc.review_status AS review_status,
            de.day_of_month AS day_of_month,
            de.total_hours AS total_hours
        FROM selected_cards sc
        LEFT JOIN work_card_day_entries de ON de.work_card_id = sc.id
    "#;

    let rows = sqlx::query_as::<_, MatrixRow>(sql)
        .bind(business_id.as_uuid())
        .bind(site_id.as_uuid())
        .bind(processing_month)
        .bind(approved_only)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}
