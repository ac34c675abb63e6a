//! MatrixBuilder: assembles the hours matrix and per-employee upload status
//! for a site's processing month from a single ranked-CTE query.

use std::collections::HashMap;

use cardflow_db::repo::matrix::load_hours_matrix_rows;
use cardflow_db::{DbError, DbPool, Employee, ExtractionJobRepo};
use cardflow_ids::{BusinessId, EmployeeId, SiteId, WorkCardId};
use cardflow_protocol::{JobStatus, UploadStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct HoursMatrix {
    pub employees: Vec<Employee>,
    pub matrix: HashMap<EmployeeId, HashMap<i32, Decimal>>,
    pub status_map: HashMap<EmployeeId, UploadStatus>,
    pub processing_month: NaiveDate,
}

pub async fn build_hours_matrix(
    pool: &DbPool,
    business_id: BusinessId,
    site_id: SiteId,
    processing_month: NaiveDate,
    approved_only: bool,
    include_inactive: bool,
) -> Result<HoursMatrix> {
    let mut employees =
        cardflow_db::repo::employees::list_for_site(pool, business_id, site_id, include_inactive).await?;
    employees.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    let rows = load_hours_matrix_rows(pool, business_id, site_id, processing_month, approved_only).await?;

    let mut matrix: HashMap<EmployeeId, HashMap<i32, Decimal>> = HashMap::new();
    let mut effective_status: HashMap<EmployeeId, cardflow_protocol::ReviewStatus> = HashMap::new();
    for row in rows {
        if let Some(status) = row.review_status {
            effective_status.insert(row.employee_id, status);
        }
        if let (Some(day), Some(total_hours)) = (row.day_of_month, row.total_hours) {
            matrix.entry(row.employee_id).or_default().insert(day, total_hours);
        }
    }

    let status_map = employees
        .iter()
        .map(|employee| {
            let status = effective_status
                .get(&employee.id)
                .map(|status| UploadStatus::from(*status))
                .unwrap_or(UploadStatus::NoUpload);
            (employee.id, status)
        })
        .collect();

    Ok(HoursMatrix {
        employees,
        matrix,
        status_map,
        processing_month,
    })
}

fn sort_key(employee: &Employee) -> (String, String, uuid::Uuid) {
    (
        employee.full_name.to_lowercase(),
        employee.passport_id.clone().unwrap_or_default().to_lowercase(),
        employee.id.as_uuid(),
    )
}

/// Per-employee upload status that also reflects in-flight and failed
/// extraction jobs, not just the effective card's review status. Used by
/// the admin dashboard's per-employee upload column.
pub async fn employee_upload_status(
    pool: &DbPool,
    business_id: BusinessId,
    site_id: SiteId,
    employee_id: EmployeeId,
    processing_month: NaiveDate,
) -> Result<(UploadStatus, Option<WorkCardId>)> {
    let cards = cardflow_db::repo::work_cards::list_in_scope(pool, business_id, site_id, processing_month).await?;
    let latest = cards
        .into_iter()
        .filter(|card| card.employee_id == Some(employee_id))
        .max_by_key(|card| card.created_at);

    let Some(card) = latest else {
        return Ok((UploadStatus::NoUpload, None));
    };

    let jobs = ExtractionJobRepo::new(pool);
    let status = match jobs.get_by_work_card(card.id).await {
        Ok(job) => match job.status {
            JobStatus::Failed => UploadStatus::Failed,
            JobStatus::Pending | JobStatus::Running => UploadStatus::Pending,
            JobStatus::Done if card.review_status.is_approved() => UploadStatus::Approved,
            JobStatus::Done => UploadStatus::Extracted,
        },
        Err(DbError::NotFound(_)) => UploadStatus::Pending,
        Err(err) => return Err(err.into()),
    };
    Ok((status, Some(card.id)))
}
