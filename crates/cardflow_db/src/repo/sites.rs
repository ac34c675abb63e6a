use cardflow_ids::{BusinessId, EmployeeId, SiteId};
use sqlx::PgExecutor;

use crate::error::{DbError, Result};
use crate::models::Site;

pub async fn get<'c>(executor: impl PgExecutor<'c>, business_id: BusinessId, id: SiteId) -> Result<Site> {
    sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1 AND business_id = $2")
        .bind(id.as_uuid())
        .bind(business_id.as_uuid())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::not_found(format!("site {id}")))
}

pub async fn list_for_business<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    include_inactive: bool,
) -> Result<Vec<Site>> {
    let rows = if include_inactive {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE business_id = $1 ORDER BY name")
            .bind(business_id.as_uuid())
            .fetch_all(executor)
            .await?
    } else {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE business_id = $1 AND active ORDER BY name")
            .bind(business_id.as_uuid())
            .fetch_all(executor)
            .await?
    };
    Ok(rows)
}

/// Sets the site's responsible employee. The invariant that the employee's
/// own `site_id` equals this site is enforced by the caller (the API
/// handler), per spec.md §9: "enforce at the API boundary, not the schema."
pub async fn set_responsible_employee<'c>(
    executor: impl PgExecutor<'c>,
    site_id: SiteId,
    responsible_employee_id: Option<EmployeeId>,
) -> Result<()> {
    sqlx::query("UPDATE sites SET responsible_employee_id = $2 WHERE id = $1")
        .bind(site_id.as_uuid())
        .bind(responsible_employee_id.map(|e| e.as_uuid()))
        .execute(executor)
        .await?;
    Ok(())
}
