//! Portal upload access tokens: constant-time lookup by token and revocation.

use cardflow_ids::{BusinessId, EmployeeId, SiteId, UploadAccessRequestId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgExecutor;

use crate::error::Result;
use crate::models::UploadAccessRequest;

#[allow(clippy::too_many_arguments)]
pub async fn create<'c>(
    executor: impl PgExecutor<'c>,
    token: &str,
    business_id: BusinessId,
    site_id: SiteId,
    employee_id: EmployeeId,
    processing_month: NaiveDate,
    created_by: Option<UserId>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<UploadAccessRequestId> {
    let id = UploadAccessRequestId::new();
    sqlx::query(
        r#"INSERT INTO upload_access_requests
           (id, token, business_id, site_id, employee_id, processing_month, created_by, expires_at, active)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true)"#,
    )
    .bind(id.as_uuid())
    .bind(token)
    .bind(business_id.as_uuid())
    .bind(site_id.as_uuid())
    .bind(employee_id.as_uuid())
    .bind(processing_month)
    .bind(created_by.map(|u| u.as_uuid()))
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn get<'c>(executor: impl PgExecutor<'c>, id: UploadAccessRequestId) -> Result<UploadAccessRequest> {
    sqlx::query_as::<_, UploadAccessRequest>("SELECT * FROM upload_access_requests WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| crate::error::DbError::not_found(format!("upload access request {id}")))
}

/// Index-backed lookup by the unique token column.
pub async fn find_by_token<'c>(
    executor: impl PgExecutor<'c>,
    token: &str,
) -> Result<Option<UploadAccessRequest>> {
    let row = sqlx::query_as::<_, UploadAccessRequest>(
        "SELECT * FROM upload_access_requests WHERE token = $1",
    )
    .bind(token)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn touch_last_accessed<'c>(executor: impl PgExecutor<'c>, id: UploadAccessRequestId) -> Result<()> {
    sqlx::query("UPDATE upload_access_requests SET last_accessed_at = now() WHERE id = $1")
        .bind(id.as_uuid())
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn revoke<'c>(executor: impl PgExecutor<'c>, id: UploadAccessRequestId) -> Result<()> {
    sqlx::query("UPDATE upload_access_requests SET active = false WHERE id = $1")
        .bind(id.as_uuid())
        .execute(executor)
        .await?;
    Ok(())
}
