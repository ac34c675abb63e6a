//! ExtractionJob persistence: creation, selection, optimistic claim, and the
//! stale-lease sweep.

use cardflow_ids::{ExtractionJobId, WorkCardId};
use cardflow_protocol::{ExtractionMode, JobStatus};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::{PgExecutor, Row};

use crate::error::{DbError, Result};
use crate::models::ExtractionJob;
use crate::pool::DbPool;

/// Creates the PENDING job alongside a freshly inserted work card, in the
/// same transaction as the card and its file so a card never exists
/// without something to pick it up.
pub async fn create<'c>(
    executor: impl PgExecutor<'c>,
    work_card_id: WorkCardId,
    mode: ExtractionMode,
) -> Result<ExtractionJobId> {
    let id = ExtractionJobId::new();
    sqlx::query(
        r#"INSERT INTO extraction_jobs (id, work_card_id, status, attempts, mode)
           VALUES ($1, $2, 'PENDING', 0, $3)"#,
    )
    .bind(id.as_uuid())
    .bind(work_card_id.as_uuid())
    .bind(mode)
    .execute(executor)
    .await?;
    Ok(id)
}

pub struct ExtractionJobRepo<'a> {
    pool: &'a DbPool,
}

impl<'a> ExtractionJobRepo<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Finds up to `limit` jobs with `status = PENDING` and no held lease,
    /// oldest first. Callers attempt [`Self::claim`] on each in turn.
    pub async fn find_pending_unleased(&self, limit: i64) -> Result<Vec<ExtractionJobId>> {
        let rows = sqlx::query(
            r#"SELECT id FROM extraction_jobs
               WHERE status = 'PENDING' AND lease_owner IS NULL
               ORDER BY id ASC
               LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| ExtractionJobId::from_uuid(row.get("id")))
            .collect())
    }

    /// Attempts the single conditional update that atomically claims a job:
    /// sets `(lease_owner, lease_acquired_at)` only if the lease is currently
    /// unheld. A non-zero row count means this caller won the claim.
    pub async fn claim(&self, job_id: ExtractionJobId, worker_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE extraction_jobs
               SET lease_owner = $1, lease_acquired_at = now()
               WHERE id = $2 AND lease_owner IS NULL"#,
        )
        .bind(worker_id)
        .bind(job_id.as_uuid())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_running(&self, job_id: ExtractionJobId) -> Result<()> {
        sqlx::query(
            r#"UPDATE extraction_jobs
               SET status = 'RUNNING', started_at = now(), attempts = attempts + 1
               WHERE id = $1"#,
        )
        .bind(job_id.as_uuid())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn mark_done(
        &self,
        job_id: ExtractionJobId,
        raw_result: &Value,
        normalized_result: &Value,
        matched_employee_id: Option<cardflow_ids::EmployeeId>,
        match_method: Option<cardflow_protocol::MatchMethod>,
        match_confidence: Option<rust_decimal::Decimal>,
        model_name: &str,
        pipeline_version: &str,
        extracted_employee_name: Option<&str>,
        extracted_passport_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE extraction_jobs
               SET status = 'DONE', finished_at = now(),
                   raw_result = $2, normalized_result = $3,
                   matched_employee_id = $4, match_method = $5, match_confidence = $6,
                   model_name = $7, pipeline_version = $8,
                   extracted_employee_name = $9, extracted_passport_id = $10,
                   last_error = NULL
               WHERE id = $1"#,
        )
        .bind(job_id.as_uuid())
        .bind(raw_result)
        .bind(normalized_result)
        .bind(matched_employee_id.map(|id| id.as_uuid()))
        .bind(match_method)
        .bind(match_confidence)
        .bind(model_name)
        .bind(pipeline_version)
        .bind(extracted_employee_name)
        .bind(extracted_passport_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, job_id: ExtractionJobId, error: &str) -> Result<()> {
        sqlx::query(
            r#"UPDATE extraction_jobs
               SET status = 'FAILED', finished_at = now(), last_error = $2,
                   lease_owner = NULL, lease_acquired_at = NULL
               WHERE id = $1"#,
        )
        .bind(job_id.as_uuid())
        .bind(error)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, job_id: ExtractionJobId) -> Result<ExtractionJob> {
        sqlx::query_as::<_, ExtractionJob>("SELECT * FROM extraction_jobs WHERE id = $1")
            .bind(job_id.as_uuid())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(format!("extraction job {job_id}")))
    }

    pub async fn get_by_work_card(&self, work_card_id: WorkCardId) -> Result<ExtractionJob> {
        sqlx::query_as::<_, ExtractionJob>("SELECT * FROM extraction_jobs WHERE work_card_id = $1")
            .bind(work_card_id.as_uuid())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(format!("extraction job for work card {work_card_id}")))
    }

    /// Sweeps jobs whose lease is older than `stale_after`. Jobs at or past
    /// `max_attempts` are failed permanently; the rest have their lease
    /// cleared and return to PENDING for re-claiming.
    pub async fn recover_stale_leases(
        &self,
        stale_after: Duration,
        max_attempts: i32,
    ) -> Result<Vec<ExtractionJobId>> {
        let threshold: DateTime<Utc> = Utc::now() - stale_after;

        let expired = sqlx::query(
            r#"SELECT id, attempts FROM extraction_jobs
               WHERE lease_acquired_at IS NOT NULL
                 AND lease_acquired_at < $1
                 AND status IN ('PENDING', 'RUNNING')"#,
        )
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        let mut recovered = Vec::new();
        for row in expired {
            let id = ExtractionJobId::from_uuid(row.get("id"));
            let attempts: i32 = row.get("attempts");
            if attempts >= max_attempts {
                self.mark_failed(id, "max attempts exceeded").await?;
            } else {
                sqlx::query(
                    r#"UPDATE extraction_jobs
                       SET status = 'PENDING', lease_owner = NULL, lease_acquired_at = NULL
                       WHERE id = $1"#,
                )
                .bind(id.as_uuid())
                .execute(self.pool)
                .await?;
                recovered.push(id);
            }
        }
        Ok(recovered)
    }

    /// Requeues a FAILED job for another attempt, as long as it has not
    /// exhausted its retry budget.
    pub async fn requeue_failed(&self, job_id: ExtractionJobId, max_attempts: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE extraction_jobs
               SET status = 'PENDING', lease_owner = NULL, lease_acquired_at = NULL, last_error = NULL
               WHERE id = $1 AND status = 'FAILED' AND attempts < $2"#,
        )
        .bind(job_id.as_uuid())
        .bind(max_attempts)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Just documents the terminal states a caller might branch on; kept close
/// to the repository that owns the state machine.
pub fn is_terminal(status: JobStatus) -> bool {
    matches!(status, JobStatus::Done | JobStatus::Failed)
}
