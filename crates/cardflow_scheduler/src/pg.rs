//! Postgres-backed implementations of the scheduler's capability
//! interfaces, wrapping `cardflow_db` repositories.

use async_trait::async_trait;
use cardflow_db::DbPool;
use cardflow_ids::{BusinessId, EmployeeId, ExtractionJobId, WorkCardId};
use cardflow_protocol::{MatchMethod, ReviewStatus};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration as StdDuration;

use crate::traits::{
    DayEntryRecord, EmployeeRecord, EmployeeRecordStore, ImageStore, JobRecord, JobStore, WorkCardRecord,
    WorkCardStore,
};

pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn find_pending_unleased(&self, limit: i64) -> anyhow::Result<Vec<ExtractionJobId>> {
        let repo = cardflow_db::ExtractionJobRepo::new(&self.pool);
        Ok(repo.find_pending_unleased(limit).await?)
    }

    async fn claim(&self, job_id: ExtractionJobId, worker_id: &str) -> anyhow::Result<bool> {
        let repo = cardflow_db::ExtractionJobRepo::new(&self.pool);
        Ok(repo.claim(job_id, worker_id).await?)
    }

    async fn get(&self, job_id: ExtractionJobId) -> anyhow::Result<JobRecord> {
        let repo = cardflow_db::ExtractionJobRepo::new(&self.pool);
        let job = repo.get(job_id).await?;
        Ok(JobRecord {
            id: job.id,
            work_card_id: job.work_card_id,
            status: job.status,
            attempts: job.attempts,
            mode: job.mode,
        })
    }

    async fn mark_running(&self, job_id: ExtractionJobId) -> anyhow::Result<()> {
        let repo = cardflow_db::ExtractionJobRepo::new(&self.pool);
        Ok(repo.mark_running(job_id).await?)
    }

    async fn mark_done(
        &self,
        job_id: ExtractionJobId,
        raw_result: &Value,
        normalized_result: &Value,
        matched_employee_id: Option<EmployeeId>,
        match_method: Option<MatchMethod>,
        match_confidence: Option<Decimal>,
        model_name: &str,
        pipeline_version: &str,
        extracted_employee_name: Option<&str>,
        extracted_passport_id: Option<&str>,
    ) -> anyhow::Result<()> {
        let repo = cardflow_db::ExtractionJobRepo::new(&self.pool);
        Ok(repo
            .mark_done(
                job_id,
                raw_result,
                normalized_result,
                matched_employee_id,
                match_method,
                match_confidence,
                model_name,
                pipeline_version,
                extracted_employee_name,
                extracted_passport_id,
            )
            .await?)
    }

    async fn mark_failed(&self, job_id: ExtractionJobId, error: &str) -> anyhow::Result<()> {
        let repo = cardflow_db::ExtractionJobRepo::new(&self.pool);
        Ok(repo.mark_failed(job_id, error).await?)
    }

    async fn recover_stale_leases(
        &self,
        stale_after: StdDuration,
        max_attempts: i32,
    ) -> anyhow::Result<Vec<ExtractionJobId>> {
        let repo = cardflow_db::ExtractionJobRepo::new(&self.pool);
        let duration = chrono::Duration::from_std(stale_after).unwrap_or(chrono::Duration::minutes(30));
        Ok(repo.recover_stale_leases(duration, max_attempts).await?)
    }
}

pub struct PgWorkCardStore {
    pool: DbPool,
}

impl PgWorkCardStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkCardStore for PgWorkCardStore {
    async fn get(&self, work_card_id: WorkCardId) -> anyhow::Result<WorkCardRecord> {
        let card = cardflow_db::repo::work_cards::get(&self.pool, work_card_id).await?;
        Ok(WorkCardRecord {
            id: card.id,
            business_id: card.business_id,
            site_id: card.site_id,
            employee_id: card.employee_id,
            processing_month: card.processing_month,
        })
    }

    async fn previous_card(
        &self,
        business_id: BusinessId,
        employee_id: EmployeeId,
        processing_month: chrono::NaiveDate,
        current: WorkCardId,
    ) -> anyhow::Result<Option<WorkCardRecord>> {
        let previous =
            cardflow_db::repo::work_cards::previous_card(&self.pool, business_id, employee_id, processing_month, current)
                .await?;
        Ok(previous.map(|card| WorkCardRecord {
            id: card.id,
            business_id: card.business_id,
            site_id: card.site_id,
            employee_id: card.employee_id,
            processing_month: card.processing_month,
        }))
    }

    async fn day_entries(&self, work_card_id: WorkCardId) -> anyhow::Result<Vec<DayEntryRecord>> {
        let entries = cardflow_db::repo::day_entries::list_for_card(&self.pool, work_card_id).await?;
        Ok(entries
            .into_iter()
            .map(|entry| DayEntryRecord {
                day_of_month: entry.day_of_month,
                from_time: entry.from_time,
                to_time: entry.to_time,
                total_hours: entry.total_hours,
            })
            .collect())
    }

    async fn day_entry_exists(&self, work_card_id: WorkCardId, day_of_month: i32) -> anyhow::Result<bool> {
        Ok(cardflow_db::repo::day_entries::exists_for_day(&self.pool, work_card_id, day_of_month).await?)
    }

    async fn insert_extracted_entry(
        &self,
        work_card_id: WorkCardId,
        day_of_month: i32,
        from_time: Option<NaiveTime>,
        to_time: Option<NaiveTime>,
        total_hours: Option<Decimal>,
    ) -> anyhow::Result<()> {
        cardflow_db::repo::day_entries::insert(
            &self.pool,
            work_card_id,
            day_of_month,
            from_time,
            to_time,
            total_hours,
            cardflow_protocol::DayEntrySource::Extracted,
            None,
        )
        .await?;
        Ok(())
    }

    async fn set_review_status(&self, work_card_id: WorkCardId, status: ReviewStatus) -> anyhow::Result<()> {
        Ok(cardflow_db::repo::work_cards::set_review_status(&self.pool, work_card_id, status).await?)
    }

    async fn assign_employee(&self, work_card_id: WorkCardId, employee_id: EmployeeId) -> anyhow::Result<()> {
        Ok(cardflow_db::repo::work_cards::assign_employee(&self.pool, work_card_id, employee_id).await?)
    }
}

pub struct PgImageStore {
    pool: DbPool,
}

impl PgImageStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageStore for PgImageStore {
    async fn get_bytes(&self, work_card_id: WorkCardId) -> anyhow::Result<Vec<u8>> {
        Ok(cardflow_db::repo::work_card_files::get_bytes(&self.pool, work_card_id).await?)
    }
}

pub struct PgEmployeeRecordStore {
    pool: DbPool,
}

impl PgEmployeeRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRecordStore for PgEmployeeRecordStore {
    async fn get(&self, business_id: BusinessId, employee_id: EmployeeId) -> anyhow::Result<Option<EmployeeRecord>> {
        match cardflow_db::repo::employees::get(&self.pool, business_id, employee_id).await {
            Ok(employee) => Ok(Some(EmployeeRecord {
                id: employee.id,
                passport_id: employee.passport_id,
            })),
            Err(cardflow_db::DbError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
