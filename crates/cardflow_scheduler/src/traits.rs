//! Capability interfaces the execution loop depends on, in place of
//! module-global repository singletons: `JobStore`, `WorkCardStore`,
//! `EmployeeRecordStore`, `ImageStore`, and `JobLogger`. Each has exactly one
//! production implementation (in `pg`) and fakes live alongside the tests
//! that use them.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use cardflow_ids::{BusinessId, EmployeeId, ExtractionJobId, SiteId, WorkCardId};
use cardflow_protocol::{ExtractionMode, JobStatus, MatchMethod, ReviewStatus};
use chrono::NaiveDate;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: ExtractionJobId,
    pub work_card_id: WorkCardId,
    pub status: JobStatus,
    pub attempts: i32,
    pub mode: ExtractionMode,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_pending_unleased(&self, limit: i64) -> anyhow::Result<Vec<ExtractionJobId>>;
    async fn claim(&self, job_id: ExtractionJobId, worker_id: &str) -> anyhow::Result<bool>;
    async fn get(&self, job_id: ExtractionJobId) -> anyhow::Result<JobRecord>;
    async fn mark_running(&self, job_id: ExtractionJobId) -> anyhow::Result<()>;
    #[allow(clippy::too_many_arguments)]
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
    ) -> anyhow::Result<()>;
    async fn mark_failed(&self, job_id: ExtractionJobId, error: &str) -> anyhow::Result<()>;
    async fn recover_stale_leases(
        &self,
        stale_after: StdDuration,
        max_attempts: i32,
    ) -> anyhow::Result<Vec<ExtractionJobId>>;
}

#[derive(Debug, Clone)]
pub struct WorkCardRecord {
    pub id: WorkCardId,
    pub business_id: BusinessId,
    pub site_id: Option<SiteId>,
    pub employee_id: Option<EmployeeId>,
    pub processing_month: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct DayEntryRecord {
    pub day_of_month: i32,
    pub from_time: Option<NaiveTime>,
    pub to_time: Option<NaiveTime>,
    pub total_hours: Option<Decimal>,
}

#[async_trait]
pub trait WorkCardStore: Send + Sync {
    async fn get(&self, work_card_id: WorkCardId) -> anyhow::Result<WorkCardRecord>;
    async fn previous_card(
        &self,
        business_id: BusinessId,
        employee_id: EmployeeId,
        processing_month: NaiveDate,
        current: WorkCardId,
    ) -> anyhow::Result<Option<WorkCardRecord>>;
    async fn day_entries(&self, work_card_id: WorkCardId) -> anyhow::Result<Vec<DayEntryRecord>>;
    async fn day_entry_exists(&self, work_card_id: WorkCardId, day_of_month: i32) -> anyhow::Result<bool>;
    #[allow(clippy::too_many_arguments)]
    async fn insert_extracted_entry(
        &self,
        work_card_id: WorkCardId,
        day_of_month: i32,
        from_time: Option<NaiveTime>,
        to_time: Option<NaiveTime>,
        total_hours: Option<Decimal>,
    ) -> anyhow::Result<()>;
    async fn set_review_status(&self, work_card_id: WorkCardId, status: ReviewStatus) -> anyhow::Result<()>;
    async fn assign_employee(&self, work_card_id: WorkCardId, employee_id: EmployeeId) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn get_bytes(&self, work_card_id: WorkCardId) -> anyhow::Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub passport_id: Option<String>,
}

#[async_trait]
pub trait EmployeeRecordStore: Send + Sync {
    async fn get(&self, business_id: BusinessId, employee_id: EmployeeId) -> anyhow::Result<Option<EmployeeRecord>>;
}

/// Structured event sink for the execution loop. The production
/// implementation forwards to `tracing`; tests use an in-memory recorder.
pub trait JobLogger: Send + Sync {
    fn job_claimed(&self, job_id: ExtractionJobId, work_card_id: WorkCardId);
    fn job_done(&self, job_id: ExtractionJobId, matched: bool);
    fn job_failed(&self, job_id: ExtractionJobId, error: &str);
    fn leases_recovered(&self, count: usize);
}

pub struct TracingLogger;

impl JobLogger for TracingLogger {
    fn job_claimed(&self, job_id: ExtractionJobId, work_card_id: WorkCardId) {
        tracing::info!(%job_id, %work_card_id, "claimed extraction job");
    }

    fn job_done(&self, job_id: ExtractionJobId, matched: bool) {
        tracing::info!(%job_id, matched, "extraction job done");
    }

    fn job_failed(&self, job_id: ExtractionJobId, error: &str) {
        tracing::warn!(%job_id, error, "extraction job failed");
    }

    fn leases_recovered(&self, count: usize) {
        if count > 0 {
            tracing::warn!(count, "recovered stale job leases");
        }
    }
}
