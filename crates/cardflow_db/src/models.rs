//! Row types mirroring §3's data model, one struct per entity.

use cardflow_ids::{
    BusinessId, EmployeeId, ExtractionJobId, SiteId, UploadAccessRequestId, UserId, WorkCardDayEntryId,
    WorkCardId,
};
use cardflow_protocol::{
    DayEntrySource, EmployeeStatus, ExtractionMode, JobStatus, MatchMethod, ReviewStatus, WorkCardSource,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub code: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Site {
    pub id: SiteId,
    pub business_id: BusinessId,
    pub name: String,
    pub code: Option<String>,
    pub active: bool,
    pub responsible_employee_id: Option<EmployeeId>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Employee {
    pub id: EmployeeId,
    pub business_id: BusinessId,
    pub site_id: Option<SiteId>,
    pub full_name: String,
    pub passport_id: Option<String>,
    pub phone: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub active: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkCard {
    pub id: WorkCardId,
    pub business_id: BusinessId,
    pub site_id: Option<SiteId>,
    pub employee_id: Option<EmployeeId>,
    pub processing_month: NaiveDate,
    pub source: WorkCardSource,
    pub original_filename: String,
    pub mime_type: String,
    pub size: i64,
    pub review_status: ReviewStatus,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkCardFile {
    pub work_card_id: WorkCardId,
    pub bytes: Vec<u8>,
    pub mime: String,
    pub filename: String,
    pub size: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExtractionJob {
    pub id: ExtractionJobId,
    pub work_card_id: WorkCardId,
    pub status: JobStatus,
    pub attempts: i32,
    pub lease_owner: Option<String>,
    pub lease_acquired_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub mode: ExtractionMode,
    pub extracted_employee_name: Option<String>,
    pub extracted_passport_id: Option<String>,
    pub raw_result: Option<Value>,
    pub normalized_result: Option<Value>,
    pub matched_employee_id: Option<EmployeeId>,
    pub match_method: Option<MatchMethod>,
    pub match_confidence: Option<Decimal>,
    pub model_name: Option<String>,
    pub pipeline_version: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkCardDayEntry {
    pub id: WorkCardDayEntryId,
    pub work_card_id: WorkCardId,
    pub day_of_month: i32,
    pub from_time: Option<NaiveTime>,
    pub to_time: Option<NaiveTime>,
    pub total_hours: Option<Decimal>,
    pub source: DayEntrySource,
    pub is_valid: bool,
    pub validation_errors: Option<Value>,
    pub updated_by: Option<UserId>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UploadAccessRequest {
    pub id: UploadAccessRequestId,
    pub token: String,
    pub business_id: BusinessId,
    pub site_id: SiteId,
    pub employee_id: EmployeeId,
    pub processing_month: NaiveDate,
    pub created_by: Option<UserId>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub active: bool,
}
