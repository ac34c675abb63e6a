//! Serializable response shapes for entities whose `cardflow_db` row types
//! deliberately don't derive `Serialize` (that crate has no HTTP concerns).

use cardflow_ids::{BusinessId, EmployeeId, SiteId, UserId, WorkCardDayEntryId, WorkCardId};
use cardflow_protocol::{DayEntrySource, ReviewStatus, WorkCardSource};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WorkCardDto {
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

impl From<&cardflow_db::WorkCard> for WorkCardDto {
    fn from(card: &cardflow_db::WorkCard) -> Self {
        Self {
            id: card.id,
            business_id: card.business_id,
            site_id: card.site_id,
            employee_id: card.employee_id,
            processing_month: card.processing_month,
            source: card.source,
            original_filename: card.original_filename.clone(),
            mime_type: card.mime_type.clone(),
            size: card.size,
            review_status: card.review_status,
            approved_by: card.approved_by,
            approved_at: card.approved_at,
            created_at: card.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayEntryDto {
    pub id: WorkCardDayEntryId,
    pub work_card_id: WorkCardId,
    pub day_of_month: i32,
    pub from_time: Option<NaiveTime>,
    pub to_time: Option<NaiveTime>,
    pub total_hours: Option<Decimal>,
    pub source: DayEntrySource,
    pub is_valid: bool,
}

impl From<&cardflow_db::WorkCardDayEntry> for DayEntryDto {
    fn from(entry: &cardflow_db::WorkCardDayEntry) -> Self {
        Self {
            id: entry.id,
            work_card_id: entry.work_card_id,
            day_of_month: entry.day_of_month,
            from_time: entry.from_time,
            to_time: entry.to_time,
            total_hours: entry.total_hours,
            source: entry.source,
            is_valid: entry.is_valid,
        }
    }
}
