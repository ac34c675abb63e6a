//! `POST /api/work_cards/<id>/approve`, `PUT /api/work_cards/<id>/day-entries`,
//! and the two admin upload endpoints.

use std::collections::HashSet;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use cardflow_ids::{EmployeeId, SiteId, UserId, WorkCardId};
use cardflow_protocol::{ApiEnvelope, ExtractionMode, WorkCardSource};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::AdminPrincipal;
use crate::dto::{DayEntryDto, WorkCardDto};
use crate::error::ApiError;
use crate::state::AppState;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

async fn load_owned_card(state: &AppState, business_id: cardflow_ids::BusinessId, card_id: WorkCardId) -> Result<cardflow_db::WorkCard, ApiError> {
    let card = cardflow_db::repo::work_cards::get(&state.pool, card_id).await?;
    if card.business_id != business_id {
        return Err(ApiError::NotFound(format!("work card {card_id}")));
    }
    Ok(card)
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub override_conflict_days: Vec<i32>,
    #[serde(default)]
    pub confirm_override_approved: bool,
}

pub async fn approve(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(card_id): Path<WorkCardId>,
    Json(body): Json<ApproveRequest>,
) -> Result<Json<ApiEnvelope<WorkCardDto>>, ApiError> {
    load_owned_card(&state, admin.business_id, card_id).await?;

    let Some(approved_by) = body.user_id else {
        return Err(ApiError::Input("user_id is required for approval".to_string()));
    };
    for day in &body.override_conflict_days {
        if !(1..=31).contains(day) {
            return Err(ApiError::Input(
                "override_conflict_days must contain integers between 1 and 31".to_string(),
            ));
        }
    }

    let summary = cardflow_reconcile::approve_work_card(
        &state.pool,
        cardflow_reconcile::ApprovalRequest {
            work_card_id: card_id,
            approved_by,
            override_days: body.override_conflict_days.into_iter().collect::<HashSet<_>>(),
            confirm_override_approved: body.confirm_override_approved,
        },
    )
    .await?;

    state.dashboard_cache.invalidate_business(admin.business_id).await;

    let card = cardflow_db::repo::work_cards::get(&state.pool, card_id).await?;
    let meta = serde_json::json!({
        "carried_forward_days": summary.carried_forward_days,
        "overridden_days": summary.overridden_days,
    });
    Ok(Json(ApiEnvelope::ok("Work card approved successfully", WorkCardDto::from(&card)).with_meta(meta)))
}

#[derive(Debug, Deserialize)]
pub struct DayEntryEditRequest {
    pub day_of_month: i32,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
    pub total_hours: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDayEntriesRequest {
    pub entries: Vec<DayEntryEditRequest>,
}

fn parse_hhmm(label: &str, value: &Option<String>) -> Result<Option<chrono::NaiveTime>, ApiError> {
    let Some(raw) = value else { return Ok(None) };
    let (hour_str, minute_str) = raw
        .split_once(':')
        .ok_or_else(|| ApiError::Input(format!("{label} must be in HH:MM format")))?;
    let hour: u32 = hour_str.parse().map_err(|_| ApiError::Input(format!("{label} must be in HH:MM format")))?;
    let minute: u32 = minute_str.parse().map_err(|_| ApiError::Input(format!("{label} must be in HH:MM format")))?;
    if hour > 23 || minute > 59 {
        return Err(ApiError::Input(format!("{label} must be in HH:MM format")));
    }
    Ok(chrono::NaiveTime::from_hms_opt(hour, minute, 0))
}

pub async fn update_day_entries(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(card_id): Path<WorkCardId>,
    Json(body): Json<UpdateDayEntriesRequest>,
) -> Result<Json<ApiEnvelope<Vec<DayEntryDto>>>, ApiError> {
    load_owned_card(&state, admin.business_id, card_id).await?;

    let mut edits = Vec::with_capacity(body.entries.len());
    for entry in body.entries {
        if !(1..=31).contains(&entry.day_of_month) {
            return Err(ApiError::Input("day_of_month must be between 1 and 31".to_string()));
        }
        let from_time = parse_hhmm("from_time", &entry.from_time)?;
        let to_time = parse_hhmm("to_time", &entry.to_time)?;
        edits.push(cardflow_reconcile::DayEntryEdit {
            day_of_month: entry.day_of_month,
            from_time,
            to_time,
            total_hours: entry.total_hours,
        });
    }

    cardflow_reconcile::update_day_entries(&state.pool, card_id, edits, Some(admin.user_id)).await?;
    state.dashboard_cache.invalidate_business(admin.business_id).await;

    let updated = cardflow_db::repo::day_entries::list_for_card(&state.pool, card_id).await?;
    let dtos = updated.iter().map(DayEntryDto::from).collect();
    Ok(Json(ApiEnvelope::ok("Day entries updated successfully", dtos)))
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub id: WorkCardId,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct FailedFile {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    pub uploaded: Vec<UploadedFile>,
    pub failed: Vec<FailedFile>,
    pub total: usize,
}

struct IncomingFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn create_work_card(
    pool: &cardflow_db::DbPool,
    business_id: cardflow_ids::BusinessId,
    site_id: Option<SiteId>,
    employee_id: Option<EmployeeId>,
    processing_month: NaiveDate,
    source: WorkCardSource,
    file: &IncomingFile,
) -> Result<WorkCardId, ApiError> {
    let mut tx = pool.begin().await.map_err(cardflow_db::DbError::from)?;
    let card_id = cardflow_db::repo::work_cards::create(
        &mut *tx,
        business_id,
        site_id,
        employee_id,
        processing_month,
        source,
        &file.filename,
        &file.content_type,
        file.bytes.len() as i64,
    )
    .await?;
    cardflow_db::repo::work_card_files::create(&mut *tx, card_id, &file.bytes, &file.content_type, &file.filename)
        .await?;
    cardflow_db::repo::extraction_jobs::create(&mut *tx, card_id, ExtractionMode::Full).await?;
    tx.commit().await.map_err(cardflow_db::DbError::from)?;
    Ok(card_id)
}

fn is_allowed_mime(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

pub async fn upload_single(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    mut multipart: Multipart,
) -> Result<Json<ApiEnvelope<WorkCardDto>>, ApiError> {
    let mut file: Option<IncomingFile> = None;
    let mut site_id: Option<SiteId> = None;
    let mut employee_id: Option<EmployeeId> = None;
    let mut processing_month: Option<NaiveDate> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::Input(e.to_string()))? {
        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field.bytes().await.map_err(|e| ApiError::Input(e.to_string()))?.to_vec();
                file = Some(IncomingFile { filename, content_type, bytes });
            }
            "site_id" => {
                let text = field.text().await.map_err(|e| ApiError::Input(e.to_string()))?;
                site_id = Some(SiteId::parse(&text).map_err(|e| ApiError::Input(e.to_string()))?);
            }
            "employee_id" => {
                let text = field.text().await.map_err(|e| ApiError::Input(e.to_string()))?;
                employee_id = Some(EmployeeId::parse(&text).map_err(|e| ApiError::Input(e.to_string()))?);
            }
            "processing_month" => {
                let text = field.text().await.map_err(|e| ApiError::Input(e.to_string()))?;
                processing_month = Some(
                    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                        .map_err(|_| ApiError::Input("Invalid date format. Use YYYY-MM-DD".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::Input("No file provided".to_string()))?;
    let (Some(site_id), Some(employee_id), Some(processing_month)) = (site_id, employee_id, processing_month) else {
        return Err(ApiError::Input("site_id, employee_id, and processing_month are required".to_string()));
    };
    if !is_allowed_mime(&file.content_type) {
        return Err(ApiError::Input("Unsupported file type. Please upload an image or PDF only.".to_string()));
    }

    let card_id = create_work_card(
        &state.pool,
        admin.business_id,
        Some(site_id),
        Some(employee_id),
        processing_month,
        WorkCardSource::AdminSingle,
        &file,
    )
    .await?;

    state.dashboard_cache.invalidate_business(admin.business_id).await;
    let card = cardflow_db::repo::work_cards::get(&state.pool, card_id).await?;
    Ok(Json(ApiEnvelope::ok("Work card uploaded successfully", WorkCardDto::from(&card))))
}

pub async fn upload_batch(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    mut multipart: Multipart,
) -> Result<Json<ApiEnvelope<BatchUploadResponse>>, ApiError> {
    let mut files: Vec<IncomingFile> = Vec::new();
    let mut site_id: Option<SiteId> = None;
    let mut processing_month: Option<NaiveDate> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::Input(e.to_string()))? {
        match field.name().unwrap_or_default() {
            "files" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field.bytes().await.map_err(|e| ApiError::Input(e.to_string()))?.to_vec();
                files.push(IncomingFile { filename, content_type, bytes });
            }
            "site_id" => {
                let text = field.text().await.map_err(|e| ApiError::Input(e.to_string()))?;
                site_id = Some(SiteId::parse(&text).map_err(|e| ApiError::Input(e.to_string()))?);
            }
            "processing_month" => {
                let text = field.text().await.map_err(|e| ApiError::Input(e.to_string()))?;
                processing_month = Some(
                    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                        .map_err(|_| ApiError::Input("Invalid date format. Use YYYY-MM-DD".to_string()))?,
                );
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(ApiError::Input("No files selected".to_string()));
    }
    let (Some(site_id), Some(processing_month)) = (site_id, processing_month) else {
        return Err(ApiError::Input("site_id and processing_month are required".to_string()));
    };

    let mut uploaded = Vec::new();
    let mut failed = Vec::new();
    for file in files {
        if !is_allowed_mime(&file.content_type) {
            failed.push(FailedFile {
                filename: file.filename,
                error: "Unsupported file type. Please upload an image or PDF only.".to_string(),
            });
            continue;
        }
        let filename = file.filename.clone();
        match create_work_card(&state.pool, admin.business_id, Some(site_id), None, processing_month, WorkCardSource::AdminBatch, &file).await {
            Ok(card_id) => uploaded.push(UploadedFile { id: card_id, filename }),
            Err(err) => failed.push(FailedFile { filename, error: err.to_string() }),
        }
    }

    state.dashboard_cache.invalidate_business(admin.business_id).await;
    let total = uploaded.len() + failed.len();
    let message = format!("Batch upload completed: {} uploaded, {} failed", uploaded.len(), failed.len());
    Ok(Json(ApiEnvelope::ok(message, BatchUploadResponse { uploaded, failed, total })))
}
