//! `GET /api/sites/<id>/matrix` — the hours matrix and per-employee upload
//! status for a site's processing month.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use cardflow_ids::{EmployeeId, SiteId};
use cardflow_protocol::{ApiEnvelope, UploadStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::AdminPrincipal;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MatrixQuery {
    pub processing_month: NaiveDate,
    #[serde(default)]
    pub approved_only: bool,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSummary {
    pub id: EmployeeId,
    pub full_name: String,
    pub passport_id: Option<String>,
    pub active: bool,
}

impl From<&cardflow_db::Employee> for EmployeeSummary {
    fn from(employee: &cardflow_db::Employee) -> Self {
        Self {
            id: employee.id,
            full_name: employee.full_name.clone(),
            passport_id: employee.passport_id.clone(),
            active: employee.active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixResponse {
    pub employees: Vec<EmployeeSummary>,
    pub matrix: HashMap<EmployeeId, HashMap<i32, Decimal>>,
    pub status_map: HashMap<EmployeeId, UploadStatus>,
    pub processing_month: NaiveDate,
}

pub async fn get_matrix(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(site_id): Path<SiteId>,
    Query(query): Query<MatrixQuery>,
) -> Result<Json<ApiEnvelope<MatrixResponse>>, ApiError> {
    cardflow_db::repo::sites::get(&state.pool, admin.business_id, site_id).await?;

    if let Some(cached) = state
        .dashboard_cache
        .get(admin.business_id, site_id, query.processing_month, query.approved_only, query.include_inactive)
        .await
    {
        return Ok(Json(ApiEnvelope::ok("Matrix loaded", cached)));
    }

    let built = cardflow_reconcile::build_hours_matrix(
        &state.pool,
        admin.business_id,
        site_id,
        query.processing_month,
        query.approved_only,
        query.include_inactive,
    )
    .await?;

    let response = MatrixResponse {
        employees: built.employees.iter().map(EmployeeSummary::from).collect(),
        matrix: built.matrix,
        status_map: built.status_map,
        processing_month: built.processing_month,
    };

    state
        .dashboard_cache
        .put(
            admin.business_id,
            site_id,
            query.processing_month,
            query.approved_only,
            query.include_inactive,
            response.clone(),
        )
        .await;

    Ok(Json(ApiEnvelope::ok("Matrix loaded", response)))
}
