use async_trait::async_trait;
use cardflow_ids::{BusinessId, EmployeeId, SiteId};
use cardflow_matching::{EmployeeHit, EmployeeLookup};
use sqlx::PgExecutor;

use crate::error::{DbError, Result};
use crate::models::Employee;
use crate::pool::DbPool;

pub async fn get<'c>(executor: impl PgExecutor<'c>, business_id: BusinessId, id: EmployeeId) -> Result<Employee> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1 AND business_id = $2")
        .bind(id.as_uuid())
        .bind(business_id.as_uuid())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::not_found(format!("employee {id}")))
}

pub async fn get_by_passport<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    normalized_passport_id: &str,
) -> Result<Option<Employee>> {
    let row = sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE business_id = $1 AND passport_id = $2",
    )
    .bind(business_id.as_uuid())
    .bind(normalized_passport_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn search_by_name<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    site_id: Option<SiteId>,
    name: &str,
) -> Result<Vec<Employee>> {
    let rows = match site_id {
        Some(site) => {
            sqlx::query_as::<_, Employee>(
                "SELECT * FROM employees WHERE business_id = $1 AND site_id = $2 AND full_name ILIKE $3",
            )
            .bind(business_id.as_uuid())
            .bind(site.as_uuid())
            .bind(name)
            .fetch_all(executor)
            .await?
        }
        None => {
            sqlx::query_as::<_, Employee>(
                "SELECT * FROM employees WHERE business_id = $1 AND full_name ILIKE $2",
            )
            .bind(business_id.as_uuid())
            .bind(name)
            .fetch_all(executor)
            .await?
        }
    };
    Ok(rows)
}

pub async fn list_for_site<'c>(
    executor: impl PgExecutor<'c>,
    business_id: BusinessId,
    site_id: SiteId,
    include_inactive: bool,
) -> Result<Vec<Employee>> {
    let rows = if include_inactive {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE business_id = $1 AND site_id = $2")
            .bind(business_id.as_uuid())
            .bind(site_id.as_uuid())
            .fetch_all(executor)
            .await?
    } else {
        sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE business_id = $1 AND site_id = $2 AND active",
        )
        .bind(business_id.as_uuid())
        .bind(site_id.as_uuid())
        .fetch_all(executor)
        .await?
    };
    Ok(rows)
}

/// Adapts the pool-backed repository to `cardflow_matching`'s
/// `EmployeeLookup` capability interface, so the resolver never depends on
/// `cardflow_db` directly.
pub struct PgEmployeeLookup {
    pool: DbPool,
}

impl PgEmployeeLookup {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeLookup for PgEmployeeLookup {
    async fn get_by_passport(
        &self,
        business_id: BusinessId,
        normalized_passport_id: &str,
    ) -> anyhow::Result<Option<EmployeeHit>> {
        let employee = get_by_passport(&self.pool, business_id, normalized_passport_id).await?;
        Ok(employee.map(|e| EmployeeHit {
            employee_id: e.id,
            full_name: e.full_name,
        }))
    }

    async fn search_by_name(
        &self,
        business_id: BusinessId,
        site_id: Option<SiteId>,
        name: &str,
    ) -> anyhow::Result<Vec<EmployeeHit>> {
        let employees = search_by_name(&self.pool, business_id, site_id, name).await?;
        Ok(employees
            .into_iter()
            .map(|e| EmployeeHit {
                employee_id: e.id,
                full_name: e.full_name,
            })
            .collect())
    }
}
