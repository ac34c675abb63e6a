use cardflow_ids::BusinessId;
use sqlx::PgExecutor;

use crate::error::{DbError, Result};
use crate::models::Business;

pub async fn get<'c>(executor: impl PgExecutor<'c>, id: BusinessId) -> Result<Business> {
    sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::not_found(format!("business {id}")))
}

pub async fn create<'c>(executor: impl PgExecutor<'c>, name: &str, code: Option<&str>) -> Result<BusinessId> {
    let id = BusinessId::new();
    sqlx::query("INSERT INTO businesses (id, name, code, active) VALUES ($1, $2, $3, true)")
        .bind(id.as_uuid())
        .bind(name)
        .bind(code)
        .execute(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::constraint(format!("business name '{name}' already exists"))
            }
            _ => DbError::from(e),
        })?;
    Ok(id)
}
