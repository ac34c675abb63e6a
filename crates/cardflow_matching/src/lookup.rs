use async_trait::async_trait;
use cardflow_ids::{BusinessId, EmployeeId, SiteId};

/// Minimal projection of an employee record needed to report a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeHit {
    pub employee_id: EmployeeId,
    pub full_name: String,
}

/// Capability interface the resolver depends on instead of a concrete
/// `cardflow_db` repository, so tests can inject an in-memory fake.
#[async_trait]
pub trait EmployeeLookup: Send + Sync {
    async fn get_by_passport(
        &self,
        business_id: BusinessId,
        normalized_passport_id: &str,
    ) -> anyhow::Result<Option<EmployeeHit>>;

    async fn search_by_name(
        &self,
        business_id: BusinessId,
        site_id: Option<SiteId>,
        name: &str,
    ) -> anyhow::Result<Vec<EmployeeHit>>;
}
