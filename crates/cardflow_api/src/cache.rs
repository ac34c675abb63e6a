//! In-memory per-business dashboard cache keyed by `(business_id, month)`,
//! with TTL eviction on read. A single mutex is the simplest correct
//! primitive at this scale; sharding is not worth the complexity until
//! profiling says otherwise.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use cardflow_ids::{BusinessId, SiteId};
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::routes::matrix::MatrixResponse;

type CacheKey = (BusinessId, SiteId, NaiveDate, bool, bool);

struct CacheEntry {
    value: MatrixResponse,
    inserted_at: Instant,
}

pub struct DashboardCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl DashboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn get(
        &self,
        business_id: BusinessId,
        site_id: SiteId,
        processing_month: NaiveDate,
        approved_only: bool,
        include_inactive: bool,
    ) -> Option<MatrixResponse> {
        let key = (business_id, site_id, processing_month, approved_only, include_inactive);
        let entries = self.entries.lock().await;
        let entry = entries.get(&key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn put(
        &self,
        business_id: BusinessId,
        site_id: SiteId,
        processing_month: NaiveDate,
        approved_only: bool,
        include_inactive: bool,
        value: MatrixResponse,
    ) {
        let key = (business_id, site_id, processing_month, approved_only, include_inactive);
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops every cached entry for a business, used after a write that
    /// could change any month's matrix (approval, day-entry edit, upload).
    pub async fn invalidate_business(&self, business_id: BusinessId) {
        let mut entries = self.entries.lock().await;
        entries.retain(|key, _| key.0 != business_id);
    }
}
