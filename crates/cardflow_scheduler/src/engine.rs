//! The execution loop: claim one job, run it end to end, commit the
//! terminal state last. Generic over the capability interfaces in `traits`
//! so the whole loop is testable against in-memory fakes.

use std::time::Duration as StdDuration;

use cardflow_ids::ExtractionJobId;
use cardflow_matching::{EmployeeLookup, EmployeeResolver, MatchInput};
use cardflow_protocol::{ExtractedEntry, IdentityReason, ReviewStatus};
use cardflow_vision::{apply_semantic_gate, ChainVisionExtractor, GateConfig, VisionExtractor};
use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::traits::{DayEntryRecord, EmployeeRecordStore, ImageStore, JobLogger, JobStore, WorkCardStore};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub worker_id: String,
    pub stale_threshold: StdDuration,
    pub max_attempts: i32,
    pub enable_name_site_fallback: bool,
    pub gate: GateConfig,
}

pub struct Scheduler<J, W, Im, Es, V: VisionExtractor, L: EmployeeLookup, C, LG> {
    pub jobs: J,
    pub cards: W,
    pub images: Im,
    pub employees: Es,
    pub vision: ChainVisionExtractor<V>,
    pub resolver: EmployeeResolver<L>,
    pub clock: C,
    pub logger: LG,
    pub config: SchedulerConfig,
}

impl<J, W, Im, Es, V, L, C, LG> Scheduler<J, W, Im, Es, V, L, C, LG>
where
    J: JobStore,
    W: WorkCardStore,
    Im: ImageStore,
    Es: EmployeeRecordStore,
    V: VisionExtractor,
    L: EmployeeLookup,
    C: Clock,
    LG: JobLogger,
{
    /// Runs the stale-lease sweep (crash recovery), then attempts to claim
    /// and run a single job. Returns `true` if a job was claimed (whether it
    /// succeeded or failed), `false` if nothing was available this tick.
    pub async fn tick(&self) -> anyhow::Result<bool> {
        let recovered = self
            .jobs
            .recover_stale_leases(self.config.stale_threshold, self.config.max_attempts)
            .await?;
        self.logger.leases_recovered(recovered.len());

        tracing::debug!(tick_at = %self.clock.now(), "scheduler tick");
        let candidates = self.jobs.find_pending_unleased(5).await?;
        for job_id in candidates {
            if self.jobs.claim(job_id, &self.config.worker_id).await? {
                self.run_job(job_id).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn run_job(&self, job_id: ExtractionJobId) -> anyhow::Result<()> {
        let job = self.jobs.get(job_id).await?;
        self.logger.job_claimed(job_id, job.work_card_id);
        self.jobs.mark_running(job_id).await?;

        if let Err(err) = self.run_job_inner(job_id, job.work_card_id).await {
            self.jobs.mark_failed(job_id, &err.to_string()).await?;
            self.logger.job_failed(job_id, &err.to_string());
        }
        Ok(())
    }

    async fn run_job_inner(&self, job_id: ExtractionJobId, work_card_id: cardflow_ids::WorkCardId) -> anyhow::Result<()> {
        // Step 2: load image bytes and business context. Missing image is a
        // permanent failure, never retried.
        let image_bytes = self.images.get_bytes(work_card_id).await?;
        let card = self.cards.get(work_card_id).await?;

        // Step 3: invoke the vision chain.
        let raw_result = self.vision.extract(&image_bytes).await?;

        // Step 4: semantic gate + normalize.
        let (gated_entries, quality) = apply_semantic_gate(raw_result.entries.clone(), self.config.gate);
        let candidate_strings: Vec<String> = raw_result
            .passport_id_candidates
            .iter()
            .map(|candidate| candidate.raw.clone())
            .collect();
        // The model's own top pick, falling back to its highest-confidence
        // candidate when it did not single one out.
        let primary_raw = raw_result.selected_passport_id_normalized.clone().or_else(|| {
            raw_result
                .passport_id_candidates
                .iter()
                .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
                .map(|candidate| candidate.raw.clone())
        });
        let normalized_primary = cardflow_passport::normalize(primary_raw.as_deref());
        let normalized_candidates = cardflow_passport::normalize_candidates(candidate_strings.iter());

        // Step 5: resolve employee, compute identity diagnostics.
        let existing_employee = match card.employee_id {
            Some(employee_id) => self.employees.get(card.business_id, employee_id).await?,
            None => None,
        };

        let match_outcome = if existing_employee.is_none() {
            self.resolver
                .resolve(MatchInput {
                    business_id: card.business_id,
                    primary_raw: primary_raw.as_deref(),
                    candidates: &candidate_strings,
                    name: raw_result.employee_name.as_deref(),
                    site: card.site_id,
                    enable_name_site_fallback: self.config.enable_name_site_fallback,
                })
                .await?
        } else {
            None
        };

        let identity_reason: Option<IdentityReason> = existing_employee.as_ref().map(|employee| {
            cardflow_matching::diagnose_identity_mismatch(
                employee.passport_id.as_deref(),
                normalized_primary.as_deref(),
            )
        }).flatten();

        if let Some(outcome) = &match_outcome {
            self.cards.assign_employee(work_card_id, outcome.employee_id).await?;
        }

        let has_employee = card.employee_id.is_some() || match_outcome.is_some();

        // Step 6: fetch the immediate previous card and its day entries.
        let employee_for_previous = match (&match_outcome, card.employee_id) {
            (Some(outcome), _) => Some(outcome.employee_id),
            (None, Some(id)) => Some(id),
            (None, None) => None,
        };
        let previous_entries = if let Some(employee_id) = employee_for_previous {
            match self
                .cards
                .previous_card(card.business_id, employee_id, card.processing_month, work_card_id)
                .await?
            {
                Some(previous) => self.cards.day_entries(previous.id).await?,
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        // Step 7: insert new day entries, skipping existing days and days
        // that exactly match the previous card (normalized comparison).
        for entry in &gated_entries {
            if self.cards.day_entry_exists(work_card_id, entry.day).await? {
                continue;
            }
            if previous_entries
                .iter()
                .any(|previous| previous.day_of_month == entry.day && entry_matches_previous(entry, previous))
            {
                continue;
            }
            self.cards
                .insert_extracted_entry(
                    work_card_id,
                    entry.day,
                    entry.start_time,
                    entry.end_time,
                    entry.total_hours,
                )
                .await?;
        }

        // Step 8: update review status.
        let status = if has_employee {
            ReviewStatus::NeedsReview
        } else {
            ReviewStatus::NeedsAssignment
        };
        self.cards.set_review_status(work_card_id, status).await?;

        // Step 9: mark done with the full result payload.
        let raw_json = serde_json::to_value(&raw_result)?;
        let normalized_json = serde_json::json!({
            "entries": gated_entries,
            "quality": quality,
            "normalized_primary_passport": normalized_primary,
            "normalized_candidate_passports": normalized_candidates,
            "identity_reason": identity_reason,
        });

        self.jobs
            .mark_done(
                job_id,
                &raw_json,
                &normalized_json,
                match_outcome.as_ref().map(|m| m.employee_id),
                match_outcome.as_ref().map(|m| m.method),
                match_outcome.as_ref().and_then(|m| Decimal::from_f64_retain(m.confidence())),
                &raw_result.model_name,
                cardflow_vision::PIPELINE_VERSION,
                raw_result.employee_name.as_deref(),
                normalized_primary.as_deref(),
            )
            .await?;
        self.logger.job_done(job_id, match_outcome.is_some() || has_employee);
        Ok(())
    }
}

/// Normalized-time/hour equality between a freshly extracted row and a
/// previously persisted day entry, per §4.4 step 7.
fn entry_matches_previous(entry: &ExtractedEntry, previous: &DayEntryRecord) -> bool {
    time_eq(entry.start_time, previous.from_time)
        && time_eq(entry.end_time, previous.to_time)
        && hours_eq(entry.total_hours, previous.total_hours)
}

fn time_eq(a: Option<NaiveTime>, b: Option<NaiveTime>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.format("%H:%M").to_string() == b.format("%H:%M").to_string(),
        (None, None) => true,
        _ => false,
    }
}

fn hours_eq(a: Option<Decimal>, b: Option<Decimal>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.round_dp(2) == b.round_dp(2),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cardflow_ids::{BusinessId, EmployeeId, SiteId, WorkCardId};
    use cardflow_matching::{EmployeeHit, EmployeeLookup};
    use cardflow_protocol::{ExtractedEntry, ExtractionResult, JobStatus, MatchMethod, RowState};
    use cardflow_vision::FakeVisionExtractor;
    use chrono::{NaiveDate, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use crate::traits::{JobRecord, WorkCardRecord};

    struct FixedClock;
    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            Utc::now()
        }
    }

    struct FakeLookup {
        by_passport: HashMap<String, EmployeeHit>,
    }

    #[async_trait]
    impl EmployeeLookup for FakeLookup {
        async fn get_by_passport(
            &self,
            _business_id: BusinessId,
            normalized_passport_id: &str,
        ) -> anyhow::Result<Option<EmployeeHit>> {
            Ok(self.by_passport.get(normalized_passport_id).cloned())
        }

        async fn search_by_name(
            &self,
            _business_id: BusinessId,
            _site_id: Option<SiteId>,
            _name: &str,
        ) -> anyhow::Result<Vec<EmployeeHit>> {
            Ok(vec![])
        }
    }

    struct FakeJobs {
        job: JobRecord,
        pending: Mutex<Vec<ExtractionJobId>>,
        claimed: Mutex<bool>,
        done: Mutex<bool>,
        failed: Mutex<Option<String>>,
        recovered: Mutex<Vec<ExtractionJobId>>,
    }

    #[async_trait]
    impl JobStore for FakeJobs {
        async fn find_pending_unleased(&self, _limit: i64) -> anyhow::Result<Vec<ExtractionJobId>> {
            Ok(self.pending.lock().unwrap().clone())
        }

        async fn claim(&self, _job_id: ExtractionJobId, _worker_id: &str) -> anyhow::Result<bool> {
            let mut claimed = self.claimed.lock().unwrap();
            if *claimed {
                return Ok(false);
            }
            *claimed = true;
            self.pending.lock().unwrap().clear();
            Ok(true)
        }

        async fn get(&self, _job_id: ExtractionJobId) -> anyhow::Result<JobRecord> {
            Ok(self.job.clone())
        }

        async fn mark_running(&self, _job_id: ExtractionJobId) -> anyhow::Result<()> {
            Ok(())
        }

        async fn mark_done(
            &self,
            _job_id: ExtractionJobId,
            _raw_result: &serde_json::Value,
            _normalized_result: &serde_json::Value,
            _matched_employee_id: Option<EmployeeId>,
            _match_method: Option<MatchMethod>,
            _match_confidence: Option<Decimal>,
            _model_name: &str,
            _pipeline_version: &str,
            _extracted_employee_name: Option<&str>,
            _extracted_passport_id: Option<&str>,
        ) -> anyhow::Result<()> {
            *self.done.lock().unwrap() = true;
            Ok(())
        }

        async fn mark_failed(&self, _job_id: ExtractionJobId, error: &str) -> anyhow::Result<()> {
            *self.failed.lock().unwrap() = Some(error.to_string());
            Ok(())
        }

        async fn recover_stale_leases(
            &self,
            _stale_after: StdDuration,
            _max_attempts: i32,
        ) -> anyhow::Result<Vec<ExtractionJobId>> {
            Ok(self.recovered.lock().unwrap().drain(..).collect())
        }
    }

    struct FakeCards {
        card: WorkCardRecord,
        existing_days: Mutex<Vec<i32>>,
        inserted: Mutex<Vec<i32>>,
        status: Mutex<Option<ReviewStatus>>,
        assigned: Mutex<Option<EmployeeId>>,
    }

    #[async_trait]
    impl WorkCardStore for FakeCards {
        async fn get(&self, _work_card_id: WorkCardId) -> anyhow::Result<WorkCardRecord> {
            Ok(self.card.clone())
        }

        async fn previous_card(
            &self,
            _business_id: BusinessId,
            _employee_id: EmployeeId,
            _processing_month: NaiveDate,
            _current: WorkCardId,
        ) -> anyhow::Result<Option<WorkCardRecord>> {
            Ok(None)
        }

        async fn day_entries(&self, _work_card_id: WorkCardId) -> anyhow::Result<Vec<DayEntryRecord>> {
            Ok(vec![])
        }

        async fn day_entry_exists(&self, _work_card_id: WorkCardId, day_of_month: i32) -> anyhow::Result<bool> {
            Ok(self.existing_days.lock().unwrap().contains(&day_of_month))
        }

        async fn insert_extracted_entry(
            &self,
            _work_card_id: WorkCardId,
            day_of_month: i32,
            _from_time: Option<NaiveTime>,
            _to_time: Option<NaiveTime>,
            _total_hours: Option<Decimal>,
        ) -> anyhow::Result<()> {
            self.inserted.lock().unwrap().push(day_of_month);
            Ok(())
        }

        async fn set_review_status(&self, _work_card_id: WorkCardId, status: ReviewStatus) -> anyhow::Result<()> {
            *self.status.lock().unwrap() = Some(status);
            Ok(())
        }

        async fn assign_employee(&self, _work_card_id: WorkCardId, employee_id: EmployeeId) -> anyhow::Result<()> {
            *self.assigned.lock().unwrap() = Some(employee_id);
            Ok(())
        }
    }

    struct FakeImages;

    #[async_trait]
    impl ImageStore for FakeImages {
        async fn get_bytes(&self, _work_card_id: WorkCardId) -> anyhow::Result<Vec<u8>> {
            Ok(vec![0u8; 4])
        }
    }

    struct FakeEmployees;

    #[async_trait]
    impl EmployeeRecordStore for FakeEmployees {
        async fn get(
            &self,
            _business_id: BusinessId,
            _employee_id: EmployeeId,
        ) -> anyhow::Result<Option<crate::traits::EmployeeRecord>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct FakeLogger {
        done_calls: Mutex<Vec<bool>>,
        recovered_calls: Mutex<Vec<usize>>,
    }

    impl JobLogger for FakeLogger {
        fn job_claimed(&self, _job_id: ExtractionJobId, _work_card_id: WorkCardId) {}

        fn job_done(&self, _job_id: ExtractionJobId, matched: bool) {
            self.done_calls.lock().unwrap().push(matched);
        }

        fn job_failed(&self, _job_id: ExtractionJobId, _error: &str) {}

        fn leases_recovered(&self, count: usize) {
            self.recovered_calls.lock().unwrap().push(count);
        }
    }

    fn extraction_result(passport: &str) -> ExtractionResult {
        ExtractionResult {
            employee_name: Some("Dan".to_string()),
            passport_id_candidates: vec![],
            selected_passport_id_normalized: Some(passport.to_string()),
            entries: vec![ExtractedEntry {
                day: 1,
                start_time: None,
                end_time: None,
                total_hours: Some(Decimal::new(800, 2)),
                row_state: RowState::Worked,
                mark_type: None,
                row_confidence: 0.95,
                evidence: vec![],
            }],
            model_name: "gpt-4.1".to_string(),
            used_fallback: false,
        }
    }

    fn build_scheduler(
        jobs: FakeJobs,
        cards: FakeCards,
        lookup: FakeLookup,
        vision_result: ExtractionResult,
    ) -> Scheduler<FakeJobs, FakeCards, FakeImages, FakeEmployees, FakeVisionExtractor, FakeLookup, FixedClock, FakeLogger>
    {
        Scheduler {
            jobs,
            cards,
            images: FakeImages,
            employees: FakeEmployees,
            vision: ChainVisionExtractor::new(
                FakeVisionExtractor { result: Ok(vision_result) },
                "gpt-4.1",
                None,
                None,
                vec![],
                StdDuration::from_secs(5),
            ),
            resolver: EmployeeResolver::new(lookup),
            clock: FixedClock,
            logger: FakeLogger::default(),
            config: SchedulerConfig {
                worker_id: "test-worker".to_string(),
                stale_threshold: StdDuration::from_secs(1800),
                max_attempts: 3,
                enable_name_site_fallback: false,
                gate: GateConfig::default(),
            },
        }
    }

    #[tokio::test]
    async fn happy_path_matches_employee_and_inserts_day_entry() {
        let work_card_id = WorkCardId::new();
        let business_id = BusinessId::new();
        let job_id = ExtractionJobId::new();
        let dan = EmployeeId::new();

        let jobs = FakeJobs {
            job: JobRecord {
                id: job_id,
                work_card_id,
                status: JobStatus::Pending,
                attempts: 0,
                mode: cardflow_protocol::ExtractionMode::Full,
            },
            pending: Mutex::new(vec![job_id]),
            claimed: Mutex::new(false),
            done: Mutex::new(false),
            failed: Mutex::new(None),
            recovered: Mutex::new(vec![]),
        };
        let cards = FakeCards {
            card: WorkCardRecord {
                id: work_card_id,
                business_id,
                site_id: None,
                employee_id: None,
                processing_month: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            },
            existing_days: Mutex::new(vec![]),
            inserted: Mutex::new(vec![]),
            status: Mutex::new(None),
            assigned: Mutex::new(None),
        };
        let mut by_passport = HashMap::new();
        by_passport.insert(
            "N123456".to_string(),
            EmployeeHit {
                employee_id: dan,
                full_name: "Dan".to_string(),
            },
        );
        let lookup = FakeLookup { by_passport };

        let scheduler = build_scheduler(jobs, cards, lookup, extraction_result("N123456"));
        let claimed = scheduler.tick().await.unwrap();
        assert!(claimed);

        assert!(*scheduler.jobs.done.lock().unwrap());
        assert!(scheduler.jobs.failed.lock().unwrap().is_none());
        assert_eq!(scheduler.cards.inserted.lock().unwrap().as_slice(), &[1]);
        assert_eq!(scheduler.cards.assigned.lock().unwrap().as_ref(), Some(&dan));
        assert_eq!(scheduler.cards.status.lock().unwrap().as_ref(), Some(&ReviewStatus::NeedsReview));
        assert_eq!(scheduler.logger.done_calls.lock().unwrap().as_slice(), &[true]);
    }

    #[tokio::test]
    async fn no_match_leaves_card_needing_assignment() {
        let work_card_id = WorkCardId::new();
        let business_id = BusinessId::new();
        let job_id = ExtractionJobId::new();

        let jobs = FakeJobs {
            job: JobRecord {
                id: job_id,
                work_card_id,
                status: JobStatus::Pending,
                attempts: 0,
                mode: cardflow_protocol::ExtractionMode::Full,
            },
            pending: Mutex::new(vec![job_id]),
            claimed: Mutex::new(false),
            done: Mutex::new(false),
            failed: Mutex::new(None),
            recovered: Mutex::new(vec![]),
        };
        let cards = FakeCards {
            card: WorkCardRecord {
                id: work_card_id,
                business_id,
                site_id: None,
                employee_id: None,
                processing_month: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            },
            existing_days: Mutex::new(vec![]),
            inserted: Mutex::new(vec![]),
            status: Mutex::new(None),
            assigned: Mutex::new(None),
        };
        let lookup = FakeLookup {
            by_passport: HashMap::new(),
        };

        let scheduler = build_scheduler(jobs, cards, lookup, extraction_result("N999999"));
        scheduler.tick().await.unwrap();

        assert_eq!(scheduler.cards.assigned.lock().unwrap().as_ref(), None);
        assert_eq!(
            scheduler.cards.status.lock().unwrap().as_ref(),
            Some(&ReviewStatus::NeedsAssignment)
        );
        assert_eq!(scheduler.logger.done_calls.lock().unwrap().as_slice(), &[false]);
    }

    #[tokio::test]
    async fn tick_surfaces_recovered_stale_leases_and_skips_claim_when_nothing_pending() {
        let work_card_id = WorkCardId::new();
        let job_id = ExtractionJobId::new();
        let recovered_id = ExtractionJobId::new();

        let jobs = FakeJobs {
            job: JobRecord {
                id: job_id,
                work_card_id,
                status: JobStatus::Pending,
                attempts: 1,
                mode: cardflow_protocol::ExtractionMode::Full,
            },
            pending: Mutex::new(vec![]),
            claimed: Mutex::new(false),
            done: Mutex::new(false),
            failed: Mutex::new(None),
            recovered: Mutex::new(vec![recovered_id]),
        };
        let cards = FakeCards {
            card: WorkCardRecord {
                id: work_card_id,
                business_id: BusinessId::new(),
                site_id: None,
                employee_id: None,
                processing_month: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            },
            existing_days: Mutex::new(vec![]),
            inserted: Mutex::new(vec![]),
            status: Mutex::new(None),
            assigned: Mutex::new(None),
        };
        let lookup = FakeLookup {
            by_passport: HashMap::new(),
        };

        let scheduler = build_scheduler(jobs, cards, lookup, extraction_result("N000000"));
        let claimed = scheduler.tick().await.unwrap();

        assert!(!claimed);
        assert_eq!(scheduler.logger.recovered_calls.lock().unwrap().as_slice(), &[1]);
        assert!(!*scheduler.jobs.done.lock().unwrap());
    }
}
