use cardflow_ids::{EmployeeId, SiteId};
use cardflow_ids::BusinessId;
use cardflow_protocol::MatchMethod;

use crate::lookup::EmployeeLookup;

/// Inputs to a single resolution attempt.
pub struct MatchInput<'a> {
    pub business_id: BusinessId,
    pub primary_raw: Option<&'a str>,
    pub candidates: &'a [String],
    pub name: Option<&'a str>,
    pub site: Option<SiteId>,
    pub enable_name_site_fallback: bool,
}

/// A single resolved match; absence means the engine found nothing
/// conclusive and the admin retains final authority.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub method: MatchMethod,
    pub normalized_passport_id: Option<String>,
}

impl MatchOutcome {
    pub fn confidence(&self) -> f64 {
        self.method.confidence()
    }

    pub fn is_exact(&self) -> bool {
        self.method.is_exact()
    }
}

/// Implements the three-tier employee resolution policy: primary normalized
/// passport, then candidate passports in order, then an optional
/// name+site fallback. Ambiguity at any tier is a miss, never a guess.
pub struct EmployeeResolver<L: EmployeeLookup> {
    lookup: L,
}

impl<L: EmployeeLookup> EmployeeResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub async fn resolve(&self, input: MatchInput<'_>) -> anyhow::Result<Option<MatchOutcome>> {
        let normalized_primary = cardflow_passport::normalize(input.primary_raw);

        if let Some(primary) = &normalized_primary {
            if let Some(hit) = self.lookup.get_by_passport(input.business_id, primary).await? {
                return Ok(Some(MatchOutcome {
                    employee_id: hit.employee_id,
                    employee_name: hit.full_name,
                    method: MatchMethod::PassportNormalizedExact,
                    normalized_passport_id: Some(primary.clone()),
                }));
            }
        }

        let normalized_candidates = cardflow_passport::normalize_candidates(input.candidates);
        for candidate in &normalized_candidates {
            if let Some(hit) = self.lookup.get_by_passport(input.business_id, candidate).await? {
                return Ok(Some(MatchOutcome {
                    employee_id: hit.employee_id,
                    employee_name: hit.full_name,
                    method: MatchMethod::PassportCandidateExact,
                    normalized_passport_id: Some(candidate.clone()),
                }));
            }
        }

        if input.enable_name_site_fallback {
            if let Some(name) = input.name.map(str::trim).filter(|n| !n.is_empty()) {
                let matches = self
                    .lookup
                    .search_by_name(input.business_id, input.site, name)
                    .await?;
                if matches.len() == 1 {
                    let hit = matches.into_iter().next().unwrap();
                    return Ok(Some(MatchOutcome {
                        employee_id: hit.employee_id,
                        employee_name: hit.full_name,
                        method: MatchMethod::NameSiteHighConfidenceFallback,
                        normalized_passport_id: None,
                    }));
                }
                // Zero or multiple hits: ambiguous, no match.
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::EmployeeHit;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeLookup {
        by_passport: HashMap<String, EmployeeHit>,
        by_name: Vec<EmployeeHit>,
        name_calls: Mutex<usize>,
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
            *self.name_calls.lock().unwrap() += 1;
            Ok(self.by_name.clone())
        }
    }

    fn hit(name: &str) -> EmployeeHit {
        EmployeeHit {
            employee_id: EmployeeId::new(),
            full_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn primary_exact_match_wins_over_candidates() {
        let dan = hit("Dan");
        let mut by_passport = HashMap::new();
        by_passport.insert("N123456".to_string(), dan.clone());
        let lookup = FakeLookup {
            by_passport,
            by_name: vec![],
            name_calls: Mutex::new(0),
        };
        let resolver = EmployeeResolver::new(lookup);
        let outcome = resolver
            .resolve(MatchInput {
                business_id: BusinessId::new(),
                primary_raw: Some("N-12 34 56"),
                candidates: &[],
                name: None,
                site: None,
                enable_name_site_fallback: false,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.method, MatchMethod::PassportNormalizedExact);
        assert_eq!(outcome.employee_id, dan.employee_id);
    }

    #[tokio::test]
    async fn candidate_match_used_when_primary_absent() {
        let dan = hit("Dan");
        let mut by_passport = HashMap::new();
        by_passport.insert("N654321".to_string(), dan.clone());
        let lookup = FakeLookup {
            by_passport,
            by_name: vec![],
            name_calls: Mutex::new(0),
        };
        let resolver = EmployeeResolver::new(lookup);
        let outcome = resolver
            .resolve(MatchInput {
                business_id: BusinessId::new(),
                primary_raw: None,
                candidates: &["N654321".to_string()],
                name: None,
                site: None,
                enable_name_site_fallback: false,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.method, MatchMethod::PassportCandidateExact);
    }

    #[tokio::test]
    async fn name_fallback_only_used_when_enabled_and_unambiguous() {
        let dan = hit("Dan");
        let lookup = FakeLookup {
            by_passport: HashMap::new(),
            by_name: vec![dan.clone()],
            name_calls: Mutex::new(0),
        };
        let resolver = EmployeeResolver::new(lookup);
        let outcome = resolver
            .resolve(MatchInput {
                business_id: BusinessId::new(),
                primary_raw: None,
                candidates: &[],
                name: Some("Dan"),
                site: None,
                enable_name_site_fallback: true,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.method, MatchMethod::NameSiteHighConfidenceFallback);
        assert!(!outcome.is_exact());
    }

    #[tokio::test]
    async fn ambiguous_name_match_yields_no_result() {
        let lookup = FakeLookup {
            by_passport: HashMap::new(),
            by_name: vec![hit("Dan"), hit("Dan Other")],
            name_calls: Mutex::new(0),
        };
        let resolver = EmployeeResolver::new(lookup);
        let outcome = resolver
            .resolve(MatchInput {
                business_id: BusinessId::new(),
                primary_raw: None,
                candidates: &[],
                name: Some("Dan"),
                site: None,
                enable_name_site_fallback: true,
            })
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn name_fallback_not_attempted_when_disabled() {
        let lookup = FakeLookup {
            by_passport: HashMap::new(),
            by_name: vec![hit("Dan")],
            name_calls: Mutex::new(0),
        };
        let resolver = EmployeeResolver::new(lookup);
        let outcome = resolver
            .resolve(MatchInput {
                business_id: BusinessId::new(),
                primary_raw: None,
                candidates: &[],
                name: Some("Dan"),
                site: None,
                enable_name_site_fallback: false,
            })
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(*lookup_name_calls(&resolver), 0);
    }

    fn lookup_name_calls(resolver: &EmployeeResolver<FakeLookup>) -> std::sync::MutexGuard<'_, usize> {
        resolver.lookup.name_calls.lock().unwrap()
    }
}
