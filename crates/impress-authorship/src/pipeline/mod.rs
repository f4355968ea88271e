//! Per-researcher resolution pipeline and bounded-concurrency batches
//!
//! Each researcher runs through institution lookup, profile search,
//! Pass 1 matching, positional validation, optional Pass 2 and merge.
//! Researchers share nothing but the institution cache; a failure in
//! one never stops the others.

mod state;

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::cache::InstitutionCache;
use crate::config::ResolverConfig;
use crate::domain::{
    CandidateProfile, InstitutionId, MergedResult, ProfileRejection, RejectionReason,
    ResearcherQuery, ResearcherState, Tier, UnresolvedReason,
};
use crate::error::{Capability, ConfigError, ResolveError, SourceError};
use crate::matching::CandidateMatcher;
use crate::merge::ProfileMerger;
use crate::normalization::{clean_institution_name, NameSimilarity};
use crate::retry::RetryPolicy;
use crate::sources::{
    DoiLookup, InstitutionDirectory, ProfileSearch, PublicationHistory, WorksSource,
};
use crate::validation::{DoiMemo, PositionalValidator, ValidationReport};

pub use state::ResearcherReport;
use state::ResearcherRun;

/// The external capabilities one pipeline draws on
#[derive(Clone)]
pub struct Sources {
    pub profiles: Arc<dyn ProfileSearch>,
    pub lookup: Arc<dyn DoiLookup>,
    pub works: Arc<dyn WorksSource>,
    pub history: Arc<dyn PublicationHistory>,
    pub institutions: Arc<dyn InstitutionDirectory>,
}

/// Researcher counts per terminal state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub merged: usize,
    pub ambiguous: usize,
    pub no_match: usize,
    pub unresolved: usize,
    /// Unresolved researchers whose cause was an unavailable source
    pub source_unavailable: usize,
    /// Distinct works over all merged researchers
    pub works: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[ResearcherReport]) -> Self {
        let mut summary = BatchSummary::default();
        for report in reports {
            summary.total += 1;
            match report.state() {
                ResearcherState::Merged => {
                    summary.merged += 1;
                    summary.works += report.result.counts.works;
                }
                ResearcherState::Ambiguous => summary.ambiguous += 1,
                ResearcherState::NoMatch => summary.no_match += 1,
                ResearcherState::Unresolved(reason) => {
                    summary.unresolved += 1;
                    if matches!(reason, UnresolvedReason::SourceUnavailable { .. }) {
                        summary.source_unavailable += 1;
                    }
                }
                // Non-terminal states never leave the pipeline
                _ => {}
            }
        }
        summary
    }
}

/// Reports in input order plus their summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: Vec<ResearcherReport>,
    pub summary: BatchSummary,
}

pub struct ResolutionPipeline {
    sources: Sources,
    retry: RetryPolicy,
    matcher: CandidateMatcher,
    validator: PositionalValidator,
    merger: ProfileMerger,
    cache: InstitutionCache,
    max_concurrency: usize,
}

impl ResolutionPipeline {
    /// Build a pipeline for one processing run. The institution cache
    /// lives as long as the pipeline.
    pub fn new(sources: Sources, config: ResolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let retry = RetryPolicy::from_config(&config.retry);

        Ok(Self {
            matcher: CandidateMatcher::new(config.matching.clone()),
            validator: PositionalValidator::new(&config.validation),
            merger: ProfileMerger::new(
                sources.works.clone(),
                retry.clone(),
                config.batch.max_pages_per_profile,
            ),
            cache: InstitutionCache::new(sources.institutions.clone(), retry.clone()),
            max_concurrency: config.batch.max_concurrency,
            retry,
            sources,
        })
    }

    /// Use another name scorer for matching and author location
    pub fn with_similarity(mut self, similarity: Arc<dyn NameSimilarity>) -> Self {
        self.matcher = self.matcher.with_similarity(similarity.clone());
        self.validator = self.validator.with_similarity(similarity);
        self
    }

    pub fn institution_cache(&self) -> &InstitutionCache {
        &self.cache
    }

    /// Resolve one researcher. Never fails: problems end in a terminal
    /// `Unresolved` state on the report.
    pub async fn resolve(&self, query: &ResearcherQuery) -> ResearcherReport {
        let mut run = ResearcherRun::new(query.id.clone());
        let outcome = self.drive(query, &mut run).await;
        let result = match outcome {
            Ok(result) => result,
            Err(err) => run.fail(err),
        };

        tracing::info!(
            researcher = %query.id,
            state = result.state.label(),
            profiles = result.profile_ids.len(),
            works = result.counts.works,
            "Researcher finished"
        );
        run.into_report(result)
    }

    /// Resolve researchers concurrently, up to `max_concurrency` at a
    /// time. Reports come back in input order.
    pub async fn resolve_batch(&self, queries: &[ResearcherQuery]) -> BatchReport {
        let reports: Vec<ResearcherReport> = stream::iter(queries)
            .map(|query| self.resolve(query))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let summary = BatchSummary::from_reports(&reports);
        tracing::info!(
            total = summary.total,
            merged = summary.merged,
            ambiguous = summary.ambiguous,
            no_match = summary.no_match,
            unresolved = summary.unresolved,
            "Batch finished"
        );
        BatchReport { reports, summary }
    }

    async fn drive(
        &self,
        query: &ResearcherQuery,
        run: &mut ResearcherRun,
    ) -> Result<MergedResult, ResolveError> {
        let institution_name = query
            .institution
            .as_deref()
            .map(clean_institution_name)
            .filter(|name| !name.is_empty());
        let institutions: BTreeSet<InstitutionId> = match &institution_name {
            Some(name) => self.cache.resolve(name).await.into_iter().collect(),
            None => BTreeSet::new(),
        };

        let search_name = query.search_name();
        let profiles = match self
            .retry
            .run("search_profiles", || {
                self.sources.profiles.search_profiles(
                    &search_name,
                    institution_name.as_deref(),
                    query.country.as_deref(),
                )
            })
            .await
        {
            Ok(profiles) => profiles,
            Err(SourceError::NotFound) => Vec::new(),
            Err(err) => return Err(ResolveError::unavailable(Capability::ProfileSearch, err)),
        };

        run.advance(ResearcherState::CandidatesFound)?;
        if profiles.is_empty() {
            run.advance(ResearcherState::NoMatch)?;
            return Ok(run.empty_result());
        }

        let query_name = query.normalized_name();
        let first = self
            .matcher
            .pass_one(&query.id, &query_name, &institutions, &profiles);
        if first.is_empty() {
            // No Tier 1/2 hit, so no anchor for Tier 3 either
            run.unresolved = first.unresolved;
            run.advance(ResearcherState::NoMatch)?;
            return Ok(run.empty_result());
        }
        let single_exact = first.single_exact().cloned();
        run.candidates = first.candidates;
        run.unresolved = first.unresolved;

        let history = match self
            .retry
            .run("publications", || self.sources.history.publications(query))
            .await
        {
            Ok(history) => history,
            Err(SourceError::NotFound) => Vec::new(),
            Err(err) => {
                return Err(ResolveError::unavailable(
                    Capability::PublicationHistory,
                    err,
                ))
            }
        };

        let mut memo = DoiMemo::new(self.sources.lookup.clone(), self.retry.clone());
        run.validation = self
            .validator
            .validate(query, &run.candidates, &history, &mut memo)
            .await
            .map_err(|err| ResolveError::unavailable(Capability::DoiLookup, err))?;

        let anchor = select_anchor(&run.candidates, &run.validation).or(single_exact);
        if let Some(anchor) = anchor {
            let remaining = std::mem::take(&mut run.unresolved);
            let second = self
                .matcher
                .pass_two(&query.id, &query_name, &anchor, remaining);
            run.unresolved = second.unresolved;

            if !second.candidates.is_empty() {
                run.candidates.extend(second.candidates);
                run.validation = self
                    .validator
                    .validate(query, &run.candidates, &history, &mut memo)
                    .await
                    .map_err(|err| ResolveError::unavailable(Capability::DoiLookup, err))?;
            }
        }

        let confirmed = self.confirm(query, run);
        if confirmed.is_empty() {
            run.advance(ResearcherState::Unresolved(
                UnresolvedReason::NoConfirmedProfile,
            ))?;
            return Ok(run.empty_result());
        }
        run.advance(ResearcherState::Validated)?;

        if has_institution_conflict(&confirmed, &run.validation) {
            tracing::info!(
                researcher = %query.id,
                profiles = confirmed.len(),
                "Confirmed profiles disagree on institution, flagged for review"
            );
            run.advance(ResearcherState::Ambiguous)?;
            let mut result = run.empty_result();
            result.profile_ids = confirmed
                .iter()
                .map(|c| c.profile_id().to_string())
                .collect();
            return Ok(result);
        }

        let mut merged = self.merger.merge(query, &confirmed).await;
        run.advance(merged.state.clone())?;

        let mut rejected = run.rejected.clone();
        rejected.append(&mut merged.rejected);
        merged.rejected = rejected;
        Ok(merged)
    }

    /// Candidates with evidence, plus Tier 1 candidates when nobody has
    /// evidence. Tier 1 candidates contradicted by others' evidence are
    /// recorded as rejected.
    fn confirm(&self, query: &ResearcherQuery, run: &mut ResearcherRun) -> Vec<CandidateProfile> {
        let any_evidence = !run.validation.evidence.is_empty();
        let mut confirmed = Vec::new();

        for candidate in &run.candidates {
            if run.validation.has_evidence_for(candidate.profile_id()) {
                confirmed.push(candidate.clone());
            } else if candidate.tier() == Tier::One {
                if any_evidence {
                    tracing::info!(
                        researcher = %query.id,
                        profile = candidate.profile_id(),
                        "Exact-name profile contradicted by validation"
                    );
                    run.rejected.push(ProfileRejection {
                        profile_id: candidate.profile_id().to_string(),
                        display_name: candidate.display_name().to_string(),
                        reason: RejectionReason::ContradictedByValidation,
                    });
                } else {
                    confirmed.push(candidate.clone());
                }
            }
        }
        confirmed
    }
}

/// Evidence-backed candidate with the most evidence; ties go to the
/// stronger tier, then the smaller profile id
fn select_anchor(
    candidates: &[CandidateProfile],
    validation: &ValidationReport,
) -> Option<CandidateProfile> {
    let counts = validation.evidence_counts();
    candidates
        .iter()
        .filter_map(|c| counts.get(c.profile_id()).map(|n| (c, *n)))
        .min_by(|(a, a_count), (b, b_count)| {
            b_count
                .cmp(a_count)
                .then(a.tier().cmp(&b.tier()))
                .then_with(|| a.profile_id().cmp(b.profile_id()))
        })
        .map(|(c, _)| c.clone())
}

/// Two confirmed profiles sit at disjoint, known institutions and the
/// validator does not back both of them
fn has_institution_conflict(confirmed: &[CandidateProfile], validation: &ValidationReport) -> bool {
    confirmed.iter().enumerate().any(|(i, a)| {
        confirmed[i + 1..].iter().any(|b| {
            !a.institution_ids().is_empty()
                && !b.institution_ids().is_empty()
                && a.institution_ids().is_disjoint(b.institution_ids())
                && !(validation.has_evidence_for(a.profile_id())
                    && validation.has_evidence_for(b.profile_id()))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Doi, RawProfile, ValidationEvidence};

    fn candidate(id: &str, tier: Tier, institution: &str) -> CandidateProfile {
        CandidateProfile::new(
            RawProfile::new(id, "Ana Ruiz").with_institution(institution),
            tier,
            1.0,
        )
    }

    fn report(profiles: &[&str]) -> ValidationReport {
        ValidationReport {
            evidence: profiles
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let doi = Doi::parse(&format!("10.1/{}", i)).unwrap();
                    ValidationEvidence::observed("R1", *p, doi, 0)
                })
                .collect(),
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_anchor_prefers_most_evidence_then_tier() {
        let candidates = vec![
            candidate("A1", Tier::One, "I1"),
            candidate("A2", Tier::Two, "I1"),
            candidate("A3", Tier::Two, "I1"),
        ];
        let anchor = select_anchor(&candidates, &report(&["A2", "A2", "A1"])).unwrap();
        assert_eq!(anchor.profile_id(), "A2");

        let tie = select_anchor(&candidates, &report(&["A3", "A1"])).unwrap();
        assert_eq!(tie.profile_id(), "A1");

        assert!(select_anchor(&candidates, &report(&[])).is_none());
    }

    #[test]
    fn test_conflict_needs_disjoint_known_institutions() {
        let a = candidate("A1", Tier::One, "I1");
        let b = candidate("A2", Tier::One, "I2");
        let c = candidate("A3", Tier::One, "I1");

        assert!(has_institution_conflict(&[a.clone(), b.clone()], &report(&[])));
        assert!(has_institution_conflict(&[a.clone(), b.clone()], &report(&["A1"])));
        assert!(!has_institution_conflict(&[a.clone(), b], &report(&["A1", "A2"])));
        assert!(!has_institution_conflict(&[a, c], &report(&[])));

        let unknown = CandidateProfile::new(RawProfile::new("A4", "Ana Ruiz"), Tier::One, 1.0);
        assert!(!has_institution_conflict(
            &[candidate("A1", Tier::One, "I1"), unknown],
            &report(&[])
        ));
    }

    #[test]
    fn test_summary_counts_terminal_states() {
        let make = |state: ResearcherState| ResearcherReport {
            researcher_id: "R".into(),
            candidates: Vec::new(),
            unresolved: Vec::new(),
            evidence: Vec::new(),
            skipped: Vec::new(),
            result: MergedResult::empty("R", state),
        };
        let reports = vec![
            make(ResearcherState::Merged),
            make(ResearcherState::NoMatch),
            make(ResearcherState::Ambiguous),
            make(ResearcherState::Unresolved(UnresolvedReason::SourceUnavailable {
                capability: Capability::ProfileSearch,
                message: "Rate limited".into(),
            })),
        ];
        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.merged, 1);
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.source_unavailable, 1);
    }
}
