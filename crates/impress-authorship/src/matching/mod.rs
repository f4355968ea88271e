//! Tiered candidate matching
//!
//! Matches searched author profiles against a researcher query in two
//! separate passes:
//!
//! - Pass 1 assigns Tier 1 (exact normalized name or alternative name)
//!   and Tier 2 (bag-of-words overlap plus a shared institution).
//! - Pass 2 only runs once a confirmed anchor profile exists. It assigns
//!   Tier 3 (weaker overlap plus a topic shared with the anchor) to the
//!   profiles Pass 1 left unmatched.
//!
//! Profiles that meet no tier are returned as unresolved, never dropped.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::config::MatchingConfig;
use crate::domain::{
    CandidateProfile, InstitutionId, RawProfile, ResearcherQuery, Tier, UnresolvedProfile,
};
use crate::normalization::{normalize, BagOfWords, NameSimilarity, NormalizedName};

/// Candidates and leftovers of one matching pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub candidates: Vec<CandidateProfile>,
    pub unresolved: Vec<UnresolvedProfile>,
}

impl MatchOutcome {
    /// The sole Tier 1 candidate, if exactly one exists
    pub fn single_exact(&self) -> Option<&CandidateProfile> {
        let mut exact = self.candidates.iter().filter(|c| c.tier() == Tier::One);
        match (exact.next(), exact.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub struct CandidateMatcher {
    similarity: Arc<dyn NameSimilarity>,
    config: MatchingConfig,
}

impl CandidateMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            similarity: Arc::new(BagOfWords::default()),
            config,
        }
    }

    /// Replace the name scorer
    pub fn with_similarity(mut self, similarity: Arc<dyn NameSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Run both passes.
    ///
    /// Pass 2 is anchored on `prior_confirmed` when given, otherwise on an
    /// unambiguous single Tier 1 hit from Pass 1. Without an anchor only
    /// Pass 1 results are returned.
    pub fn match_profiles(
        &self,
        query: &ResearcherQuery,
        institutions: &BTreeSet<InstitutionId>,
        profiles: &[RawProfile],
        prior_confirmed: Option<&CandidateProfile>,
    ) -> MatchOutcome {
        let query_name = query.normalized_name();
        let first = self.pass_one(&query.id, &query_name, institutions, profiles);

        let anchor = prior_confirmed.or_else(|| first.single_exact()).cloned();
        match anchor {
            Some(anchor) => {
                let second = self.pass_two(&query.id, &query_name, &anchor, first.unresolved);
                let mut candidates = first.candidates;
                candidates.extend(second.candidates);
                MatchOutcome {
                    candidates,
                    unresolved: second.unresolved,
                }
            }
            None => first,
        }
    }

    /// Pass 1: Tier 1 and Tier 2. Every Tier 1/2 hit is kept.
    pub fn pass_one(
        &self,
        researcher_id: &str,
        query_name: &NormalizedName,
        institutions: &BTreeSet<InstitutionId>,
        profiles: &[RawProfile],
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let mut seen = HashSet::new();

        for profile in profiles {
            if !seen.insert(profile.id.as_str()) {
                continue;
            }

            let names = normalized_names(profile);
            if is_exact(query_name, &names) {
                log_candidate(researcher_id, profile, Tier::One, 1.0);
                outcome
                    .candidates
                    .push(CandidateProfile::new(profile.clone(), Tier::One, 1.0));
                continue;
            }

            let score = self.best_score(query_name, &names);
            if score >= self.config.tier2_threshold
                && !profile.institution_ids.is_disjoint(institutions)
            {
                log_candidate(researcher_id, profile, Tier::Two, score);
                outcome
                    .candidates
                    .push(CandidateProfile::new(profile.clone(), Tier::Two, score));
            } else {
                outcome.unresolved.push(UnresolvedProfile {
                    profile: profile.clone(),
                    best_score: score,
                });
            }
        }

        for left in &outcome.unresolved {
            tracing::debug!(
                researcher = researcher_id,
                profile = %left.profile.id,
                score = left.best_score,
                "Profile unmatched after pass 1"
            );
        }
        outcome
    }

    /// Pass 2: Tier 3 over the profiles Pass 1 left unmatched
    pub fn pass_two(
        &self,
        researcher_id: &str,
        query_name: &NormalizedName,
        anchor: &CandidateProfile,
        remaining: Vec<UnresolvedProfile>,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        for left in remaining {
            let profile = left.profile;
            if profile.id == anchor.profile_id() {
                outcome.unresolved.push(UnresolvedProfile {
                    profile,
                    best_score: left.best_score,
                });
                continue;
            }

            let score = self.best_score(query_name, &normalized_names(&profile));
            if score >= self.config.tier3_threshold && !profile.topics.is_disjoint(anchor.topics())
            {
                log_candidate(researcher_id, &profile, Tier::Three, score);
                outcome
                    .candidates
                    .push(CandidateProfile::new(profile, Tier::Three, score));
            } else {
                tracing::debug!(
                    researcher = researcher_id,
                    profile = %profile.id,
                    score,
                    "Profile left for manual review"
                );
                outcome.unresolved.push(UnresolvedProfile {
                    profile,
                    best_score: score,
                });
            }
        }
        outcome
    }

    fn best_score(&self, query_name: &NormalizedName, names: &[NormalizedName]) -> f64 {
        names
            .iter()
            .map(|name| self.similarity.score(query_name, name))
            .fold(0.0, f64::max)
    }
}

fn normalized_names(profile: &RawProfile) -> Vec<NormalizedName> {
    profile
        .all_names()
        .map(normalize)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Ordered token equality with any of the profile's names
fn is_exact(query_name: &NormalizedName, names: &[NormalizedName]) -> bool {
    !query_name.is_empty() && names.iter().any(|name| name.tokens() == query_name.tokens())
}

fn log_candidate(researcher_id: &str, profile: &RawProfile, tier: Tier, confidence: f64) {
    tracing::info!(
        researcher = researcher_id,
        profile = %profile.id,
        display_name = %profile.display_name,
        tier = tier.number(),
        confidence,
        "Candidate matched"
    );
}
