//! Researcher-level state and the merged result

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{Doi, ProfileId, PublicationRecord};
use crate::error::{Capability, ResolveError};

/// Why a researcher ended without a merged profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Candidates exist but none was confirmed
    NoConfirmedProfile,
    /// Every confirmed profile failed the surname guard
    AllProfilesRejected,
    /// A capability kept failing after all retries
    SourceUnavailable {
        capability: Capability,
        message: String,
    },
    /// The pipeline attempted a transition the state machine forbids
    Internal { message: String },
}

/// Researcher-level state machine.
///
/// ```text
/// Unsearched -> CandidatesFound -> NoMatch
///                               -> Validated -> Ambiguous
///                                            -> Merged
/// (any non-terminal) -> Unresolved
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResearcherState {
    Unsearched,
    CandidatesFound,
    Validated,
    NoMatch,
    Ambiguous,
    Merged,
    Unresolved(UnresolvedReason),
}

impl ResearcherState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResearcherState::NoMatch
                | ResearcherState::Ambiguous
                | ResearcherState::Merged
                | ResearcherState::Unresolved(_)
        )
    }

    pub fn can_transition_to(&self, next: &ResearcherState) -> bool {
        use ResearcherState::*;
        match (self, next) {
            (_, Unresolved(_)) => !self.is_terminal(),
            (Unsearched, CandidatesFound) => true,
            (CandidatesFound, NoMatch) | (CandidatesFound, Validated) => true,
            (Validated, Ambiguous) | (Validated, Merged) => true,
            _ => false,
        }
    }

    /// Move to `next`, refusing transitions the state machine does not allow
    pub fn transition(self, next: ResearcherState) -> Result<ResearcherState, ResolveError> {
        if self.can_transition_to(&next) {
            Ok(next)
        } else {
            Err(ResolveError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short label for logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            ResearcherState::Unsearched => "unsearched",
            ResearcherState::CandidatesFound => "candidates_found",
            ResearcherState::Validated => "validated",
            ResearcherState::NoMatch => "no_match",
            ResearcherState::Ambiguous => "ambiguous",
            ResearcherState::Merged => "merged",
            ResearcherState::Unresolved(_) => "unresolved",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No surname token of the researcher appears in the profile's names
    NoSurnameOverlap,
    /// Exact-name candidate without evidence while other candidates have it
    ContradictedByValidation,
}

/// A confirmed or candidate profile excluded from the merge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileRejection {
    pub profile_id: ProfileId,
    pub display_name: String,
    pub reason: RejectionReason,
}

/// A profile whose works could not be fetched completely
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileFetchFailure {
    pub profile_id: ProfileId,
    pub pages_fetched: usize,
    pub message: String,
}

/// Counts computed after DOI dedup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCounts {
    /// Distinct DOIs in the merged publication set
    pub works: usize,
    /// Sum of cited-by counts over the distinct works
    pub citations: u64,
    /// Records collapsed into an already-seen DOI
    pub duplicates: usize,
    /// Records skipped for lacking a DOI
    pub malformed: usize,
}

/// Final per-researcher output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub researcher_id: String,
    pub state: ResearcherState,
    /// Merged profiles; for `Ambiguous`, the conflicting confirmed profiles
    pub profile_ids: BTreeSet<ProfileId>,
    pub publications: BTreeMap<Doi, PublicationRecord>,
    pub counts: WorkCounts,
    pub rejected: Vec<ProfileRejection>,
    pub failed: Vec<ProfileFetchFailure>,
}

impl MergedResult {
    /// A result with nothing merged, tagged with a terminal state
    pub fn empty(researcher_id: impl Into<String>, state: ResearcherState) -> Self {
        Self {
            researcher_id: researcher_id.into(),
            state,
            profile_ids: BTreeSet::new(),
            publications: BTreeMap::new(),
            counts: WorkCounts::default(),
            rejected: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn publication(&self, doi: &Doi) -> Option<&PublicationRecord> {
        self.publications.get(doi)
    }
}
