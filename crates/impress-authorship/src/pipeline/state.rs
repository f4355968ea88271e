//! Per-researcher progress through the state machine

use serde::{Deserialize, Serialize};

use crate::domain::{
    CandidateProfile, MergedResult, ProfileRejection, ResearcherState, UnresolvedProfile,
    UnresolvedReason, ValidationEvidence,
};
use crate::error::ResolveError;
use crate::validation::{SkippedPublication, ValidationReport};

/// Everything the pipeline produced for one researcher
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResearcherReport {
    pub researcher_id: String,
    /// Tiered candidates, Pass 1 first, then Tier 3 additions
    pub candidates: Vec<CandidateProfile>,
    /// Searched profiles that met no tier, kept for manual review
    pub unresolved: Vec<UnresolvedProfile>,
    pub evidence: Vec<ValidationEvidence>,
    pub skipped: Vec<SkippedPublication>,
    pub result: MergedResult,
}

impl ResearcherReport {
    pub fn state(&self) -> &ResearcherState {
        &self.result.state
    }
}

/// Accumulates intermediate output while enforcing legal transitions
pub(crate) struct ResearcherRun {
    researcher_id: String,
    state: ResearcherState,
    pub(crate) candidates: Vec<CandidateProfile>,
    pub(crate) unresolved: Vec<UnresolvedProfile>,
    pub(crate) validation: ValidationReport,
    pub(crate) rejected: Vec<ProfileRejection>,
}

impl ResearcherRun {
    pub(crate) fn new(researcher_id: impl Into<String>) -> Self {
        Self {
            researcher_id: researcher_id.into(),
            state: ResearcherState::Unsearched,
            candidates: Vec::new(),
            unresolved: Vec::new(),
            validation: ValidationReport::default(),
            rejected: Vec::new(),
        }
    }

    pub(crate) fn state(&self) -> &ResearcherState {
        &self.state
    }

    pub(crate) fn advance(&mut self, next: ResearcherState) -> Result<(), ResolveError> {
        let current = std::mem::replace(&mut self.state, ResearcherState::Unsearched);
        match current.clone().transition(next) {
            Ok(next) => {
                tracing::debug!(
                    researcher = %self.researcher_id,
                    from = current.label(),
                    to = next.label(),
                    "State transition"
                );
                self.state = next;
                Ok(())
            }
            Err(err) => {
                self.state = current;
                Err(err)
            }
        }
    }

    /// Terminal result with nothing merged, in the current state
    pub(crate) fn empty_result(&self) -> MergedResult {
        let mut result = MergedResult::empty(self.researcher_id.clone(), self.state.clone());
        result.rejected = self.rejected.clone();
        result
    }

    /// Close the run on a pipeline error
    pub(crate) fn fail(&mut self, err: ResolveError) -> MergedResult {
        let reason = match err {
            ResolveError::Source { capability, source } => UnresolvedReason::SourceUnavailable {
                capability,
                message: source.to_string(),
            },
            other @ ResolveError::InvalidTransition { .. } => UnresolvedReason::Internal {
                message: other.to_string(),
            },
        };
        tracing::warn!(
            researcher = %self.researcher_id,
            state = self.state().label(),
            reason = ?reason,
            "Researcher unresolved"
        );

        let unresolved = ResearcherState::Unresolved(reason);
        if let Err(err) = self.advance(unresolved.clone()) {
            // A terminal state was already reached; the failure still wins
            tracing::error!(error = %err, "Could not mark researcher unresolved");
            self.state = unresolved;
        }
        self.empty_result()
    }

    pub(crate) fn into_report(self, result: MergedResult) -> ResearcherReport {
        ResearcherReport {
            researcher_id: self.researcher_id,
            candidates: self.candidates,
            unresolved: self.unresolved,
            evidence: self.validation.evidence,
            skipped: self.validation.skipped,
            result,
        }
    }
}
