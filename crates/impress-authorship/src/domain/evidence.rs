//! Positional validation evidence

use serde::{Deserialize, Serialize};

use super::{Doi, ProfileId};

/// One identity-confirming observation: the researcher sits at
/// `position` in the author list of `doi` in one source, and the
/// canonical record of the same DOI names `profile_id` at that position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvidence {
    researcher_id: String,
    profile_id: ProfileId,
    doi: Doi,
    position: usize,
    first_appearance: bool,
}

impl ValidationEvidence {
    pub(crate) fn observed(
        researcher_id: impl Into<String>,
        profile_id: impl Into<ProfileId>,
        doi: Doi,
        position: usize,
    ) -> Self {
        Self {
            researcher_id: researcher_id.into(),
            profile_id: profile_id.into(),
            doi,
            position,
            first_appearance: false,
        }
    }

    pub(crate) fn mark_first_appearance(&mut self) {
        self.first_appearance = true;
    }

    pub fn researcher_id(&self) -> &str {
        &self.researcher_id
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn doi(&self) -> &Doi {
        &self.doi
    }

    /// 0-based index in the author list
    pub fn position(&self) -> usize {
        self.position
    }

    /// True for exactly one evidence per (researcher, profile) pair
    pub fn is_first_appearance(&self) -> bool {
        self.first_appearance
    }
}
