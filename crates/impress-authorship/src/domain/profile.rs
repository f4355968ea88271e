//! Author profiles: raw search hits and tiered candidates

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{InstitutionId, ProfileId};

/// An author profile as returned by the name-searchable source,
/// already converted from the wire shape
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProfile {
    pub id: ProfileId,
    pub display_name: String,
    pub alternative_names: Vec<String>,
    pub institution_ids: BTreeSet<InstitutionId>,
    pub topics: BTreeSet<String>,
    pub orcid: Option<String>,
    pub works_count: Option<u64>,
    pub cited_by_count: Option<u64>,
}

impl RawProfile {
    pub fn new(id: impl Into<ProfileId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn with_alternative_name(mut self, name: impl Into<String>) -> Self {
        self.alternative_names.push(name.into());
        self
    }

    pub fn with_institution(mut self, id: impl Into<InstitutionId>) -> Self {
        self.institution_ids.insert(id.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.insert(topic.into());
        self
    }

    /// Display name followed by every alternative name
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.display_name.as_str())
            .chain(self.alternative_names.iter().map(String::as_str))
    }
}

/// Confidence class of a candidate match. `One` is the strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    /// Exact normalized name or alternative-name match
    One,
    /// Bag-of-words overlap plus shared institution
    Two,
    /// Weaker overlap plus topic shared with a confirmed profile
    Three,
}

impl Tier {
    pub fn number(self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.number()
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            other => Err(format!("tier must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tier {}", self.number())
    }
}

/// A source profile that satisfied one of the matching tiers.
///
/// Tier and confidence are fixed at construction; there are no setters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    profile: RawProfile,
    tier: Tier,
    confidence: f64,
}

impl CandidateProfile {
    /// Assign a tier to a profile. Confidence is clamped into [0, 1].
    pub fn new(profile: RawProfile, tier: Tier, confidence: f64) -> Self {
        Self {
            profile,
            tier,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.profile.id
    }

    pub fn display_name(&self) -> &str {
        &self.profile.display_name
    }

    pub fn alternative_names(&self) -> &[String] {
        &self.profile.alternative_names
    }

    pub fn institution_ids(&self) -> &BTreeSet<InstitutionId> {
        &self.profile.institution_ids
    }

    pub fn topics(&self) -> &BTreeSet<String> {
        &self.profile.topics
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn raw(&self) -> &RawProfile {
        &self.profile
    }

    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.profile.all_names()
    }
}

/// A searched profile that met no tier, kept for manual review
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedProfile {
    pub profile: RawProfile,
    /// Best name similarity seen against the query
    pub best_score: f64,
}
