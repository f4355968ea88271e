//! Domain records flowing through the resolution pipeline
//!
//! Queries come in, candidate profiles and validation evidence are
//! produced along the way, and a merged result per researcher comes out.

mod evidence;
mod outcome;
mod profile;
mod publication;
mod researcher;

pub use evidence::ValidationEvidence;
pub use outcome::{
    MergedResult, ProfileFetchFailure, ProfileRejection, RejectionReason, ResearcherState,
    UnresolvedReason, WorkCounts,
};
pub use profile::{CandidateProfile, RawProfile, Tier, UnresolvedProfile};
pub use publication::{AuthorEntry, Doi, InvalidDoi, PublicationRecord};
pub use researcher::ResearcherQuery;

/// Identifier of an author profile in the name-searchable source
pub type ProfileId = String;

/// Identifier of an institution in the name-searchable source
pub type InstitutionId = String;
