//! impress-authorship: researcher identity resolution across bibliographic sources
//!
//! This library provides:
//! - Name normalization (diacritics, initials, hyphenated and two-part surnames)
//! - Tiered candidate matching of author profiles against a researcher query
//! - Positional validation of candidates through shared DOIs
//! - DOI-keyed merge of confirmed profiles' publication lists
//! - A bounded-concurrency batch pipeline with retry and an institution cache
//!
//! Transports are not part of this crate. Callers plug in implementations
//! of the capability traits in [`sources`]; the `openalex` and `scopus`
//! submodules convert raw API payloads into the records those traits
//! return.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod matching;
pub mod merge;
pub mod normalization;
pub mod pipeline;
pub mod retry;
pub mod sources;
pub mod validation;

// Re-export main types for convenience
pub use cache::InstitutionCache;
pub use config::{BatchConfig, MatchingConfig, ResolverConfig, RetryConfig, ValidationConfig};
pub use domain::{
    AuthorEntry, CandidateProfile, Doi, MergedResult, ProfileFetchFailure, ProfileRejection,
    PublicationRecord, RawProfile, RejectionReason, ResearcherQuery, ResearcherState, Tier,
    UnresolvedProfile, UnresolvedReason, ValidationEvidence, WorkCounts,
};
pub use error::{Capability, ConfigError, ResolveError, SourceError};
pub use matching::{CandidateMatcher, MatchOutcome};
pub use merge::{passes_surname_guard, ProfileMerger};
pub use normalization::{normalize, BagOfWords, NameSimilarity, NormalizedName, PersonName};
pub use pipeline::{BatchReport, BatchSummary, ResearcherReport, ResolutionPipeline, Sources};
pub use retry::RetryPolicy;
pub use validation::{
    DoiMemo, PositionalValidator, SkipReason, SkippedPublication, ValidationReport,
};
