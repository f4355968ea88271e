//! Capabilities consumed from external sources
//!
//! Each trait is one capability with one record shape; transports
//! (HTTP clients, database queries, fixtures) live behind them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Doi, InstitutionId, PublicationRecord, RawProfile, ResearcherQuery};
use crate::error::SourceError;

/// Name-searchable author profiles
#[async_trait]
pub trait ProfileSearch: Send + Sync {
    async fn search_profiles(
        &self,
        name: &str,
        institution: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<RawProfile>, SourceError>;
}

/// Canonical publication records keyed by DOI, authors in order
#[async_trait]
pub trait DoiLookup: Send + Sync {
    async fn lookup_by_doi(&self, doi: &Doi) -> Result<Option<PublicationRecord>, SourceError>;
}

/// Opaque cursor for the next page of a works listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken(pub String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        PageToken(token.into())
    }
}

/// One page of a profile's works
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorksPage {
    pub records: Vec<PublicationRecord>,
    pub next_page: Option<PageToken>,
}

/// Paginated works of an author profile
#[async_trait]
pub trait WorksSource: Send + Sync {
    /// Fetch one page; `page` is `None` for the first page
    async fn fetch_works(
        &self,
        profile_id: &str,
        page: Option<&PageToken>,
    ) -> Result<WorksPage, SourceError>;
}

/// The researcher's own publications in the positional source,
/// with author order as that source records it
#[async_trait]
pub trait PublicationHistory: Send + Sync {
    async fn publications(
        &self,
        query: &ResearcherQuery,
    ) -> Result<Vec<PublicationRecord>, SourceError>;
}

/// Institution name to id lookup in the name-searchable source
#[async_trait]
pub trait InstitutionDirectory: Send + Sync {
    /// `Ok(None)` when the directory has no match for the name
    async fn resolve_institution(&self, name: &str) -> Result<Option<InstitutionId>, SourceError>;
}

/// Result of converting a batch of wire records at the boundary
#[derive(Clone, Debug, PartialEq)]
pub struct Converted<T> {
    pub items: Vec<T>,
    /// Wire records that could not be converted at all
    pub dropped: usize,
}

impl<T> Default for Converted<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            dropped: 0,
        }
    }
}
