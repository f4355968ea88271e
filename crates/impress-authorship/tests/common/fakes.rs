//! In-memory capability fakes

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use impress_authorship::sources::{
    DoiLookup, InstitutionDirectory, PageToken, ProfileSearch, PublicationHistory, WorksPage,
    WorksSource,
};
use impress_authorship::{Doi, PublicationRecord, RawProfile, ResearcherQuery, SourceError, Sources};

/// Every capability backed by maps, with call counters and failure switches
#[derive(Default)]
pub struct InMemorySources {
    /// Search results keyed by the search name the pipeline sends
    profiles: HashMap<String, Vec<RawProfile>>,
    canonical: HashMap<Doi, PublicationRecord>,
    /// Works pages per profile id
    works: HashMap<String, Vec<Vec<PublicationRecord>>>,
    /// Publication history per researcher id
    history: HashMap<String, Vec<PublicationRecord>>,
    institutions: HashMap<String, String>,
    rate_limited_searches: HashSet<String>,
    failing_works: HashSet<String>,
    institution_outage: bool,

    pub search_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub works_calls: AtomicUsize,
    pub institution_calls: AtomicUsize,
}

impl InMemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(mut self, search_name: &str, profiles: Vec<RawProfile>) -> Self {
        self.profiles.insert(search_name.to_string(), profiles);
        self
    }

    pub fn with_canonical(mut self, record: PublicationRecord) -> Self {
        if let Some(doi) = record.doi.clone() {
            self.canonical.insert(doi, record);
        }
        self
    }

    pub fn with_works(mut self, profile_id: &str, pages: Vec<Vec<PublicationRecord>>) -> Self {
        self.works.insert(profile_id.to_string(), pages);
        self
    }

    pub fn with_history(mut self, researcher_id: &str, records: Vec<PublicationRecord>) -> Self {
        self.history.insert(researcher_id.to_string(), records);
        self
    }

    pub fn with_institution(mut self, name: &str, id: &str) -> Self {
        self.institutions.insert(name.to_string(), id.to_string());
        self
    }

    /// Searches for this name always answer "rate limited"
    pub fn rate_limit_search(mut self, search_name: &str) -> Self {
        self.rate_limited_searches.insert(search_name.to_string());
        self
    }

    /// Every works page of this profile fails with a transient error
    pub fn fail_works(mut self, profile_id: &str) -> Self {
        self.failing_works.insert(profile_id.to_string());
        self
    }

    pub fn institution_outage(mut self) -> Self {
        self.institution_outage = true;
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Wrap one fake as every capability of a pipeline
pub fn sources(fake: Arc<InMemorySources>) -> Sources {
    Sources {
        profiles: fake.clone(),
        lookup: fake.clone(),
        works: fake.clone(),
        history: fake.clone(),
        institutions: fake,
    }
}

#[async_trait]
impl ProfileSearch for InMemorySources {
    async fn search_profiles(
        &self,
        name: &str,
        _institution: Option<&str>,
        _country: Option<&str>,
    ) -> Result<Vec<RawProfile>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited_searches.contains(name) {
            return Err(SourceError::RateLimited);
        }
        Ok(self.profiles.get(name).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DoiLookup for InMemorySources {
    async fn lookup_by_doi(&self, doi: &Doi) -> Result<Option<PublicationRecord>, SourceError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.canonical.get(doi).cloned())
    }
}

#[async_trait]
impl WorksSource for InMemorySources {
    async fn fetch_works(
        &self,
        profile_id: &str,
        page: Option<&PageToken>,
    ) -> Result<WorksPage, SourceError> {
        self.works_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_works.contains(profile_id) {
            return Err(SourceError::transient("connection reset by peer"));
        }

        let index: usize = match page {
            Some(token) => token
                .0
                .parse()
                .map_err(|_| SourceError::InvalidQuery(format!("bad cursor {}", token.0)))?,
            None => 0,
        };
        let Some(pages) = self.works.get(profile_id) else {
            return Ok(WorksPage::default());
        };
        let records = pages.get(index).cloned().unwrap_or_default();
        let next_page = (index + 1 < pages.len()).then(|| PageToken::new((index + 1).to_string()));
        Ok(WorksPage { records, next_page })
    }
}

#[async_trait]
impl PublicationHistory for InMemorySources {
    async fn publications(
        &self,
        query: &ResearcherQuery,
    ) -> Result<Vec<PublicationRecord>, SourceError> {
        Ok(self.history.get(&query.id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl InstitutionDirectory for InMemorySources {
    async fn resolve_institution(&self, name: &str) -> Result<Option<String>, SourceError> {
        self.institution_calls.fetch_add(1, Ordering::SeqCst);
        if self.institution_outage {
            return Err(SourceError::transient("directory unavailable"));
        }
        Ok(self.institutions.get(name).cloned())
    }
}
