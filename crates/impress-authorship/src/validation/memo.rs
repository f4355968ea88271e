//! Per-researcher memo over DOI lookups

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Doi, PublicationRecord};
use crate::error::SourceError;
use crate::retry::RetryPolicy;
use crate::sources::DoiLookup;

/// Caches canonical records by DOI for one researcher, so a second
/// validation round issues no new requests. `NotFound` from the source
/// is stored as an absent record.
pub struct DoiMemo {
    lookup: Arc<dyn DoiLookup>,
    retry: RetryPolicy,
    records: HashMap<Doi, Option<PublicationRecord>>,
    requests: usize,
}

impl DoiMemo {
    pub fn new(lookup: Arc<dyn DoiLookup>, retry: RetryPolicy) -> Self {
        Self {
            lookup,
            retry,
            records: HashMap::new(),
            requests: 0,
        }
    }

    /// Canonical record for `doi`, fetched on first use
    pub async fn get(&mut self, doi: &Doi) -> Result<Option<&PublicationRecord>, SourceError> {
        if !self.records.contains_key(doi) {
            self.requests += 1;
            let lookup = &self.lookup;
            let fetched = match self
                .retry
                .run("lookup_by_doi", || lookup.lookup_by_doi(doi))
                .await
            {
                Ok(record) => record,
                Err(SourceError::NotFound) => None,
                Err(err) => return Err(err),
            };
            self.records.insert(doi.clone(), fetched);
        }
        Ok(self.records.get(doi).and_then(Option::as_ref))
    }

    /// Distinct DOIs requested from the source so far
    pub fn requests(&self) -> usize {
        self.requests
    }
}
