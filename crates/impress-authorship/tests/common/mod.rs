//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use impress_authorship::{AuthorEntry, Doi, PublicationRecord, ResolverConfig};

/// Configuration with instant retries, so exhaustion tests run fast
pub fn fast_config() -> ResolverConfig {
    let mut config = ResolverConfig::default();
    config.retry.max_retries = 2;
    config.retry.initial_backoff_ms = 0;
    config.retry.max_backoff_ms = 0;
    config.retry.jitter_ms = 0;
    config.batch.max_concurrency = 4;
    config
}

pub fn doi(raw: &str) -> Doi {
    Doi::parse(raw).unwrap_or_else(|| panic!("invalid test DOI: {}", raw))
}

/// A record with ordered authors; `Some(id)` links the author to a profile
pub fn record(raw_doi: &str, authors: &[(&str, Option<&str>)]) -> PublicationRecord {
    let authors = authors
        .iter()
        .map(|(name, id)| {
            let entry = AuthorEntry::new(*name);
            match id {
                Some(id) => entry.with_profile_id(*id),
                None => entry,
            }
        })
        .collect();
    PublicationRecord::new(Some(doi(raw_doi)), "test").with_authors(authors)
}

/// A works-listing entry with a citation count
pub fn work(raw_doi: &str, citations: u64) -> PublicationRecord {
    PublicationRecord::new(Doi::parse(raw_doi), "openalex").with_citations(citations)
}
