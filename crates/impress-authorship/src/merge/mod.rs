//! Merge of confirmed profiles into one result per researcher
//!
//! Each confirmed profile passes a surname guard, then its works are
//! drained page by page. Publications are unioned and deduplicated by
//! DOI (first seen wins), and counts are computed on the deduplicated
//! set only.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};

use crate::domain::{
    CandidateProfile, Doi, MergedResult, ProfileFetchFailure, ProfileRejection,
    PublicationRecord, RejectionReason, ResearcherQuery, ResearcherState, UnresolvedReason,
    WorkCounts,
};
use crate::error::{Capability, SourceError};
use crate::normalization::normalize;
use crate::retry::RetryPolicy;
use crate::sources::{PageToken, WorksPage, WorksSource};

/// Whether any surname token of the researcher appears among the
/// profile's normalized name tokens (display and alternative names).
///
/// Queries without any surname fall back to the full name's tokens.
pub fn passes_surname_guard(query: &ResearcherQuery, candidate: &CandidateProfile) -> bool {
    let mut surnames = query.surname_tokens();
    if surnames.is_empty() {
        surnames = query.normalized_name().bag_of_words().clone();
    }

    candidate.all_names().any(|name| {
        normalize(name)
            .bag_of_words()
            .iter()
            .any(|token| surnames.contains(token))
    })
}

/// Order profiles are merged in: strongest tier, then highest
/// confidence, then profile id
fn merge_order(a: &&CandidateProfile, b: &&CandidateProfile) -> std::cmp::Ordering {
    a.tier()
        .cmp(&b.tier())
        .then_with(|| b.confidence().total_cmp(&a.confidence()))
        .then_with(|| a.profile_id().cmp(b.profile_id()))
}

/// Cursor of one profile's works listing; lives only inside the page stream
enum Cursor {
    Start,
    Next(PageToken),
    Done,
}

pub struct ProfileMerger {
    works: Arc<dyn WorksSource>,
    retry: RetryPolicy,
    max_pages: usize,
}

impl ProfileMerger {
    pub fn new(works: Arc<dyn WorksSource>, retry: RetryPolicy, max_pages: usize) -> Self {
        Self {
            works,
            retry,
            max_pages,
        }
    }

    /// Lazy page sequence for one profile. Each page is retried on its
    /// own; the stream ends after the last page or the first failure.
    pub fn pages<'a>(
        &'a self,
        profile_id: &'a str,
    ) -> impl Stream<Item = Result<WorksPage, SourceError>> + Send + 'a {
        stream::unfold(Cursor::Start, move |cursor| async move {
            let token = match cursor {
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
                Cursor::Done => return None,
            };

            let fetched = self
                .retry
                .run("fetch_works", || self.works.fetch_works(profile_id, token.as_ref()))
                .await;

            match fetched {
                Ok(page) => {
                    let next = match &page.next_page {
                        Some(token) => Cursor::Next(token.clone()),
                        None => Cursor::Done,
                    };
                    Some((Ok(page), next))
                }
                Err(err) => Some((Err(err), Cursor::Done)),
            }
        })
    }

    /// Drain every page of a profile's works.
    ///
    /// On failure the pages fetched so far are discarded and the failure
    /// is returned for reporting.
    pub async fn fetch_all(
        &self,
        profile_id: &str,
    ) -> Result<Vec<PublicationRecord>, ProfileFetchFailure> {
        let mut records = Vec::new();
        let mut pages_fetched = 0;
        let mut pages = Box::pin(self.pages(profile_id));

        while let Some(page) = pages.next().await {
            match page {
                Ok(page) => {
                    pages_fetched += 1;
                    let more = page.next_page.is_some();
                    records.extend(page.records);
                    if more && pages_fetched >= self.max_pages {
                        tracing::warn!(
                            profile = profile_id,
                            pages = pages_fetched,
                            "Page limit reached, works listing truncated"
                        );
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        profile = profile_id,
                        pages = pages_fetched,
                        error = %err,
                        "Works fetch aborted for profile"
                    );
                    return Err(ProfileFetchFailure {
                        profile_id: profile_id.to_string(),
                        pages_fetched,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(records)
    }

    /// Merge the confirmed profiles of one researcher.
    ///
    /// The result is `Merged` when at least one profile passed the guard
    /// and had its works fetched. When every fetch failed it is
    /// `Unresolved(SourceUnavailable)`; when the guard rejected every
    /// profile it is `Unresolved(AllProfilesRejected)`.
    pub async fn merge(
        &self,
        query: &ResearcherQuery,
        confirmed: &[CandidateProfile],
    ) -> MergedResult {
        let mut ordered: Vec<&CandidateProfile> = confirmed.iter().collect();
        ordered.sort_by(merge_order);
        ordered.dedup_by(|a, b| a.profile_id() == b.profile_id());

        let mut accepted = BTreeSet::new();
        let mut rejected = Vec::new();
        let mut failed = Vec::new();
        let mut publications: BTreeMap<Doi, PublicationRecord> = BTreeMap::new();
        let mut counts = WorkCounts::default();

        for candidate in ordered {
            if !passes_surname_guard(query, candidate) {
                tracing::info!(
                    researcher = %query.id,
                    profile = candidate.profile_id(),
                    display_name = candidate.display_name(),
                    "Profile rejected: no surname overlap"
                );
                rejected.push(ProfileRejection {
                    profile_id: candidate.profile_id().to_string(),
                    display_name: candidate.display_name().to_string(),
                    reason: RejectionReason::NoSurnameOverlap,
                });
                continue;
            }

            let records = match self.fetch_all(candidate.profile_id()).await {
                Ok(records) => records,
                Err(failure) => {
                    failed.push(failure);
                    continue;
                }
            };
            accepted.insert(candidate.profile_id().to_string());

            for record in records {
                let Some(doi) = record.doi.clone() else {
                    counts.malformed += 1;
                    continue;
                };
                match publications.entry(doi) {
                    Entry::Vacant(slot) => {
                        slot.insert(record);
                    }
                    Entry::Occupied(_) => counts.duplicates += 1,
                }
            }
        }

        counts.works = publications.len();
        counts.citations = publications.values().map(|p| p.cited_by_count).sum();

        // Only profiles that passed the guard can end up in `failed`
        let state = if !accepted.is_empty() {
            ResearcherState::Merged
        } else if let Some(failure) = failed.last() {
            ResearcherState::Unresolved(UnresolvedReason::SourceUnavailable {
                capability: Capability::WorksFetch,
                message: failure.message.clone(),
            })
        } else {
            ResearcherState::Unresolved(UnresolvedReason::AllProfilesRejected)
        };
        tracing::debug!(
            researcher = %query.id,
            profiles = accepted.len(),
            works = counts.works,
            duplicates = counts.duplicates,
            "Profiles merged"
        );

        MergedResult {
            researcher_id: query.id.clone(),
            state,
            profile_ids: accepted,
            publications,
            counts,
            rejected,
            failed,
        }
    }
}
