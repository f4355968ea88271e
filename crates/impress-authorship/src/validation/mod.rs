//! Cross-source positional validation
//!
//! For each publication in the researcher's history the researcher is
//! located in the author list, then the canonical record of the same DOI
//! is read at the same position. A candidate profile id found there is
//! an identity-confirming observation.
//!
//! Publications that cannot be checked are skipped with a reason; none
//! of them stop the run.

mod memo;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ValidationConfig;
use crate::domain::{
    AuthorEntry, CandidateProfile, Doi, ProfileId, PublicationRecord, ResearcherQuery,
    ValidationEvidence,
};
use crate::error::SourceError;
use crate::normalization::{normalize, BagOfWords, NameSimilarity, NormalizedName, PersonName};

pub use memo::DoiMemo;

/// Why a publication produced no evidence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The history record carries no usable DOI
    MissingDoi,
    /// The history record has no authors
    EmptyAuthorList,
    /// No author in the history record matches the researcher
    ResearcherNotListed,
    /// The canonical source has no record for the DOI
    DoiNotFound,
    /// The canonical author list is shorter than the researcher's position
    PositionOutOfRange { position: usize, author_count: usize },
    /// The canonical author at the position carries no profile id
    AuthorNotLinked { position: usize },
    /// The canonical author at the position is not one of the candidates
    NotACandidate { position: usize, profile_id: ProfileId },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedPublication {
    pub doi: Option<Doi>,
    pub reason: SkipReason,
}

/// Evidence and skipped publications of one validation run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Sorted by DOI, then position, then profile id
    pub evidence: Vec<ValidationEvidence>,
    pub skipped: Vec<SkippedPublication>,
}

impl ValidationReport {
    /// Evidence count per profile id
    pub fn evidence_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for evidence in &self.evidence {
            *counts.entry(evidence.profile_id()).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_evidence_for(&self, profile_id: &str) -> bool {
        self.evidence.iter().any(|e| e.profile_id() == profile_id)
    }

    /// Evidence carrying the first-appearance flag, one per profile
    pub fn first_appearances(&self) -> impl Iterator<Item = &ValidationEvidence> {
        self.evidence.iter().filter(|e| e.is_first_appearance())
    }
}

pub struct PositionalValidator {
    similarity: Arc<dyn NameSimilarity>,
    fuzzy_threshold: f64,
}

impl PositionalValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            similarity: Arc::new(BagOfWords::default()),
            fuzzy_threshold: config.fuzzy_author_threshold,
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn NameSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Validate `candidates` against the researcher's publication history.
    ///
    /// Only a lookup that keeps failing after retries is an error; every
    /// other problem skips the single publication.
    pub async fn validate(
        &self,
        query: &ResearcherQuery,
        candidates: &[CandidateProfile],
        publications: &[PublicationRecord],
        lookup: &mut DoiMemo,
    ) -> Result<ValidationReport, SourceError> {
        let query_name = query.normalized_name();
        let candidate_ids: HashSet<&str> = candidates.iter().map(|c| c.profile_id()).collect();
        let mut report = ValidationReport::default();

        // Ascending DOI; publications without one go last
        let mut ordered: Vec<&PublicationRecord> = publications.iter().collect();
        ordered.sort_by(|a, b| match (&a.doi, &b.doi) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        for publication in ordered {
            let Some(doi) = publication.doi.as_ref() else {
                skip(&mut report, query, None, SkipReason::MissingDoi);
                continue;
            };
            if publication.authors.is_empty() {
                skip(&mut report, query, Some(doi), SkipReason::EmptyAuthorList);
                continue;
            }
            let Some(position) = self.locate(&query_name, &publication.authors) else {
                skip(&mut report, query, Some(doi), SkipReason::ResearcherNotListed);
                continue;
            };

            let Some(canonical) = lookup.get(doi).await? else {
                skip(&mut report, query, Some(doi), SkipReason::DoiNotFound);
                continue;
            };

            let outcome = match canonical.author_at(position) {
                None => Err(SkipReason::PositionOutOfRange {
                    position,
                    author_count: canonical.authors.len(),
                }),
                Some(AuthorEntry {
                    profile_id: None, ..
                }) => Err(SkipReason::AuthorNotLinked { position }),
                Some(AuthorEntry {
                    profile_id: Some(id),
                    ..
                }) if !candidate_ids.contains(id.as_str()) => Err(SkipReason::NotACandidate {
                    position,
                    profile_id: id.clone(),
                }),
                Some(AuthorEntry {
                    profile_id: Some(id),
                    ..
                }) => Ok(id.clone()),
            };

            match outcome {
                Ok(profile_id) => report.evidence.push(ValidationEvidence::observed(
                    query.id.clone(),
                    profile_id,
                    doi.clone(),
                    position,
                )),
                Err(reason) => skip(&mut report, query, Some(doi), reason),
            }
        }

        flag_first_appearances(&mut report.evidence);
        tracing::debug!(
            researcher = %query.id,
            evidence = report.evidence.len(),
            skipped = report.skipped.len(),
            "Positional validation finished"
        );
        Ok(report)
    }

    /// Position of the researcher in an author list.
    ///
    /// Exact token equality (any word order) wins. Otherwise the best
    /// fuzzy score at or above the threshold; equal scores prefer an
    /// author carrying the paternal surname, then the higher plain Jaccard
    /// overlap, then the earliest position.
    pub fn locate(&self, query_name: &NormalizedName, authors: &[AuthorEntry]) -> Option<usize> {
        let names: Vec<NormalizedName> = authors.iter().map(|a| normalize(&a.name)).collect();

        if let Some(exact) = names.iter().position(|n| n.same_tokens_unordered(query_name)) {
            return Some(exact);
        }

        let paternal = PersonName::split(query_name.as_str()).paternal;
        let strict = BagOfWords::strict();

        let mut best: Option<(usize, (f64, bool, f64))> = None;
        for (index, name) in names.iter().enumerate() {
            let score = self.similarity.score(query_name, name);
            if score < self.fuzzy_threshold {
                continue;
            }
            let key = (
                score,
                paternal.as_deref().map_or(false, |surname| name.contains(surname)),
                strict.score(query_name, name),
            );
            if best.map_or(true, |(_, top)| key > top) {
                best = Some((index, key));
            }
        }
        best.map(|(index, _)| index)
    }
}

fn skip(
    report: &mut ValidationReport,
    query: &ResearcherQuery,
    doi: Option<&Doi>,
    reason: SkipReason,
) {
    tracing::debug!(
        researcher = %query.id,
        doi = doi.map(Doi::as_str).unwrap_or("-"),
        reason = ?reason,
        "Publication skipped during validation"
    );
    report.skipped.push(SkippedPublication {
        doi: doi.cloned(),
        reason,
    });
}

/// Sort evidence deterministically and flag the first entry per profile
fn flag_first_appearances(evidence: &mut [ValidationEvidence]) {
    evidence.sort_by(|a, b| {
        a.doi()
            .cmp(b.doi())
            .then(a.position().cmp(&b.position()))
            .then_with(|| a.profile_id().cmp(b.profile_id()))
    });

    let mut seen = HashSet::new();
    for item in evidence.iter_mut() {
        if seen.insert(item.profile_id().to_string()) {
            item.mark_first_appearance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawProfile, Tier};

    fn doi(s: &str) -> Doi {
        Doi::parse(s).unwrap()
    }

    fn evidence(profile: &str, d: &str, position: usize) -> ValidationEvidence {
        ValidationEvidence::observed("R1", profile, doi(d), position)
    }

    #[test]
    fn test_first_appearance_once_per_profile() {
        let mut items = vec![
            evidence("A", "10.1/z", 0),
            evidence("B", "10.1/a", 2),
            evidence("A", "10.1/b", 1),
            evidence("A", "10.1/b", 1),
        ];
        flag_first_appearances(&mut items);

        let flagged: Vec<(&str, &str)> = items
            .iter()
            .filter(|e| e.is_first_appearance())
            .map(|e| (e.profile_id(), e.doi().as_str()))
            .collect();
        assert_eq!(flagged, vec![("B", "10.1/a"), ("A", "10.1/b")]);
    }

    #[test]
    fn test_locate_prefers_exact_match() {
        let validator = PositionalValidator::new(&ValidationConfig::default());
        let authors = vec![
            AuthorEntry::new("García J."),
            AuthorEntry::new("Pérez M."),
            AuthorEntry::new("Juan García"),
        ];
        assert_eq!(validator.locate(&normalize("Juan García"), &authors), Some(2));
    }

    #[test]
    fn test_locate_falls_back_to_fuzzy() {
        let validator = PositionalValidator::new(&ValidationConfig::default());
        let authors = vec![AuthorEntry::new("Pérez M."), AuthorEntry::new("García J.")];
        assert_eq!(validator.locate(&normalize("Juan García"), &authors), Some(1));
        assert_eq!(validator.locate(&normalize("Luis Ortega"), &authors), None);
    }

    #[test]
    fn test_locate_breaks_fuzzy_tie_on_paternal_surname() {
        let validator = PositionalValidator::new(&ValidationConfig::default());
        // Both initialled entries pair fully with the query
        let authors = vec![AuthorEntry::new("Pérez J."), AuthorEntry::new("García J.")];
        let query = normalize("Juan García Pérez");
        assert_eq!(validator.locate(&query, &authors), Some(1));

        let reversed = vec![AuthorEntry::new("García J."), AuthorEntry::new("Pérez J.")];
        assert_eq!(validator.locate(&query, &reversed), Some(0));
    }

    #[test]
    fn test_locate_identical_fuzzy_entries_keep_earliest() {
        let validator = PositionalValidator::new(&ValidationConfig::default());
        let authors = vec![AuthorEntry::new("Ruiz A."), AuthorEntry::new("Ruiz A.")];
        assert_eq!(validator.locate(&normalize("Ana Ruiz López"), &authors), Some(0));
    }

    #[test]
    fn test_skip_reason_serialization() {
        let json = serde_json::to_string(&SkipReason::PositionOutOfRange {
            position: 4,
            author_count: 2,
        })
        .unwrap();
        assert!(json.contains("position_out_of_range"));
    }

    #[test]
    fn test_report_counts() {
        let mut report = ValidationReport {
            evidence: vec![evidence("A", "10.1/a", 0), evidence("A", "10.1/b", 0)],
            skipped: Vec::new(),
        };
        flag_first_appearances(&mut report.evidence);
        assert_eq!(report.evidence_counts().get("A"), Some(&2));
        assert!(report.has_evidence_for("A"));
        assert!(!report.has_evidence_for("B"));
        assert_eq!(report.first_appearances().count(), 1);
    }

    struct FixedLookup(Vec<PublicationRecord>);

    #[async_trait::async_trait]
    impl crate::sources::DoiLookup for FixedLookup {
        async fn lookup_by_doi(&self, doi: &Doi) -> Result<Option<PublicationRecord>, SourceError> {
            Ok(self.0.iter().find(|r| r.doi.as_ref() == Some(doi)).cloned())
        }
    }

    fn record(d: &str, authors: &[(&str, Option<&str>)]) -> PublicationRecord {
        let authors = authors
            .iter()
            .map(|(name, id)| match id {
                Some(id) => AuthorEntry::new(*name).with_profile_id(*id),
                None => AuthorEntry::new(*name),
            })
            .collect();
        PublicationRecord::new(Some(doi(d)), "test").with_authors(authors)
    }

    #[tokio::test]
    async fn test_validate_links_position_and_skips_failures() {
        let query = ResearcherQuery::new("R1", "Juan García");
        let candidates = vec![CandidateProfile::new(
            RawProfile::new("A1", "Juan García"),
            Tier::One,
            1.0,
        )];
        let history = vec![
            record("10.1/ok", &[("Pérez M.", None), ("García J.", None)]),
            record("10.1/short", &[("Ruiz A.", None), ("Pérez M.", None), ("García J.", None)]),
            record("10.1/missing", &[("García J.", None)]),
            PublicationRecord::new(None, "test").with_authors(vec![AuthorEntry::new("García J.")]),
        ];
        let canonical = vec![
            record("10.1/ok", &[("M. Pérez", Some("A5")), ("J. García", Some("A1"))]),
            record("10.1/short", &[("A. Ruiz", Some("A7"))]),
        ];
        let mut memo = DoiMemo::new(
            Arc::new(FixedLookup(canonical)),
            crate::retry::RetryPolicy::no_retry(),
        );

        let validator = PositionalValidator::new(&ValidationConfig::default());
        let report = validator
            .validate(&query, &candidates, &history, &mut memo)
            .await
            .unwrap();

        assert_eq!(report.evidence.len(), 1);
        assert_eq!(report.evidence[0].profile_id(), "A1");
        assert_eq!(report.evidence[0].position(), 1);
        assert!(report.evidence[0].is_first_appearance());

        let reasons: Vec<&SkipReason> = report.skipped.iter().map(|s| &s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                &SkipReason::DoiNotFound,
                &SkipReason::PositionOutOfRange {
                    position: 2,
                    author_count: 1
                },
                &SkipReason::MissingDoi,
            ]
        );
    }
}
