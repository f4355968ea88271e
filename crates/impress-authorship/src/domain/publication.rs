//! Publication records and DOI normalization

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ProfileId;

lazy_static! {
    static ref DOI_PATTERN: Regex = Regex::new(r"^10\.\d+/\S+$").unwrap();
}

const DOI_PREFIXES: [&str; 5] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid DOI: {0}")]
pub struct InvalidDoi(pub String);

/// A normalized DOI, the sole merge key across sources.
///
/// Comparison is case-insensitive and ignores resolver prefixes,
/// surrounding slashes and trailing punctuation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi(String);

impl Doi {
    /// Normalize a raw DOI string, returning `None` if it is not a DOI
    pub fn parse(raw: &str) -> Option<Self> {
        let mut result = raw.trim().to_lowercase();

        for prefix in DOI_PREFIXES {
            if let Some(stripped) = result.strip_prefix(prefix) {
                result = stripped.trim_start().to_string();
                break;
            }
        }

        let trimmed = result
            .trim_end_matches(['.', ',', ';'])
            .trim_matches('/')
            .to_string();

        if DOI_PATTERN.is_match(&trimmed) {
            Some(Doi(trimmed))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Doi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Doi {
    type Error = InvalidDoi;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Doi::parse(&value).ok_or(InvalidDoi(value))
    }
}

impl From<Doi> for String {
    fn from(doi: Doi) -> Self {
        doi.0
    }
}

/// One entry of an ordered author list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub name: String,
    /// Author profile id, when the recording source assigns one
    pub profile_id: Option<ProfileId>,
}

impl AuthorEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_id: None,
        }
    }

    pub fn with_profile_id(mut self, id: impl Into<ProfileId>) -> Self {
        self.profile_id = Some(id.into());
        self
    }
}

/// A publication as recorded by one source, authors in source order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// `None` when the source record carried no usable DOI
    pub doi: Option<Doi>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub authors: Vec<AuthorEntry>,
    pub cited_by_count: u64,
    /// Source that produced this record (e.g. "openalex", "scopus")
    pub source: String,
}

impl PublicationRecord {
    pub fn new(doi: Option<Doi>, source: impl Into<String>) -> Self {
        Self {
            doi,
            title: None,
            year: None,
            authors: Vec::new(),
            cited_by_count: 0,
            source: source.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_authors(mut self, authors: Vec<AuthorEntry>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_citations(mut self, cited_by_count: u64) -> Self {
        self.cited_by_count = cited_by_count;
        self
    }

    /// Author entry at a 0-based position
    pub fn author_at(&self, position: usize) -> Option<&AuthorEntry> {
        self.authors.get(position)
    }
}
