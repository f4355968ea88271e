//! Researcher query input

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::normalization::{normalize, strip_parenthesised, NormalizedName, PersonName};

/// A researcher to resolve. Immutable input to the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearcherQuery {
    pub id: String,
    pub full_name: String,
    /// Given name(s); may be empty when only `full_name` is known
    #[serde(default)]
    pub first_name: String,
    /// Surname(s), paternal first; may be empty
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ResearcherQuery {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            first_name: String::new(),
            last_name: String::new(),
            institution: None,
            country: None,
        }
    }

    pub fn with_names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn normalized_name(&self) -> NormalizedName {
        normalize(&self.full_name)
    }

    /// Name sent to the profile search: first given name plus paternal surname
    pub fn search_name(&self) -> String {
        let first = strip_parenthesised(&self.first_name);
        let last = strip_parenthesised(&self.last_name);

        let (given, paternal) = if first.is_empty() || last.is_empty() {
            let cleaned = strip_parenthesised(&self.full_name);
            let words: Vec<&str> = cleaned.split_whitespace().collect();
            let split = PersonName::from_words(&words);
            (split.given.into_iter().next(), split.paternal)
        } else {
            (
                first.split_whitespace().next().map(str::to_string),
                last.split_whitespace().next().map(str::to_string),
            )
        };

        match (given, paternal) {
            (Some(g), Some(p)) => format!("{} {}", g, p),
            (Some(g), None) => g,
            (None, Some(p)) => p,
            (None, None) => self.full_name.trim().to_string(),
        }
    }

    /// Normalized surname tokens used by the merge guard
    pub fn surname_tokens(&self) -> BTreeSet<String> {
        if self.last_name.trim().is_empty() {
            PersonName::split(&self.full_name).surname_tokens()
        } else {
            normalize(&self.last_name).bag_of_words().clone()
        }
    }
}
