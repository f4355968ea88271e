//! Scopus search result shapes
//!
//! Scopus keeps author order in `@seq` and reports counts as strings.
//! An empty result set comes back as a single entry carrying `error`.

use serde::Deserialize;

use super::traits::Converted;
use super::wire::{deserialize_count_option, year_from_date};
use crate::domain::{AuthorEntry, Doi, PublicationRecord};
use crate::error::SourceError;

pub const SOURCE_ID: &str = "scopus";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "search-results")]
    search_results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    error: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
    #[serde(rename = "citedby-count", default, deserialize_with = "deserialize_count_option")]
    cited_by_count: Option<u64>,
    #[serde(default)]
    author: Vec<EntryAuthor>,
}

#[derive(Debug, Deserialize)]
struct EntryAuthor {
    #[serde(rename = "@seq", default, deserialize_with = "deserialize_count_option")]
    seq: Option<u64>,
    authname: Option<String>,
    authid: Option<String>,
}

/// Parse a Scopus search response into publication records.
///
/// Authors are ordered by `@seq`; authors without a sequence number keep
/// their listed order after the numbered ones. Error entries are dropped.
pub fn parse_search_results(json: &str) -> Result<Converted<PublicationRecord>, SourceError> {
    let response: SearchResponse = serde_json::from_str(json)
        .map_err(|e| SourceError::Parse(format!("Invalid Scopus JSON: {}", e)))?;

    let mut converted = Converted::default();
    for entry in response.search_results.entry {
        if entry.error.is_some() {
            converted.dropped += 1;
            continue;
        }
        converted.items.push(convert_entry(entry));
    }
    Ok(converted)
}

fn convert_entry(entry: Entry) -> PublicationRecord {
    let mut authors = entry.author;
    // stable sort keeps the listed order among equal keys
    authors.sort_by_key(|a| a.seq.unwrap_or(u64::MAX));

    let authors = authors
        .into_iter()
        .map(|a| AuthorEntry {
            name: a.authname.unwrap_or_default().trim().to_string(),
            profile_id: a.authid.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()),
        })
        .collect();

    PublicationRecord {
        doi: entry.doi.as_deref().and_then(Doi::parse),
        title: entry.title.filter(|t| !t.trim().is_empty()),
        year: entry.cover_date.as_deref().and_then(year_from_date),
        authors,
        cited_by_count: entry.cited_by_count.unwrap_or(0),
        source: SOURCE_ID.to_string(),
    }
}
