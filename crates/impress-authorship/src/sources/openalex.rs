//! OpenAlex record shapes
//!
//! API docs: https://docs.openalex.org/
//! Converts author search results, works and institution searches into
//! domain records. Transport is out of scope; these functions take the
//! raw JSON body.

use serde::Deserialize;

use super::traits::{Converted, PageToken, WorksPage};
use super::wire::deserialize_count_option;
use crate::domain::{AuthorEntry, Doi, InstitutionId, PublicationRecord, RawProfile};
use crate::error::SourceError;

pub const SOURCE_ID: &str = "openalex";

/// OpenAlex list response wrapper
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    meta: ListMeta,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ListMeta {
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorResult {
    id: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    display_name_alternatives: Vec<String>,
    #[serde(default)]
    affiliations: Vec<Affiliation>,
    #[serde(default)]
    last_known_institutions: Vec<InstitutionRef>,
    #[serde(default)]
    topics: Vec<Topic>,
    ids: Option<AuthorIds>,
    #[serde(default, deserialize_with = "deserialize_count_option")]
    works_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_count_option")]
    cited_by_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Affiliation {
    institution: Option<InstitutionRef>,
}

#[derive(Debug, Deserialize)]
struct InstitutionRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    field: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorIds {
    orcid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkResult {
    doi: Option<String>,
    title: Option<String>,
    publication_year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_count_option")]
    cited_by_count: Option<u64>,
    #[serde(default)]
    authorships: Vec<Authorship>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    author: Option<AuthorRef>,
    raw_author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    id: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstitutionResult {
    id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an `/authors?search=` response into raw profiles.
///
/// Results without an id are dropped and counted.
pub fn parse_author_search(json: &str) -> Result<Converted<RawProfile>, SourceError> {
    let response: ListResponse<AuthorResult> = serde_json::from_str(json)
        .map_err(|e| SourceError::Parse(format!("Invalid OpenAlex author JSON: {}", e)))?;

    let mut converted = Converted::default();
    for result in response.results {
        match convert_author(result) {
            Some(profile) => converted.items.push(profile),
            None => converted.dropped += 1,
        }
    }
    Ok(converted)
}

fn convert_author(result: AuthorResult) -> Option<RawProfile> {
    let id = non_empty(result.id)?;
    let display_name = non_empty(result.display_name).unwrap_or_default();

    let institution_ids = result
        .affiliations
        .into_iter()
        .filter_map(|a| a.institution)
        .chain(result.last_known_institutions)
        .filter_map(|i| non_empty(i.id))
        .collect();

    let topics = result
        .topics
        .into_iter()
        .filter_map(|t| t.field.and_then(|f| non_empty(f.display_name)))
        .collect();

    Some(RawProfile {
        id,
        display_name,
        alternative_names: result.display_name_alternatives,
        institution_ids,
        topics,
        orcid: result.ids.and_then(|ids| non_empty(ids.orcid)),
        works_count: result.works_count,
        cited_by_count: result.cited_by_count,
    })
}

fn convert_work(work: WorkResult) -> PublicationRecord {
    let authors = work
        .authorships
        .into_iter()
        .map(|authorship| {
            let (id, display) = match authorship.author {
                Some(author) => (non_empty(author.id), non_empty(author.display_name)),
                None => (None, None),
            };
            AuthorEntry {
                name: display
                    .or_else(|| non_empty(authorship.raw_author_name))
                    .unwrap_or_default(),
                profile_id: id,
            }
        })
        .collect();

    PublicationRecord {
        doi: work.doi.as_deref().and_then(Doi::parse),
        title: non_empty(work.title),
        year: work.publication_year,
        authors,
        cited_by_count: work.cited_by_count.unwrap_or(0),
        source: SOURCE_ID.to_string(),
    }
}

/// Parse a single `/works/{doi}` response
pub fn parse_work(json: &str) -> Result<PublicationRecord, SourceError> {
    let work: WorkResult = serde_json::from_str(json)
        .map_err(|e| SourceError::Parse(format!("Invalid OpenAlex work JSON: {}", e)))?;
    Ok(convert_work(work))
}

/// Parse one page of an author's works listing (cursor paging)
pub fn parse_works_page(json: &str) -> Result<WorksPage, SourceError> {
    let response: ListResponse<WorkResult> = serde_json::from_str(json)
        .map_err(|e| SourceError::Parse(format!("Invalid OpenAlex works JSON: {}", e)))?;

    let has_results = !response.results.is_empty();
    let records = response.results.into_iter().map(convert_work).collect();
    // OpenAlex keeps handing out a cursor on the final, empty page
    let next_page = response
        .meta
        .next_cursor
        .filter(|_| has_results)
        .filter(|c| !c.is_empty())
        .map(PageToken);

    Ok(WorksPage { records, next_page })
}

/// Parse an `/institutions?search=` response; the first result wins
pub fn parse_institution_search(json: &str) -> Result<Option<InstitutionId>, SourceError> {
    let response: ListResponse<InstitutionResult> = serde_json::from_str(json)
        .map_err(|e| SourceError::Parse(format!("Invalid OpenAlex institution JSON: {}", e)))?;
    Ok(response.results.into_iter().next().and_then(|r| non_empty(r.id)))
}
