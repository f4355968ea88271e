//! Error types for source capabilities and the resolution pipeline

use thiserror::Error;

use crate::domain::ResearcherState;

/// Error returned by an external capability (search, DOI lookup, works paging)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Not found")]
    NotFound,
    #[error("Rate limited")]
    RateLimited,
    #[error("Transient failure: {message}")]
    Transient { message: String },
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// Rate limits and transport failures are worth another attempt;
    /// client errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::RateLimited | SourceError::Transient { .. })
    }

    pub fn transient(message: impl Into<String>) -> Self {
        SourceError::Transient {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}

/// Which capability a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ProfileSearch,
    DoiLookup,
    WorksFetch,
    PublicationHistory,
    InstitutionDirectory,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::ProfileSearch => "profile search",
            Capability::DoiLookup => "DOI lookup",
            Capability::WorksFetch => "works fetch",
            Capability::PublicationHistory => "publication history",
            Capability::InstitutionDirectory => "institution directory",
        };
        f.write_str(name)
    }
}

/// Failure while resolving a single researcher
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("{capability} failed: {source}")]
    Source {
        capability: Capability,
        #[source]
        source: SourceError,
    },
    #[error("Invalid state transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: ResearcherState,
        to: ResearcherState,
    },
}

impl ResolveError {
    pub fn unavailable(capability: Capability, source: SourceError) -> Self {
        ResolveError::Source { capability, source }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
