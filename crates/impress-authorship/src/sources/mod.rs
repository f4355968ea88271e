//! External source capabilities and wire-format conversion
//!
//! The pipeline only talks to the traits in this module. The
//! `openalex` and `scopus` submodules turn raw API payloads into the
//! domain records those traits return.

pub mod openalex;
pub mod scopus;
mod traits;
mod wire;

pub use traits::{
    Converted, DoiLookup, InstitutionDirectory, PageToken, ProfileSearch, PublicationHistory,
    WorksPage, WorksSource,
};
