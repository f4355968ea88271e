//! Name and institution normalization
//!
//! Leaf of the pipeline: everything downstream compares names only
//! through [`NormalizedName`] and a [`NameSimilarity`] scorer.

mod institution;
mod name;
mod similarity;

pub use institution::{clean_institution_name, strip_parenthesised};
pub use name::{is_initial, normalize, NormalizedName, PersonName};
pub use similarity::{BagOfWords, NameSimilarity};
