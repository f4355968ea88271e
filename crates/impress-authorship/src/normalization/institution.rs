//! Institution-name cleaning for directory lookups

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Parenthesised text, or anything after a comma, slash or spaced dash
    static ref QUALIFIER: Regex = Regex::new(r"\s*(\([^)]*\)|,.*|/.*|\s-\s.*)").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref PARENTHESISED: Regex = Regex::new(r"\s*\([^)]*\)").unwrap();
}

/// Reduce an institution name to the part a directory search can use.
///
/// "Universidad de Oviedo (UniOvi), Asturias" becomes "Universidad de Oviedo".
pub fn clean_institution_name(name: &str) -> String {
    let stripped = QUALIFIER.replace_all(name, "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Remove parenthesised text from a query value
pub fn strip_parenthesised(value: &str) -> String {
    let stripped = PARENTHESISED.replace_all(value, "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}
