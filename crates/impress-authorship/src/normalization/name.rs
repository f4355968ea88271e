//! Name canonicalization into comparable tokens

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters treated as hyphens (ASCII hyphen, Unicode hyphens and dashes)
const HYPHENS: [char; 7] = [
    '-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}',
];

/// Punctuation that separates words rather than being dropped
const SEPARATORS: [char; 8] = ['.', ',', ';', ':', '/', '(', ')', '_'];

/// A name reduced to comparable tokens.
///
/// `tokens` keeps source order with hyphenated words split into their
/// parts; `bag` additionally holds each hyphenated compound as an alias,
/// so both "acin-perez" and "acin"/"perez" can be looked up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedName {
    text: String,
    tokens: Vec<String>,
    bag: BTreeSet<String>,
}

impl NormalizedName {
    /// Canonical text form; normalizing it again yields the same name
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn bag_of_words(&self) -> &BTreeSet<String> {
        &self.bag
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Distinct split tokens, sorted
    pub fn token_set(&self) -> BTreeSet<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }

    /// Exact match regardless of word order ("garcia juan" == "juan garcia")
    pub fn same_tokens_unordered(&self, other: &NormalizedName) -> bool {
        !self.is_empty() && self.token_set() == other.token_set()
    }

    /// Whether the bag contains `token`
    pub fn contains(&self, token: &str) -> bool {
        self.bag.contains(token)
    }

    /// Whole words of the canonical text, hyphenated compounds intact
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split(' ').filter(|w| !w.is_empty())
    }
}

impl std::fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// A single-letter token stands for an initial
pub fn is_initial(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

/// Normalize a raw name string.
///
/// - Strips diacritics (NFKD, combining marks dropped)
/// - Lowercases
/// - Treats `.`, `,` and similar punctuation as word breaks, drops the rest
/// - Splits hyphenated words, keeping the compound as an alias
///
/// Idempotent, and returns an empty name for empty or symbol-only input.
pub fn normalize(raw: &str) -> NormalizedName {
    let folded: String = raw
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if HYPHENS.contains(&c) {
                Some('-')
            } else if c.is_whitespace() || SEPARATORS.contains(&c) {
                Some(' ')
            } else {
                None
            }
        })
        .collect();

    let mut words = Vec::new();
    let mut tokens = Vec::new();
    let mut bag = BTreeSet::new();

    for word in folded.split_whitespace() {
        let parts: Vec<&str> = word.split('-').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            continue;
        }
        let compound = parts.join("-");
        if parts.len() > 1 {
            bag.insert(compound.clone());
        }
        for part in &parts {
            tokens.push(part.to_string());
            bag.insert(part.to_string());
        }
        words.push(compound);
    }

    NormalizedName {
        text: words.join(" "),
        tokens,
        bag,
    }
}

/// A person name split by the Spanish two-surname convention
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonName {
    pub given: Vec<String>,
    pub paternal: Option<String>,
    pub maternal: Option<String>,
}

impl PersonName {
    /// Split whitespace-separated words.
    ///
    /// One word is a given name only, two are given + paternal surname,
    /// three or more end in paternal + maternal surnames.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let words: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();
        match words.len() {
            0 | 1 => PersonName {
                given: words,
                ..Default::default()
            },
            2 => PersonName {
                given: vec![words[0].clone()],
                paternal: Some(words[1].clone()),
                maternal: None,
            },
            n => PersonName {
                given: words[..n - 2].to_vec(),
                paternal: Some(words[n - 2].clone()),
                maternal: Some(words[n - 1].clone()),
            },
        }
    }

    /// Split a normalized full name
    pub fn split(full_name: &str) -> Self {
        let name = normalize(full_name);
        let words: Vec<&str> = name.words().collect();
        Self::from_words(&words)
    }

    /// Surname tokens, hyphenated surnames contributing parts and compound
    pub fn surname_tokens(&self) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        for surname in self.paternal.iter().chain(self.maternal.iter()) {
            result.extend(normalize(surname).bag_of_words().iter().cloned());
        }
        result
    }
}
