//! Pluggable name similarity scoring
//!
//! Every scorer is symmetric and returns a value in [0, 1] so the tier
//! thresholds can be tuned independently of the scoring function.

use strsim::jaro_winkler;

use super::name::{is_initial, NormalizedName};

/// Symmetric name similarity normalized to [0, 1]
pub trait NameSimilarity: Send + Sync {
    fn score(&self, a: &NormalizedName, b: &NormalizedName) -> f64;
}

/// Bag-of-words overlap: shared tokens over union size.
///
/// Tokens pair up when equal, when one is an initial of the other, or
/// (for tokens of four or more letters) when their Jaro-Winkler
/// similarity reaches `typo_threshold`. When every token of the shorter
/// name is paired the score is 1.0, so a dropped maternal surname or
/// middle name does not count against the match.
#[derive(Debug, Clone)]
pub struct BagOfWords {
    pub typo_threshold: f64,
    pub tolerate_omissions: bool,
}

impl Default for BagOfWords {
    fn default() -> Self {
        Self {
            typo_threshold: 0.94,
            tolerate_omissions: true,
        }
    }
}

impl BagOfWords {
    /// Plain Jaccard overlap: no omission tolerance, no typo pairing
    pub fn strict() -> Self {
        Self {
            typo_threshold: 1.0,
            tolerate_omissions: false,
        }
    }
}

impl NameSimilarity for BagOfWords {
    fn score(&self, a: &NormalizedName, b: &NormalizedName) -> f64 {
        let mut left: Vec<&str> = a.token_set().into_iter().collect();
        let mut right: Vec<&str> = b.token_set().into_iter().collect();
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }
        // Greedy pairing depends on argument order; fix an order so the
        // score is symmetric.
        if left > right {
            std::mem::swap(&mut left, &mut right);
        }

        let shared = pair_tokens(&left, &right, self.typo_threshold);
        if self.tolerate_omissions && shared == left.len().min(right.len()) {
            return 1.0;
        }
        let union = left.len() + right.len() - shared;
        shared as f64 / union as f64
    }
}

/// Count token pairs between two sorted, deduplicated token lists
fn pair_tokens(left: &[&str], right: &[&str], typo_threshold: f64) -> usize {
    let mut left_used = vec![false; left.len()];
    let mut right_used = vec![false; right.len()];
    let mut shared = 0;

    let mut pair_pass = |matches: &dyn Fn(&str, &str) -> bool| {
        for (i, l) in left.iter().enumerate() {
            if left_used[i] {
                continue;
            }
            if let Some(j) = (0..right.len()).find(|&j| !right_used[j] && matches(l, right[j])) {
                left_used[i] = true;
                right_used[j] = true;
                shared += 1;
            }
        }
    };

    pair_pass(&|l, r| l == r);
    pair_pass(&|l, r| initial_matches(l, r) || initial_matches(r, l));
    if typo_threshold < 1.0 {
        pair_pass(&|l, r| {
            l.chars().count() >= 4
                && r.chars().count() >= 4
                && jaro_winkler(l, r) >= typo_threshold
        });
    }

    shared
}

/// `initial` is a single letter and `token` starts with it
fn initial_matches(initial: &str, token: &str) -> bool {
    is_initial(initial) && token.starts_with(initial)
}
