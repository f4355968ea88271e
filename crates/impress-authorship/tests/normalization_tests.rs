//! Name normalization and similarity tests
//!
//! Property-based checks for idempotence, accent invariance and scorer
//! symmetry, plus parameterised cases for the surname conventions.

use impress_authorship::normalization::{clean_institution_name, is_initial};
use impress_authorship::{normalize, BagOfWords, NameSimilarity, PersonName, ResearcherQuery};
use proptest::prelude::*;
use rstest::rstest;

// === Normalization cases ===

#[rstest]
#[case("García", "garcia")]
#[case("  JUAN   garcía ", "juan garcia")]
#[case("Acín-Sáiz, C.", "acin-saiz c")]
#[case("O'Brien", "obrien")]
#[case("Jean‐Luc Müller", "jean-luc muller")]
#[case("Núñez–Pérez", "nunez-perez")]
fn test_normalize_cases(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(normalize(raw).as_str(), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("!!! ???")]
#[case("- - -")]
fn test_normalize_empty_input(#[case] raw: &str) {
    let name = normalize(raw);
    assert!(name.is_empty());
    assert!(name.bag_of_words().is_empty());
}

#[test]
fn test_hyphenated_surname_keeps_both_forms() {
    let name = normalize("Cándida Acín-Sáiz");
    assert_eq!(name.tokens(), ["candida", "acin", "saiz"]);
    assert!(name.contains("acin-saiz"));
    assert!(name.contains("acin"));
    assert!(name.contains("saiz"));
}

#[rstest]
#[case("j", true)]
#[case("J", true)]
#[case("ju", false)]
#[case("7", false)]
#[case("", false)]
fn test_is_initial(#[case] token: &str, #[case] expected: bool) {
    assert_eq!(is_initial(token), expected);
}

// === Surname splitting ===

#[rstest]
#[case("Juan", &["juan"], None, None)]
#[case("Juan García", &["juan"], Some("garcia"), None)]
#[case("Juan García Pérez", &["juan"], Some("garcia"), Some("perez"))]
#[case("Juan Carlos García Pérez", &["juan", "carlos"], Some("garcia"), Some("perez"))]
fn test_person_name_split(
    #[case] full: &str,
    #[case] given: &[&str],
    #[case] paternal: Option<&str>,
    #[case] maternal: Option<&str>,
) {
    let split = PersonName::split(full);
    assert_eq!(split.given, given);
    assert_eq!(split.paternal.as_deref(), paternal);
    assert_eq!(split.maternal.as_deref(), maternal);
}

#[rstest]
#[case("Candida Acin Saiz", "", "", "Candida Acin")]
#[case("Candida Acin Saiz", "Candida", "Acin Saiz", "Candida Acin")]
#[case("María (Maite) Ruiz", "", "", "María Ruiz")]
#[case("Ruiz", "", "", "Ruiz")]
fn test_search_name(
    #[case] full: &str,
    #[case] first: &str,
    #[case] last: &str,
    #[case] expected: &str,
) {
    let query = ResearcherQuery::new("R1", full).with_names(first, last);
    assert_eq!(query.search_name(), expected);
}

#[rstest]
#[case("Universidad de Zaragoza", "Universidad de Zaragoza")]
#[case("Universidad de Zaragoza (UNIZAR)", "Universidad de Zaragoza")]
#[case("CSIC, Madrid", "CSIC")]
#[case("IATA / CSIC", "IATA")]
#[case("Hospital Clínic - Barcelona", "Hospital Clínic")]
#[case("  Spaced    Institute  ", "Spaced Institute")]
fn test_clean_institution_name(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(clean_institution_name(raw), expected);
}

// === Similarity ===

#[rstest]
#[case("J. García", "Juan García Pérez", 1.0)]
#[case("Juan García", "García Juan", 1.0)]
#[case("Juan Garcia Lopez", "Juan Garcia Perez", 0.5)]
#[case("Ana Ruiz", "Pedro Soto", 0.0)]
fn test_bag_of_words_scores(#[case] a: &str, #[case] b: &str, #[case] expected: f64) {
    let score = BagOfWords::default().score(&normalize(a), &normalize(b));
    assert!(
        (score - expected).abs() < 1e-9,
        "score({:?}, {:?}) = {}, expected {}",
        a,
        b,
        score,
        expected
    );
}

fn accent(ascii: &str) -> String {
    ascii
        .chars()
        .map(|c| match c {
            'a' => 'á',
            'e' => 'é',
            'i' => 'í',
            'o' => 'ö',
            'u' => 'ü',
            'n' => 'ñ',
            'c' => 'ç',
            other => other,
        })
        .collect()
}

proptest! {
    #[test]
    fn test_normalize_idempotent(name in "[A-Za-zÀ-ÿ .'-]{0,40}") {
        let once = normalize(&name);
        let twice = normalize(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_accent_and_case_invariance(name in "[a-z ]{0,30}") {
        let plain = normalize(&name);
        prop_assert_eq!(&plain, &normalize(&accent(&name)));
        prop_assert_eq!(&plain, &normalize(&name.to_uppercase()));
    }

    #[test]
    fn test_similarity_symmetric_and_bounded(a in "[A-Za-z. -]{0,30}", b in "[A-Za-z. -]{0,30}") {
        let scorer = BagOfWords::default();
        let (na, nb) = (normalize(&a), normalize(&b));
        let ab = scorer.score(&na, &nb);
        let ba = scorer.score(&nb, &na);
        prop_assert_eq!(ab, ba);
        prop_assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_strict_similarity_bounded(a in "[A-Za-z ]{0,30}", b in "[A-Za-z ]{0,30}") {
        let scorer = BagOfWords::strict();
        let score = scorer.score(&normalize(&a), &normalize(&b));
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(score, scorer.score(&normalize(&b), &normalize(&a)));
    }

    #[test]
    fn test_identical_names_score_one(name in "[A-Za-z]{2,10} [A-Za-z]{2,10}") {
        let n = normalize(&name);
        prop_assert_eq!(BagOfWords::default().score(&n, &n), 1.0);
    }
}
