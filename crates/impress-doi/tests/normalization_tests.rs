//! Identifier normalization tests

use impress_doi::identifier::strip_doi_prefixes;
use impress_doi::{normalize_manual_input, Identifier, IdentifierKind, ManualInputError};
use proptest::prelude::*;
use rstest::rstest;

// === Manual entry ===

#[rstest]
#[case("10.1037/stl0000104", "10.1037/stl0000104")]
#[case("  10.1037/stl0000104\n", "10.1037/stl0000104")]
#[case("doi:10.1037/stl0000104", "10.1037/stl0000104")]
#[case("DOI: 10.1037/stl0000104", "10.1037/stl0000104")]
#[case("https://doi.org/10.1037/stl0000104", "10.1037/stl0000104")]
#[case("http://dx.doi.org/10.1037/stl0000104", "10.1037/stl0000104")]
#[case("https://www.doi.org/10.1037/stl0000104", "10.1037/stl0000104")]
#[case("doi.org/10.1037/stl0000104", "10.1037/stl0000104")]
#[case("10.1000/(SICI)1097-4679(199911)55:11<1401::AID-JCLP4>3.0.CO;2-G", "10.1000/(SICI)1097-4679(199911)55:11<1401::AID-JCLP4>3.0.CO;2-G")]
fn test_manual_doi_forms(#[case] input: &str, #[case] expected: &str) {
    let id = normalize_manual_input(input).unwrap();
    assert_eq!(id.as_str(), expected);
    assert_eq!(id.kind(), IdentifierKind::Doi);
}

#[rstest]
#[case("https://arxiv.org/abs/2301.01234", "2301.01234")]
#[case("https://arxiv.org/abs/2301.01234v2", "2301.01234")]
#[case("arXiv:2301.01234", "2301.01234")]
#[case("2301.01234v1", "2301.01234")]
fn test_manual_arxiv_forms(#[case] input: &str, #[case] expected: &str) {
    let id = normalize_manual_input(input).unwrap();
    assert_eq!(id.as_str(), expected);
    assert!(id.is_arxiv());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
fn test_manual_empty(#[case] input: &str) {
    assert_eq!(normalize_manual_input(input), Err(ManualInputError::Empty));
}

#[rstest]
#[case("hello world")]
#[case("https://example.org/10.1037/stl0000104")]
#[case("11.1037/stl0000104")]
#[case("doi:")]
fn test_manual_malformed(#[case] input: &str) {
    assert!(matches!(
        normalize_manual_input(input),
        Err(ManualInputError::Malformed { .. })
    ));
}

#[test]
fn test_malformed_message() {
    let err = normalize_manual_input("nonsense").unwrap_err();
    assert_eq!(err.to_string(), "Invalid DOI format: nonsense");
    assert_eq!(
        ManualInputError::Empty.to_string(),
        "Please enter a DOI or URL"
    );
}

// === Prefix stripping ===

#[rstest]
#[case("doi:doi:10.1/a", "10.1/a")]
#[case("https://doi.org/doi:10.1/a", "10.1/a")]
#[case("DOI:https://dx.doi.org/10.1/a", "10.1/a")]
#[case("10.1/doi.org/a", "10.1/doi.org/a")]
fn test_strip_repeated_prefixes(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(strip_doi_prefixes(input), expected);
}

// === Property-Based Tests ===

fn doi_prefix() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(""),
        Just("doi:"),
        Just("DOI: "),
        Just("https://doi.org/"),
        Just("http://dx.doi.org/"),
        Just("https://www.doi.org/"),
        Just("doi: https://doi.org/"),
    ]
}

proptest! {
    #[test]
    fn test_prefixed_doi_normalizes_to_bare(
        prefix in doi_prefix(),
        doi in "10\\.[0-9]{4,5}/[a-zA-Z0-9._;()-]{1,20}",
        padding in "[ \t]{0,3}",
    ) {
        let input = format!("{}{}{}{}", padding, prefix, doi, padding);
        let id = normalize_manual_input(&input).unwrap();
        prop_assert_eq!(id.as_str(), doi.as_str());
    }

    #[test]
    fn test_accepted_doi_is_bare(input in "\\PC{0,40}") {
        if let Some(id) = Identifier::doi(&input) {
            let value = id.as_str();
            prop_assert!(value.starts_with("10."));
            prop_assert!(!value.to_lowercase().starts_with("doi:"));
            prop_assert!(!value.starts_with("http"));
            prop_assert_eq!(value.trim(), value);
        }
    }

    #[test]
    fn test_doi_normalization_idempotent(input in "\\PC{0,40}") {
        if let Some(id) = Identifier::doi(&input) {
            let again = Identifier::doi(id.as_str()).unwrap();
            prop_assert_eq!(again.as_str(), id.as_str());
        }
    }

    #[test]
    fn test_manual_normalization_idempotent(
        prefix in doi_prefix(),
        doi in "10\\.[0-9]{4,5}/[a-zA-Z0-9._-]{1,20}",
    ) {
        let once = normalize_manual_input(&format!("{}{}", prefix, doi)).unwrap();
        let twice = normalize_manual_input(once.as_str()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
