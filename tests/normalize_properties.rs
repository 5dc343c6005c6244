use mla_fund_report::constituency_key;
use proptest::prelude::*;

proptest! {
    #[test]
    fn key_is_idempotent(raw in "[A-Za-z .()-]{0,40}") {
        let once = constituency_key(&raw);
        prop_assert_eq!(constituency_key(&once), once);
    }

    #[test]
    fn key_is_upper_ascii_letters(raw in "\\PC{0,40}") {
        prop_assert!(constituency_key(&raw).chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn key_ignores_case_and_punctuation(raw in "[a-z]{1,20}") {
        let noisy = format!(" {}. ", raw.to_uppercase());
        prop_assert_eq!(constituency_key(&noisy), constituency_key(&raw));
    }
}
