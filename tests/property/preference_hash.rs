//! Preference hashes depend on meaning, not on list order, case or spacing

use mealplan::preferences::{hash_preferences, PreferenceSnapshot};
use proptest::prelude::*;

fn term() -> impl Strategy<Value = String> {
    "[a-z]{3,10}"
}

fn snapshot(allergies: Vec<String>, cuisines: Vec<String>) -> PreferenceSnapshot {
    PreferenceSnapshot {
        allergies,
        cuisine_preferences: cuisines,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn hash_ignores_list_order(
        allergies in prop::collection::vec(term(), 0..6),
        cuisines in prop::collection::vec(term(), 0..6),
    ) {
        let mut reversed_allergies = allergies.clone();
        reversed_allergies.reverse();
        let mut reversed_cuisines = cuisines.clone();
        reversed_cuisines.reverse();

        prop_assert_eq!(
            hash_preferences(&snapshot(allergies, cuisines)),
            hash_preferences(&snapshot(reversed_allergies, reversed_cuisines))
        );
    }

    #[test]
    fn hash_ignores_case_spacing_and_duplicates(terms in prop::collection::vec(term(), 1..6)) {
        let noisy: Vec<String> = terms
            .iter()
            .flat_map(|t| vec![format!("  {}  ", t.to_uppercase()), t.clone()])
            .collect();
        prop_assert_eq!(
            hash_preferences(&snapshot(terms, Vec::new())),
            hash_preferences(&snapshot(noisy, Vec::new()))
        );
    }

    #[test]
    fn adding_an_allergy_changes_the_hash(
        allergies in prop::collection::vec(term(), 0..5),
        extra in term(),
    ) {
        prop_assume!(!allergies.contains(&extra));
        let mut more = allergies.clone();
        more.push(extra);
        prop_assert_ne!(
            hash_preferences(&snapshot(allergies, Vec::new())),
            hash_preferences(&snapshot(more, Vec::new()))
        );
    }
}
