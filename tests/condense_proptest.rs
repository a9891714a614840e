// SPDX-License-Identifier: MPL-2.0

use proptest::prelude::*;

use py2spack::condense::condense;
use py2spack::version::{Component, Version};

fn universe_strategy() -> impl Strategy<Value = Vec<Version>> {
    prop::collection::vec(prop::collection::vec(0u64..6, 1..4), 1..12).prop_map(|releases| {
        let mut universe: Vec<Version> = releases
            .into_iter()
            .map(|ns| Version::from_release(ns.into_iter().map(Component::Num).collect()))
            .collect();
        universe.sort();
        universe.dedup();
        universe
    })
}

proptest! {
    /// The condensed ranges contain exactly the subset, over every version
    /// the universe knows.
    #[test]
    fn condense_matches_membership(universe in universe_strategy(), mask in any::<u32>()) {
        let subset: Vec<Version> = universe
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << (i % 32)) != 0)
            .map(|(_, v)| v.clone())
            .collect();
        let set = condense(&subset, &universe);
        for version in &universe {
            prop_assert_eq!(
                set.contains(version),
                subset.contains(version),
                "{} in {}", version, set
            );
        }
    }

    /// A subset equal to the whole universe condenses to the full set, and
    /// an empty subset to the empty set.
    #[test]
    fn condense_extremes(universe in universe_strategy()) {
        prop_assert!(condense(&universe, &universe).is_full());
        prop_assert!(condense(&[], &universe).is_empty());
    }

    /// Condensing is stable: feeding the same inputs twice gives the same
    /// ranges.
    #[test]
    fn condense_is_deterministic(universe in universe_strategy(), mask in any::<u32>()) {
        let subset: Vec<Version> = universe
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << (i % 32)) != 0)
            .map(|(_, v)| v.clone())
            .collect();
        prop_assert_eq!(condense(&subset, &universe), condense(&subset, &universe));
    }
}
