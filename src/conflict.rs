// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Detecting unsatisfiable combinations of dependency edges.

use indexmap::IndexMap;

use crate::error::ConflictError;
use crate::requirement::DependencyEdge;

/// Find pairs of edges on the same dependency whose conditions can hold at
/// the same time while their main constraints rule each other out.
///
/// Two conditions can hold at once when the condition constraints
/// intersect and the edges' `applies_to` sets share a version of the
/// depending package; edges observed on disjoint version ranges never
/// conflict.
pub fn find_conflicts(edges: &[DependencyEdge]) -> Vec<ConflictError> {
    let mut by_name: IndexMap<&str, Vec<&DependencyEdge>> = IndexMap::new();
    for edge in edges {
        by_name.entry(edge.name.as_str()).or_default().push(edge);
    }

    let mut conflicts = Vec::new();
    for (name, group) in by_name {
        for (i, first) in group.iter().enumerate() {
            for second in &group[i + 1..] {
                let conditions_overlap = first.condition.intersect(&second.condition).is_some()
                    && !first.applies_to.is_disjoint(&second.applies_to);
                if conditions_overlap && first.main.intersect(&second.main).is_none() {
                    conflicts.push(ConflictError {
                        name: name.to_string(),
                        first: (*first).clone(),
                        second: (*second).clone(),
                    });
                }
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::constraint::{ConstraintExpr, Platform};
    use crate::range::VersionSet;
    use crate::requirement::DepType;
    use crate::version::Version;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn edge(main: ConstraintExpr, condition: ConstraintExpr) -> DependencyEdge {
        DependencyEdge::new("py-foo", main, condition, BTreeSet::from([DepType::Run]))
    }

    fn requires(range: VersionSet) -> ConstraintExpr {
        ConstraintExpr::new().with_package_range("py-foo", range)
    }

    #[test]
    fn overlapping_conditions_with_disjoint_mains_conflict() {
        let old = edge(
            requires(VersionSet::strictly_lower_than(v("2.0"))),
            ConstraintExpr::new(),
        );
        let new = edge(
            requires(VersionSet::higher_than(v("2.0"))),
            ConstraintExpr::new(),
        );
        let conflicts = find_conflicts(&[old, new]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].name, "py-foo");
    }

    #[test]
    fn disjoint_conditions_do_not_conflict() {
        let linux = edge(
            requires(VersionSet::strictly_lower_than(v("2.0"))),
            ConstraintExpr::new().with_platform(Platform::Linux),
        );
        let windows = edge(
            requires(VersionSet::higher_than(v("2.0"))),
            ConstraintExpr::new().with_platform(Platform::Windows),
        );
        assert!(find_conflicts(&[linux, windows]).is_empty());
    }

    #[test]
    fn disjoint_applicability_does_not_conflict() {
        let mut old = edge(
            requires(VersionSet::strictly_lower_than(v("2.0"))),
            ConstraintExpr::new(),
        );
        old.applies_to = VersionSet::strictly_lower_than(v("5.0"));
        let mut new = edge(
            requires(VersionSet::higher_than(v("2.0"))),
            ConstraintExpr::new(),
        );
        new.applies_to = VersionSet::higher_than(v("5.0"));
        assert!(find_conflicts(&[old, new]).is_empty());
    }

    #[test]
    fn compatible_mains_do_not_conflict() {
        let wide = edge(requires(VersionSet::full()), ConstraintExpr::new());
        let narrow = edge(
            requires(VersionSet::higher_than(v("2.0"))),
            ConstraintExpr::new(),
        );
        assert!(find_conflicts(&[wide, narrow]).is_empty());
    }

    #[test]
    fn different_packages_never_conflict() {
        let a = edge(
            requires(VersionSet::strictly_lower_than(v("2.0"))),
            ConstraintExpr::new(),
        );
        let mut b = edge(
            ConstraintExpr::new().with_package_range("py-bar", VersionSet::higher_than(v("2.0"))),
            ConstraintExpr::new(),
        );
        b.name = "py-bar".to_string();
        assert!(find_conflicts(&[a, b]).is_empty());
    }
}
