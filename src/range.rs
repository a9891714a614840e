// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Half-open version ranges and normalized sets of them.
//!
//! A [`VersionRange`] is `[lower, upper)` where a missing endpoint means
//! unbounded in that direction. A [`VersionSet`] is a sorted list of
//! non-empty, non-overlapping, non-adjacent ranges, so two sets containing
//! the same versions are structurally equal.

use std::fmt::{self, Display};

use crate::version::Version;

/// A half-open interval of versions: `lower <= v < upper`.
///
/// `None` for `lower` means unbounded below, `None` for `upper` unbounded
/// above. A range is non-empty iff `lower < upper` (with the unbounded
/// conventions).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionRange {
    /// Inclusive lower bound, unbounded when `None`.
    pub lower: Option<Version>,
    /// Exclusive upper bound, unbounded when `None`.
    pub upper: Option<Version>,
}

impl VersionRange {
    /// The range containing every version.
    pub fn full() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    /// `[lower, upper)`.
    pub fn between(lower: impl Into<Option<Version>>, upper: impl Into<Option<Version>>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) => lo >= hi,
            _ => false,
        }
    }

    /// Whether `v` lies in the range.
    pub fn contains(&self, v: &Version) -> bool {
        self.lower.as_ref().map_or(true, |lo| lo <= v)
            && self.upper.as_ref().map_or(true, |hi| v < hi)
    }

    fn intersection(&self, other: &Self) -> Self {
        let lower = match (&self.lower, &other.lower) {
            (Some(a), Some(b)) => Some(a.max(b).clone()),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let upper = match (&self.upper, &other.upper) {
            (Some(a), Some(b)) => Some(a.min(b).clone()),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        Self { lower, upper }
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.lower, &self.upper) {
            (None, None) => write!(f, "*"),
            (Some(lo), None) => write!(f, ">={lo}"),
            (None, Some(hi)) => write!(f, "<{hi}"),
            (Some(lo), Some(hi)) => write!(f, ">={lo}, <{hi}"),
        }
    }
}

/// A set of versions, stored as sorted disjoint half-open ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionSet {
    segments: Vec<VersionRange>,
}

impl VersionSet {
    /// Empty set.
    pub fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Set of all versions.
    pub fn full() -> Self {
        Self {
            segments: vec![VersionRange::full()],
        }
    }

    /// Set containing exactly the versions in `[lower, upper)`.
    pub fn between(lower: impl Into<Option<Version>>, upper: impl Into<Option<Version>>) -> Self {
        Self::from_ranges(vec![VersionRange::between(lower, upper)])
    }

    /// Set of versions strictly below `v`.
    pub fn strictly_lower_than(v: Version) -> Self {
        Self::between(None, v)
    }

    /// Set of versions at or above `v`.
    pub fn higher_than(v: Version) -> Self {
        Self::between(v, None)
    }

    /// Build a set from arbitrary ranges, dropping empty ones and merging
    /// overlapping or adjacent ones.
    pub fn from_ranges(mut ranges: Vec<VersionRange>) -> Self {
        ranges.retain(|r| !r.is_empty());
        // unbounded-below ranges first, then by lower bound
        ranges.sort_by(|a, b| match (&a.lower, &b.lower) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(y),
        });
        let mut segments: Vec<VersionRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match segments.last_mut() {
                Some(last) if reaches(&last.upper, &range.lower) => {
                    last.upper = match (&last.upper, &range.upper) {
                        (Some(a), Some(b)) => Some(a.max(b).clone()),
                        _ => None,
                    };
                }
                _ => segments.push(range),
            }
        }
        Self { segments }
    }

    /// The ranges making up the set, sorted and disjoint.
    pub fn segments(&self) -> &[VersionRange] {
        &self.segments
    }

    /// Whether the set contains no version.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the set contains every version.
    pub fn is_full(&self) -> bool {
        self.segments.len() == 1
            && self.segments[0].lower.is_none()
            && self.segments[0].upper.is_none()
    }

    /// Whether `v` lies in the set.
    pub fn contains(&self, v: &Version) -> bool {
        self.segments.iter().any(|r| r.contains(v))
    }

    /// All versions not in the set.
    pub fn complement(&self) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        let mut start: Option<Option<Version>> = Some(None);
        for range in &self.segments {
            if let Some(lower) = start.take() {
                if lower != range.lower {
                    segments.push(VersionRange {
                        lower,
                        upper: range.lower.clone(),
                    });
                }
            }
            start = range.upper.clone().map(Some);
        }
        if let Some(lower) = start {
            segments.push(VersionRange { lower, upper: None });
        }
        Self { segments }
    }

    /// Versions in both sets.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut left = self.segments.iter().peekable();
        let mut right = other.segments.iter().peekable();
        let mut segments = Vec::new();
        while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
            let piece = a.intersection(b);
            // advance whichever segment ends first
            let advance_left = match (&a.upper, &b.upper) {
                (_, None) => true,
                (None, _) => false,
                (Some(x), Some(y)) => x <= y,
            };
            if !piece.is_empty() {
                segments.push(piece);
            }
            if advance_left {
                left.next();
            } else {
                right.next();
            }
        }
        Self { segments }
    }

    /// Versions in either set.
    pub fn union(&self, other: &Self) -> Self {
        self.complement()
            .intersection(&other.complement())
            .complement()
    }

    /// Whether the two sets share no version.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other).is_empty()
    }

    /// Drop everything below `floor` as unsupported: leading segments ending
    /// at or below `floor` are removed, and a first segment starting below
    /// `floor` becomes unbounded below.
    pub fn simplify_below(&self, floor: &Version) -> Self {
        let mut segments: Vec<VersionRange> = self
            .segments
            .iter()
            .skip_while(|r| matches!(&r.upper, Some(hi) if hi <= floor))
            .cloned()
            .collect();
        if let Some(first) = segments.first_mut() {
            if matches!(&first.lower, Some(lo) if lo < floor) {
                first.lower = None;
            }
        }
        Self { segments }
    }

    #[cfg(test)]
    fn check_invariants(self) -> Self {
        assert!(self.segments.iter().all(|r| !r.is_empty()));
        for pair in self.segments.windows(2) {
            let (hi, lo) = (&pair[0].upper, &pair[1].lower);
            assert!(hi.is_some() && lo.is_some());
            assert!(hi < lo, "segments must be separated: {} / {}", pair[0], pair[1]);
        }
        self
    }
}

// `upper` touches or crosses `lower`, so the two ranges merge into one.
fn reaches(upper: &Option<Version>, lower: &Option<Version>) -> bool {
    match (upper, lower) {
        (None, _) | (_, None) => true,
        (Some(hi), Some(lo)) => lo <= hi,
    }
}

impl Display for VersionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "∅");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<VersionRange> for VersionSet {
    fn from(range: VersionRange) -> Self {
        Self::from_ranges(vec![range])
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn strategy() -> impl Strategy<Value = VersionSet> {
        prop::collection::vec(
            (
                proptest::option::of(prop::collection::vec(0u64..10, 1..4)),
                proptest::option::of(prop::collection::vec(0u64..10, 1..4)),
            ),
            0..5,
        )
        .prop_map(|ranges| {
            VersionSet::from_ranges(
                ranges
                    .into_iter()
                    .map(|(lo, hi)| {
                        VersionRange::between(
                            lo.map(|ns| {
                                Version::from_release(
                                    ns.into_iter().map(crate::version::Component::Num).collect(),
                                )
                            }),
                            hi.map(|ns| {
                                Version::from_release(
                                    ns.into_iter().map(crate::version::Component::Num).collect(),
                                )
                            }),
                        )
                    })
                    .collect(),
            )
        })
    }

    fn version_strategy() -> impl Strategy<Value = Version> {
        prop::collection::vec(0u64..10, 1..4).prop_map(|ns| {
            Version::from_release(ns.into_iter().map(crate::version::Component::Num).collect())
        })
    }

    #[test]
    fn normalization_merges_and_sorts() {
        let set = VersionSet::from_ranges(vec![
            VersionRange::between(v("2.0"), v("3.0")),
            VersionRange::between(v("1.0"), v("2.0")),
            VersionRange::between(v("5.0"), v("4.0")),
            VersionRange::between(v("6.0"), v("7.0")),
        ]);
        assert_eq!(
            set.segments(),
            &[
                VersionRange::between(v("1.0"), v("3.0")),
                VersionRange::between(v("6.0"), v("7.0")),
            ]
        );
    }

    #[test]
    fn complement_of_bounded() {
        let set = VersionSet::between(v("1.0"), v("2.0"));
        assert_eq!(
            set.complement().segments(),
            &[
                VersionRange::between(None, v("1.0")),
                VersionRange::between(v("2.0"), None),
            ]
        );
        assert_eq!(VersionSet::full().complement(), VersionSet::empty());
        assert_eq!(VersionSet::empty().complement(), VersionSet::full());
    }

    #[test]
    fn intersection_walk() {
        let a = VersionSet::from_ranges(vec![
            VersionRange::between(v("1.0"), v("3.0")),
            VersionRange::between(v("4.0"), None),
        ]);
        let b = VersionSet::between(v("2.0"), v("5.0"));
        assert_eq!(
            a.intersection(&b).segments(),
            &[
                VersionRange::between(v("2.0"), v("3.0")),
                VersionRange::between(v("4.0"), v("5.0")),
            ]
        );
        assert!(a.intersection(&VersionSet::empty()).is_empty());
    }

    #[test]
    fn union_merges_adjacent() {
        let a = VersionSet::between(v("1.0"), v("2.0"));
        let b = VersionSet::between(v("2.0"), v("3.0"));
        assert_eq!(
            a.union(&b).segments(),
            &[VersionRange::between(v("1.0"), v("3.0"))]
        );
    }

    #[test]
    fn simplify_below_floor() {
        let floor = v("3.6");
        let set = VersionSet::from_ranges(vec![
            VersionRange::between(v("2.7"), v("2.8")),
            VersionRange::between(v("3.5"), v("3.8")),
            VersionRange::between(v("3.9"), None),
        ]);
        assert_eq!(
            set.simplify_below(&floor).segments(),
            &[
                VersionRange::between(None, v("3.8")),
                VersionRange::between(v("3.9"), None),
            ]
        );
        // nothing at or above the floor
        let below = VersionSet::between(v("2.7"), v("3.6"));
        assert!(below.simplify_below(&floor).is_empty());
    }

    proptest! {
        #[test]
        fn negate_contains_opposite(set in strategy(), version in version_strategy()) {
            prop_assert_ne!(set.contains(&version), set.complement().contains(&version));
        }

        #[test]
        fn double_negate_is_identity(set in strategy()) {
            prop_assert_eq!(set.complement().complement().check_invariants(), set);
        }

        #[test]
        fn intersection_contains_both(a in strategy(), b in strategy(), version in version_strategy()) {
            prop_assert_eq!(
                a.intersection(&b).check_invariants().contains(&version),
                a.contains(&version) && b.contains(&version)
            );
        }

        #[test]
        fn union_contains_either(a in strategy(), b in strategy(), version in version_strategy()) {
            prop_assert_eq!(
                a.union(&b).check_invariants().contains(&version),
                a.contains(&version) || b.contains(&version)
            );
        }

        #[test]
        fn intersection_commutes(a in strategy(), b in strategy()) {
            prop_assert_eq!(a.intersection(&b), b.intersection(&a));
        }

        #[test]
        fn disjoint_means_empty_intersection(a in strategy(), b in strategy()) {
            prop_assert_eq!(a.is_disjoint(&b), a.intersection(&b).is_empty());
        }
    }
}
