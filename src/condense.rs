// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Condensing explicit version lists into minimal sets of ranges.
//!
//! Given the subset of a package's versions that satisfy some requirement
//! and the full list of versions that exist, [`condense`] produces the most
//! general set of half-open ranges containing every subset version and no
//! other known version. "Most general" means bounds cut as high in the
//! version hierarchy as the known versions allow, so unknown in-between and
//! future patch releases stay included.

use crate::range::{VersionRange, VersionSet};
use crate::version::{Component, PackagingVersion, Version};

/// The most general exclusive upper bound that still includes `curr` but
/// excludes `nxt`. Requires `curr < nxt`.
fn best_upper_bound(curr: &Version, nxt: &Version) -> Version {
    debug_assert!(curr < nxt);
    let (c, n) = (curr.release(), nxt.release());
    let m = c.len().min(n.len());
    let candidate = match (0..m).find(|&k| c[k] != n[k]) {
        None if c.len() < n.len() => {
            // curr is a proper prefix of nxt: one extra zero still sorts
            // above curr but below the extension nxt continues with
            let mut release = c.to_vec();
            release.push(Component::Num(0));
            Version::from_release(release)
        }
        // same release, nxt differs only in its prerelease tag
        None => return nxt.clone(),
        Some(i) => match c[i] {
            Component::Num(x) => {
                let mut release = c[..i].to_vec();
                release.push(Component::Num(x + 1));
                Version::from_release(release)
            }
            Component::Str(_) => Version::from_release(n[..i + 1].to_vec()),
        },
    };
    if candidate <= *nxt {
        candidate
    } else {
        // nxt sorts below the rounded-up candidate (e.g. it is a prerelease)
        nxt.clone()
    }
}

/// The most general inclusive lower bound that includes `curr` but excludes
/// `prev`. Requires `prev < curr`.
fn best_lower_bound(prev: &Version, curr: &Version) -> Version {
    debug_assert!(prev < curr);
    let (p, c) = (prev.release(), curr.release());
    if p == c {
        // prev is a prerelease of curr
        return curr.clone();
    }
    let m = p.len().min(c.len());
    let i = match (0..m).find(|&k| p[k] != c[k]) {
        Some(i) => i,
        None => {
            // shared prefix, curr is longer: cut at the first component that
            // distinguishes curr from prev's zero-extension
            let mut i = p.len();
            while i < c.len() && c[i] == Component::Num(0) {
                i += 1;
            }
            i
        }
    };
    if i + 1 >= c.len() {
        // keep curr itself so a prerelease tag stays included
        curr.clone()
    } else {
        Version::from_release(c[..i + 1].to_vec())
    }
}

/// Condense a subset of known versions into ranges.
///
/// Both slices must be sorted and deduplicated, with `subset` a non-strict
/// subset of `universe`. The result contains every version of `subset`,
/// no other version of `universe`, and stays open towards versions the
/// universe does not know: a subset starting at the oldest known version
/// gets an unbounded lower end, one ending at the newest an unbounded
/// upper end.
pub fn condense(subset: &[Version], universe: &[Version]) -> VersionSet {
    if subset.is_empty() {
        return VersionSet::empty();
    }
    let position = |v: &Version| universe.binary_search(v).unwrap_or_else(|p| p);

    let mut ranges = Vec::new();
    let mut i = position(&subset[0]) + 1;
    let mut j = 1;
    let mut lower = if i == 1 {
        None
    } else {
        Some(best_lower_bound(&universe[i - 2], &subset[0]))
    };

    while j < subset.len() && i < universe.len() {
        if universe[i] != subset[j] {
            // a known version separates subset[j - 1] from subset[j]
            let upper = best_upper_bound(&subset[j - 1], &universe[i]);
            ranges.push(VersionRange::between(lower.take(), upper));
            i = position(&subset[j]);
            lower = Some(best_lower_bound(&universe[i - 1], &subset[j]));
        }
        i += 1;
        j += 1;
    }

    let upper = if i >= universe.len() {
        None
    } else {
        Some(best_upper_bound(&subset[subset.len() - 1], &universe[i]))
    };
    ranges.push(VersionRange::between(lower, upper));
    VersionSet::from_ranges(ranges)
}

/// Condense a subset of a package's PyPI versions into ranges.
///
/// Versions that cannot be represented on the Spack side (prereleases with
/// post/dev/local qualifiers) are dropped from both lists; the rest is
/// converted, sorted and handed to [`condense`].
pub fn condensed_version_set(
    subset: &[PackagingVersion],
    universe: &[PackagingVersion],
) -> VersionSet {
    let prepare = |versions: &[PackagingVersion]| {
        let mut out: Vec<Version> = versions
            .iter()
            .filter(|v| v.is_spack_representable())
            .map(PackagingVersion::to_spack)
            .collect();
        out.sort();
        out.dedup();
        out
    };
    condense(&prepare(subset), &prepare(universe))
}
