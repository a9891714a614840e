// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conjunctive dependency constraints and the algebra over lists of them.
//!
//! A [`ConstraintExpr`] is a conjunction: version ranges per package, an
//! optional platform equality, and boolean flag requirements. A list of
//! expressions is read as a disjunction; [`intersect_all`] and
//! [`union_all`] combine such lists.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use indexmap::IndexSet;

use crate::range::VersionSet;

/// A target platform, as named in `platform=` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Platform {
    /// Linux.
    Linux,
    /// macOS.
    Darwin,
    /// Windows.
    Windows,
    /// FreeBSD.
    Freebsd,
}

impl Platform {
    /// Every known platform.
    pub const ALL: [Platform; 4] = [
        Platform::Linux,
        Platform::Darwin,
        Platform::Windows,
        Platform::Freebsd,
    ];

    /// Resolve a marker value such as `win32` or `Linux` to a platform.
    pub fn from_marker_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "linux" | "linux2" => Some(Platform::Linux),
            "darwin" => Some(Platform::Darwin),
            "windows" | "win32" => Some(Platform::Windows),
            "freebsd" => Some(Platform::Freebsd),
            _ => None,
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Windows => "windows",
            Platform::Freebsd => "freebsd",
        };
        write!(f, "{s}")
    }
}

/// A conjunction of dependency constraints.
///
/// The default value is the empty conjunction, which is always satisfied.
/// Structural equality is order-independent thanks to the sorted maps, so
/// two expressions constraining the same things compare and hash equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintExpr {
    packages: BTreeMap<String, VersionSet>,
    platform: Option<Platform>,
    flags: BTreeMap<String, bool>,
}

impl ConstraintExpr {
    /// The empty conjunction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version range constraint for `package`.
    pub fn with_package_range(mut self, package: impl Into<String>, set: VersionSet) -> Self {
        self.set_package_range(package, set);
        self
    }

    /// Add a platform equality.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Add a flag requirement, `true` for `+flag`, `false` for `~flag`.
    pub fn with_flag(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.set_flag(flag, enabled);
        self
    }

    /// Set the version range constraint for `package`.
    pub fn set_package_range(&mut self, package: impl Into<String>, set: VersionSet) {
        self.packages.insert(package.into(), set);
    }

    /// Set a flag requirement.
    pub fn set_flag(&mut self, flag: impl Into<String>, enabled: bool) {
        self.flags.insert(flag.into(), enabled);
    }

    /// Per-package version range constraints.
    pub fn packages(&self) -> &BTreeMap<String, VersionSet> {
        &self.packages
    }

    /// The version range constraint on `package`, if any.
    pub fn package_range(&self, package: &str) -> Option<&VersionSet> {
        self.packages.get(package)
    }

    /// The platform equality, if any.
    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    /// The flag requirements.
    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }

    /// Whether this is the empty conjunction.
    pub fn is_unconstrained(&self) -> bool {
        self.packages.is_empty() && self.platform.is_none() && self.flags.is_empty()
    }

    /// Conjoin two expressions, `None` when they contradict each other:
    /// different platforms, opposite flag polarities, or a shared package
    /// whose ranges do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let platform = match (self.platform, other.platform) {
            (Some(a), Some(b)) if a != b => return None,
            (a, b) => a.or(b),
        };
        let mut flags = self.flags.clone();
        for (name, &enabled) in &other.flags {
            match flags.entry(name.clone()) {
                Entry::Occupied(existing) => {
                    if *existing.get() != enabled {
                        return None;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(enabled);
                }
            }
        }
        let mut packages = self.packages.clone();
        for (name, set) in &other.packages {
            match packages.entry(name.clone()) {
                Entry::Occupied(mut existing) => {
                    let merged = existing.get().intersection(set);
                    if merged.is_empty() {
                        return None;
                    }
                    existing.insert(merged);
                }
                Entry::Vacant(slot) => {
                    slot.insert(set.clone());
                }
            }
        }
        Some(Self {
            packages,
            platform,
            flags,
        })
    }
}

impl Display for ConstraintExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unconstrained() {
            return write!(f, "*");
        }
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| {
            if first {
                first = false;
                Ok(())
            } else {
                write!(f, " ")
            }
        };
        if let Some(platform) = self.platform {
            sep(f)?;
            write!(f, "platform={platform}")?;
        }
        for (flag, &enabled) in &self.flags {
            sep(f)?;
            write!(f, "{}{flag}", if enabled { '+' } else { '~' })?;
        }
        for (package, set) in &self.packages {
            sep(f)?;
            write!(f, "{package}@{set}")?;
        }
        Ok(())
    }
}

/// Conjoin two disjunction lists: `(a or b) and (c or d)` expands to the
/// pairwise intersections, dropping contradictions and duplicates. An
/// empty result means the combination is unsatisfiable.
pub fn intersect_all(lhs: &[ConstraintExpr], rhs: &[ConstraintExpr]) -> Vec<ConstraintExpr> {
    let mut out = IndexSet::new();
    for left in lhs {
        for right in rhs {
            if let Some(merged) = left.intersect(right) {
                out.insert(merged);
            }
        }
    }
    out.into_iter().collect()
}

/// Disjoin two disjunction lists: `(a or b) or (c or d)` is the
/// deduplicated concatenation, except that a right-hand side consisting of
/// a single version range on one package folds into the left disjuncts'
/// range for that same package instead of adding an alternative.
pub fn union_all(mut lhs: Vec<ConstraintExpr>, rhs: Vec<ConstraintExpr>) -> Vec<ConstraintExpr> {
    if let [single] = rhs.as_slice() {
        if single.platform.is_none() && single.flags.is_empty() && single.packages.len() == 1 {
            if let Some((package, set)) = single.packages.iter().next() {
                for expr in &mut lhs {
                    if let Some(existing) = expr.packages.get_mut(package) {
                        *existing = existing.union(set);
                    }
                }
                return lhs;
            }
        }
    }
    let mut out: IndexSet<ConstraintExpr> = lhs.into_iter().collect();
    out.extend(rhs);
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn python(range: VersionSet) -> ConstraintExpr {
        ConstraintExpr::new().with_package_range("python", range)
    }

    #[test]
    fn intersect_merges_and_detects_contradictions() {
        let linux = ConstraintExpr::new().with_platform(Platform::Linux);
        let windows = ConstraintExpr::new().with_platform(Platform::Windows);
        assert_eq!(linux.intersect(&windows), None);

        let plus = ConstraintExpr::new().with_flag("extra", true);
        let minus = ConstraintExpr::new().with_flag("extra", false);
        assert_eq!(plus.intersect(&minus), None);

        let merged = linux.intersect(&plus).unwrap();
        assert_eq!(merged.platform(), Some(Platform::Linux));
        assert_eq!(merged.flags().get("extra"), Some(&true));

        let low = python(VersionSet::strictly_lower_than(v("3.8")));
        let high = python(VersionSet::higher_than(v("3.8")));
        assert_eq!(low.intersect(&high), None);
        let mid = python(VersionSet::higher_than(v("3.6")));
        assert_eq!(
            low.intersect(&mid).unwrap().package_range("python"),
            Some(&VersionSet::between(v("3.6"), v("3.8")))
        );
    }

    #[test]
    fn intersect_all_is_a_cross_product() {
        let lhs = vec![
            ConstraintExpr::new().with_platform(Platform::Linux),
            ConstraintExpr::new().with_platform(Platform::Darwin),
        ];
        let rhs = vec![python(VersionSet::higher_than(v("3.8")))];
        let out = intersect_all(&lhs, &rhs);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.package_range("python").is_some()));

        // contradictions disappear, possibly leaving nothing
        let windows = vec![ConstraintExpr::new().with_platform(Platform::Windows)];
        assert!(intersect_all(&lhs, &windows).is_empty());
    }

    #[test]
    fn union_folds_single_range_into_existing() {
        let lhs = vec![
            python(VersionSet::strictly_lower_than(v("3.8"))).with_platform(Platform::Linux),
            ConstraintExpr::new().with_flag("extra", true),
        ];
        let rhs = vec![python(VersionSet::higher_than(v("3.10")))];
        let out = union_all(lhs.clone(), rhs);
        assert_eq!(out.len(), 2);
        let folded = VersionSet::strictly_lower_than(v("3.8"))
            .union(&VersionSet::higher_than(v("3.10")));
        assert_eq!(out[0].package_range("python"), Some(&folded));
        // the disjunct without a python range is already weaker
        assert_eq!(out[1], lhs[1]);
    }

    #[test]
    fn union_drops_single_range_on_unmentioned_package() {
        // the compaction is deliberately lossy: a lone range on a package
        // no left disjunct constrains does not become an alternative
        let lhs = vec![ConstraintExpr::new().with_platform(Platform::Windows)];
        let rhs = vec![python(VersionSet::higher_than(v("3.10")))];
        assert_eq!(union_all(lhs.clone(), rhs), lhs);
    }

    #[test]
    fn union_concatenates_and_dedups_otherwise() {
        let linux = ConstraintExpr::new().with_platform(Platform::Linux);
        let darwin = ConstraintExpr::new().with_platform(Platform::Darwin);
        let out = union_all(
            vec![linux.clone(), darwin.clone()],
            vec![darwin.clone(), linux.clone()],
        );
        assert_eq!(out, vec![linux, darwin]);
    }

    #[test]
    fn structural_equality_ignores_build_order() {
        let a = ConstraintExpr::new()
            .with_flag("a", true)
            .with_flag("b", false);
        let b = ConstraintExpr::new()
            .with_flag("b", false)
            .with_flag("a", true);
        assert_eq!(a, b);
    }

    #[test]
    fn display_is_readable() {
        let expr = ConstraintExpr::new()
            .with_platform(Platform::Linux)
            .with_flag("docs", true)
            .with_package_range("python", VersionSet::higher_than(v("3.8")));
        assert_eq!(expr.to_string(), "platform=linux +docs python@>=3.8");
        assert_eq!(ConstraintExpr::new().to_string(), "*");
    }
}
