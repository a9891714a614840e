// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Requirements, dependency edges, and the table aggregating them.
//!
//! A [`Requirement`] is one already-parsed PyPI dependency declaration.
//! Converting it yields (main, condition) constraint pairs; the
//! [`DependencyTable`] aggregates those pairs across all versions of the
//! depending package and condenses, per distinct pair, the versions it was
//! observed for into the edge's `applies_to` range set.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use indexmap::IndexMap;

use crate::condense::condensed_version_set;
use crate::constraint::ConstraintExpr;
use crate::marker::MarkerExpr;
use crate::range::VersionSet;
use crate::specifier::SpecifierSet;
use crate::version::PackagingVersion;

/// A single dependency declaration: name, optional version specifier,
/// optional marker, and the extras requested from the dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Requirement {
    /// PyPI name of the required package.
    pub name: String,
    /// Version constraints, if any.
    pub specifier: Option<SpecifierSet>,
    /// Environment marker, if any.
    pub marker: Option<MarkerExpr>,
    /// Extras requested from the dependency itself.
    pub extras: Vec<String>,
}

impl Requirement {
    /// A bare requirement on `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specifier: None,
            marker: None,
            extras: Vec::new(),
        }
    }

    /// Attach a version specifier.
    pub fn with_specifier(mut self, specifier: SpecifierSet) -> Self {
        self.specifier = Some(specifier);
        self
    }

    /// Attach an environment marker.
    pub fn with_marker(mut self, marker: MarkerExpr) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Request an extra from the dependency.
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extras.push(extra.into());
        self
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(specifier) = &self.specifier {
            write!(f, "{specifier}")?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

/// When a dependency is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DepType {
    /// Needed to build the package.
    Build,
    /// Needed at runtime.
    Run,
    /// Needed to run the package's tests.
    Test,
}

impl Display for DepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DepType::Build => "build",
            DepType::Run => "run",
            DepType::Test => "test",
        };
        write!(f, "{s}")
    }
}

/// One aggregated dependency of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DependencyEdge {
    /// Spack name of the dependency.
    pub name: String,
    /// Constraints on the dependency itself.
    pub main: ConstraintExpr,
    /// Conditions on the depending package under which the edge applies.
    pub condition: ConstraintExpr,
    /// When the dependency is needed.
    pub dep_types: BTreeSet<DepType>,
    /// Versions of the depending package the edge was observed for.
    pub applies_to: VersionSet,
}

impl DependencyEdge {
    /// An edge applying to every version of the depending package.
    pub fn new(
        name: impl Into<String>,
        main: ConstraintExpr,
        condition: ConstraintExpr,
        dep_types: BTreeSet<DepType>,
    ) -> Self {
        Self {
            name: name.into(),
            main,
            condition,
            dep_types,
            applies_to: VersionSet::full(),
        }
    }
}

impl Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, when @{} {}", self.name, self.main, self.applies_to, self.condition)?;
        if !self.dep_types.is_empty() {
            write!(f, ", type=(")?;
            for (i, dep_type) in self.dep_types.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{dep_type}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Aggregates converted (main, condition) pairs across the versions of the
/// depending package, keeping the first-seen order of distinct pairs.
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    entries: IndexMap<
        (String, ConstraintExpr, ConstraintExpr),
        (BTreeSet<DepType>, Vec<PackagingVersion>),
    >,
}

impl DependencyTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `seen_for` declares this dependency pair.
    pub fn record(
        &mut self,
        name: impl Into<String>,
        main: ConstraintExpr,
        condition: ConstraintExpr,
        dep_types: impl IntoIterator<Item = DepType>,
        seen_for: &PackagingVersion,
    ) {
        let (types, versions) = self
            .entries
            .entry((name.into(), main, condition))
            .or_default();
        types.extend(dep_types);
        versions.push(seen_for.clone());
    }

    /// Turn the table into edges, condensing each pair's observed versions
    /// against `all_versions` of the depending package.
    pub fn finish(self, all_versions: &[PackagingVersion]) -> Vec<DependencyEdge> {
        let mut universe = all_versions.to_vec();
        universe.sort();
        universe.dedup();
        self.entries
            .into_iter()
            .map(|((name, main, condition), (dep_types, mut versions))| {
                versions.sort();
                versions.dedup();
                let applies_to = condensed_version_set(&versions, &universe);
                DependencyEdge {
                    name,
                    main,
                    condition,
                    dep_types,
                    applies_to,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn pv(s: &str) -> PackagingVersion {
        s.parse().unwrap()
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn requirement_display() {
        let requirement = Requirement::new("black")
            .with_extra("d")
            .with_specifier(">=22.6, <23".parse().unwrap())
            .with_marker(crate::marker::MarkerExpr::comparison(
                "python_version",
                crate::marker::MarkerOp::Ge,
                "3.8",
            ));
        assert_eq!(
            requirement.to_string(),
            "black[d]>=22.6, <23; python_version >= \"3.8\""
        );
    }

    #[test]
    fn table_aggregates_identical_pairs() {
        let mut table = DependencyTable::new();
        let main = ConstraintExpr::new().with_package_range("py-foo", VersionSet::full());
        let condition = ConstraintExpr::new();
        let all: Vec<PackagingVersion> = ["1.0", "1.1", "2.0"].iter().map(|s| pv(s)).collect();

        table.record("py-foo", main.clone(), condition.clone(), [DepType::Build], &all[0]);
        table.record("py-foo", main.clone(), condition.clone(), [DepType::Run], &all[1]);

        let edges = table.finish(&all);
        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert_eq!(
            edge.dep_types,
            BTreeSet::from([DepType::Build, DepType::Run])
        );
        // observed for 1.0 and 1.1 but not 2.0
        assert!(edge.applies_to.contains(&v("1.0")));
        assert!(edge.applies_to.contains(&v("1.1")));
        assert!(!edge.applies_to.contains(&v("2.0")));
    }

    #[test]
    fn table_splits_differing_pairs() {
        let mut table = DependencyTable::new();
        let wide = ConstraintExpr::new().with_package_range("py-foo", VersionSet::full());
        let narrow = ConstraintExpr::new()
            .with_package_range("py-foo", VersionSet::higher_than(v("2.0")));
        let condition = ConstraintExpr::new();
        let all: Vec<PackagingVersion> = ["1.0", "2.0"].iter().map(|s| pv(s)).collect();

        table.record("py-foo", wide, condition.clone(), [DepType::Run], &all[0]);
        table.record("py-foo", narrow, condition, [DepType::Run], &all[1]);

        let edges = table.finish(&all);
        assert_eq!(edges.len(), 2);
        assert!(edges[0].applies_to.contains(&v("1.0")));
        assert!(!edges[0].applies_to.contains(&v("2.0")));
        assert!(edges[1].applies_to.contains(&v("2.0")));
    }
}
