// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Version providers: where the known versions of a package come from.

use rustc_hash::FxHashMap;

use crate::error::LookupError;
use crate::version::{PackagingVersion, Version};

/// The package name that resolves against the built-in CPython release
/// table instead of a provider.
pub const PYTHON: &str = "python";

// Last patch release of each minor line, plus 4.0.0 as the open end.
const KNOWN_PYTHON_VERSIONS: [(u64, u64, u64); 9] = [
    (3, 6, 15),
    (3, 7, 17),
    (3, 8, 18),
    (3, 9, 18),
    (3, 10, 13),
    (3, 11, 7),
    (3, 12, 1),
    (3, 13, 0),
    (4, 0, 0),
];

/// The CPython releases that python-version markers resolve against.
pub fn python_releases() -> Vec<PackagingVersion> {
    KNOWN_PYTHON_VERSIONS
        .into_iter()
        .map(PackagingVersion::from)
        .collect()
}

/// Everything below this version is end-of-life and dropped from python
/// constraints.
pub fn unsupported_python_floor() -> Version {
    Version::from_release(vec![
        crate::version::Component::Num(3),
        crate::version::Component::Num(6),
    ])
}

/// Source of the known versions of a package.
///
/// Implementations return the versions in ascending order without
/// duplicates.
pub trait VersionLookup {
    /// All known versions of `package`.
    fn versions(&self, package: &str) -> Result<Vec<PackagingVersion>, LookupError>;
}

impl<T: VersionLookup + ?Sized> VersionLookup for &T {
    fn versions(&self, package: &str) -> Result<Vec<PackagingVersion>, LookupError> {
        (**self).versions(package)
    }
}

/// An in-memory version lookup, for tests and offline conversion.
#[derive(Debug, Clone, Default)]
pub struct StaticVersionLookup {
    versions: FxHashMap<String, Vec<PackagingVersion>>,
}

impl StaticVersionLookup {
    /// An empty lookup that knows no package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register versions for `package`, merging with anything already
    /// registered.
    pub fn add_versions(
        &mut self,
        package: impl Into<String>,
        versions: impl IntoIterator<Item = PackagingVersion>,
    ) {
        let list = self.versions.entry(package.into()).or_default();
        list.extend(versions);
        list.sort();
        list.dedup();
    }
}

impl VersionLookup for StaticVersionLookup {
    fn versions(&self, package: &str) -> Result<Vec<PackagingVersion>, LookupError> {
        self.versions
            .get(package)
            .cloned()
            .ok_or_else(|| LookupError::new(format!("no versions known for `{package}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_lookup_sorts_and_dedups() {
        let mut lookup = StaticVersionLookup::new();
        let parse = |s: &str| s.parse::<PackagingVersion>().unwrap();
        lookup.add_versions("pkg", ["2.0", "1.0"].map(parse));
        lookup.add_versions("pkg", ["1.5", "2.0"].map(parse));
        assert_eq!(
            lookup.versions("pkg").unwrap(),
            ["1.0", "1.5", "2.0"].map(parse).to_vec()
        );
        assert!(lookup.versions("other").is_err());
    }

    #[test]
    fn python_releases_are_ascending() {
        let releases = python_releases();
        assert!(releases.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(releases.len(), 9);
    }
}
