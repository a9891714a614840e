// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! PEP 440 version specifiers, e.g. `>=2.5, !=2.7.1`.
//!
//! Matching always considers prereleases. Wildcard (`==1.*`) and arbitrary
//! equality (`===`) comparators are rejected at parse time rather than
//! matched approximately.

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

use crate::version::{PackagingVersion, VersionParseError};

/// Comparison operator of a [`Specifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~=`, compatible release
    Compatible,
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Compatible => "~=",
        };
        write!(f, "{s}")
    }
}

/// A single comparator, e.g. `>=2.5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Specifier {
    /// The comparison operator.
    pub op: CompareOp,
    /// The version compared against.
    pub version: PackagingVersion,
}

fn without_local(v: &PackagingVersion) -> PackagingVersion {
    let mut v = v.clone();
    v.local = None;
    v
}

// candidate release prefix (zero padded) equals `prefix`
fn release_prefix_matches(candidate: &PackagingVersion, prefix: &[u64]) -> bool {
    prefix
        .iter()
        .enumerate()
        .all(|(i, &p)| candidate.release.get(i).copied().unwrap_or(0) == p)
}

impl Specifier {
    /// Whether `candidate` satisfies this comparator. Prereleases are
    /// treated like any other version.
    pub fn matches(&self, candidate: &PackagingVersion) -> bool {
        match self.op {
            CompareOp::Eq => {
                if self.version.local.is_none() {
                    without_local(candidate) == self.version
                } else {
                    candidate == &self.version
                }
            }
            CompareOp::Ne => {
                !Specifier {
                    op: CompareOp::Eq,
                    version: self.version.clone(),
                }
                .matches(candidate)
            }
            CompareOp::Lt => without_local(candidate) < without_local(&self.version),
            CompareOp::Le => without_local(candidate) <= without_local(&self.version),
            CompareOp::Gt => without_local(candidate) > without_local(&self.version),
            CompareOp::Ge => without_local(candidate) >= without_local(&self.version),
            CompareOp::Compatible => {
                // `~=N` needs a component to drop; a hand-built bare
                // release matches nothing
                let Some((_, prefix)) = self.version.release.split_last() else {
                    return false;
                };
                candidate.epoch == self.version.epoch
                    && without_local(candidate) >= without_local(&self.version)
                    && release_prefix_matches(candidate, prefix)
            }
        }
    }
}

impl Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// Error creating a [`Specifier`] or [`SpecifierSet`] from a string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecifierParseError {
    /// The comparator has no recognized operator prefix.
    #[error("missing or unknown operator in `{0}`")]
    MissingOperator(String),
    /// `===` compares version strings verbatim and cannot be translated.
    #[error("arbitrary equality `{0}` is not supported")]
    ArbitraryEquality(String),
    /// Wildcard comparators (`==1.*`) are not supported.
    #[error("wildcard comparator `{0}` is not supported")]
    Wildcard(String),
    /// `~=` needs at least two release components to be meaningful.
    #[error("compatible release `{0}` needs at least two release components")]
    CompatibleTooShort(String),
    /// The version part failed to parse.
    #[error(transparent)]
    Version(#[from] VersionParseError),
}

impl FromStr for Specifier {
    type Err = SpecifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("===") {
            return Err(SpecifierParseError::ArbitraryEquality(s.to_string()));
        }
        let (op, rest) = [
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("~=", CompareOp::Compatible),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
        ]
        .iter()
        .find_map(|(prefix, op)| s.strip_prefix(prefix).map(|rest| (*op, rest)))
        .ok_or_else(|| SpecifierParseError::MissingOperator(s.to_string()))?;
        let rest = rest.trim();
        if rest.ends_with(".*") || rest.ends_with('*') {
            return Err(SpecifierParseError::Wildcard(s.to_string()));
        }
        let version: PackagingVersion = rest.parse()?;
        if op == CompareOp::Compatible && version.release.len() < 2 {
            return Err(SpecifierParseError::CompatibleTooShort(s.to_string()));
        }
        Ok(Self { op, version })
    }
}

/// A comma-separated conjunction of comparators. The empty set matches
/// every version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpecifierSet(pub Vec<Specifier>);

impl SpecifierSet {
    /// Whether `candidate` satisfies every comparator.
    pub fn matches(&self, candidate: &PackagingVersion) -> bool {
        self.0.iter().all(|s| s.matches(candidate))
    }
}

impl FromStr for SpecifierSet {
    type Err = SpecifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Specifier::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, specifier) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{specifier}")?;
        }
        Ok(())
    }
}
