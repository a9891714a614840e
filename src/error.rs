// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors reported while translating requirements.

use thiserror::Error;

use crate::marker::MarkerExpr;
use crate::requirement::{DependencyEdge, Requirement};
use crate::specifier::SpecifierSet;

/// A version lookup against a package index failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LookupError {
    /// What went wrong, as reported by the provider.
    pub message: String,
}

impl LookupError {
    /// Create a lookup error from a provider message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A requirement could not be translated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// No known version of the package satisfies the specifier.
    #[error("no matching versions for `{requirement}`: nothing known for `{package}` satisfies `{specifier}`")]
    NoMatchingVersion {
        /// The package whose versions were searched.
        package: String,
        /// The specifier nothing matched.
        specifier: SpecifierSet,
        /// The requirement being translated.
        requirement: Requirement,
    },
    /// The requirement's marker has no translation.
    #[error("unable to convert marker `{marker}` for dependency `{requirement}`")]
    UntranslatableMarker {
        /// The marker that could not be translated.
        marker: MarkerExpr,
        /// The requirement being translated.
        requirement: Requirement,
    },
    /// The version provider failed.
    #[error("could not look up versions of `{package}`")]
    Lookup {
        /// The package whose versions were requested.
        package: String,
        /// The provider's error.
        #[source]
        source: LookupError,
    },
}

/// Two dependency edges on the same package contradict each other: their
/// conditions can hold at once, yet no version satisfies both.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("conflicting requirements for `{name}`: `{first}` and `{second}`")]
pub struct ConflictError {
    /// The dependency both edges constrain.
    pub name: String,
    /// One of the conflicting edges.
    pub first: DependencyEdge,
    /// The other conflicting edge.
    pub second: DependencyEdge,
}
