// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Translating PyPI packaging requirements into Spack dependency
//! constraints.
//!
//! A PyPI requirement constrains a dependency with a version specifier
//! (`>=2.5, !=2.7.1`) and an environment marker
//! (`python_version >= "3.8" and sys_platform != "win32"`). Spack instead
//! wants explicit version ranges, platform conditions and variant flags.
//! This crate performs that translation exactly: the produced ranges admit
//! every known version the specifier admits and exclude every known
//! version it excludes, while staying open towards versions that are not
//! known yet.
//!
//! # Versions and ranges
//!
//! Two version types cover the two ecosystems. [`PackagingVersion`] is the
//! PEP 440 value found on PyPI, where `2.0` and `2.0.0` are the same
//! version. [`Version`] is the Spack-style value on the output side, where
//! `2.0 < 2.0.0 < 2.0.0.1`: a shorter version sorts below its extensions,
//! which is what allows half-open [`VersionRange`]s to cut exactly between
//! a version and a longer sibling. A [`VersionSet`] is a normalized list
//! of such ranges, with the usual set algebra on top.
//!
//! # Condensing
//!
//! The heart of the translation is [`condense`]: given the subset of a
//! package's known versions that satisfy a requirement, it produces the
//! most general set of ranges matching exactly that subset. Bounds are cut
//! as high in the version hierarchy as the known versions allow, so
//! `{1.2, 1.3, 1.4}` out of `{1.1, ..., 1.4, 2.0}` becomes `>=1.2, <2`
//! rather than an enumeration, and unknown patch releases in between stay
//! admitted.
//!
//! # Markers
//!
//! Environment markers are expression trees ([`MarkerExpr`]) evaluated by
//! a [`Converter`] into a [`MarkerEval`]: statically true or false (only
//! CPython exists, platforms are a fixed enumeration), untranslatable, or
//! a disjunction of [`ConstraintExpr`]s combining python version ranges,
//! `platform=` conditions and variant flags.
//!
//! # Converting a requirement
//!
//! ```ignore
//! let mut lookup = StaticVersionLookup::new();
//! lookup.add_versions("black", black_releases);
//! let mut converter = Converter::new(lookup);
//!
//! let requirement = Requirement::new("black")
//!     .with_specifier(">=22.6".parse()?)
//!     .with_marker(MarkerExpr::comparison("python_version", MarkerOp::Ge, "3.8"));
//! for (main, condition) in converter.convert_requirement(&requirement, None)? {
//!     println!("depends_on {main} when {condition}");
//! }
//! ```
//!
//! Requirements collected over many versions of the depending package go
//! through a [`DependencyTable`], which aggregates identical
//! `(main, condition)` pairs and condenses the versions each pair was
//! observed for into the edge's applicability range. [`find_conflicts`]
//! then flags pairs of edges that can apply at the same time but admit no
//! common version of the dependency.

#![warn(missing_docs)]

pub mod condense;
pub mod conflict;
pub mod constraint;
pub mod convert;
pub mod error;
pub mod marker;
pub mod provider;
pub mod range;
pub mod requirement;
pub mod specifier;
pub mod version;

pub use crate::condense::{condense, condensed_version_set};
pub use crate::conflict::find_conflicts;
pub use crate::constraint::{ConstraintExpr, Platform};
pub use crate::convert::{spack_name, Converter};
pub use crate::error::{ConflictError, ConversionError, LookupError};
pub use crate::marker::{MarkerEval, MarkerExpr, MarkerOp};
pub use crate::provider::{StaticVersionLookup, VersionLookup};
pub use crate::range::{VersionRange, VersionSet};
pub use crate::requirement::{DepType, DependencyEdge, DependencyTable, Requirement};
pub use crate::specifier::{Specifier, SpecifierSet};
pub use crate::version::{PackagingVersion, Version};
