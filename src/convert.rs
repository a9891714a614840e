// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The converter: requirements in, constraint pairs out.
//!
//! [`Converter`] owns a [`VersionLookup`] and per-run memo caches, resolves
//! specifiers against the known versions of a package, folds marker trees
//! into [`MarkerEval`]s, and turns whole requirements into
//! `(main, condition)` constraint pairs.

use rustc_hash::FxHashMap;

use crate::condense::condensed_version_set;
use crate::constraint::{intersect_all, union_all, ConstraintExpr};
use crate::error::ConversionError;
use crate::marker::{
    eval_extra, eval_implementation, eval_platform, MarkerAtom, MarkerEval, MarkerExpr, MarkerOp,
};
use crate::provider::{python_releases, unsupported_python_floor, VersionLookup, PYTHON};
use crate::range::VersionSet;
use crate::requirement::Requirement;
use crate::specifier::{CompareOp, Specifier, SpecifierSet};
use crate::version::PackagingVersion;

/// Map a PyPI package name to its Spack package name.
///
/// Separator runs collapse to `-`, the name is lowercased, and a `py-`
/// prefix is added unless the name is `python` or already carries one.
/// Three packages genuinely start with `py-` and get a second prefix.
pub fn spack_name(name: &str) -> String {
    const DOUBLE_PY_PREFIX: [&str; 3] = ["py-cpuinfo", "py-tes", "py-spy"];

    let mut simplified = String::with_capacity(name.len() + 3);
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !simplified.ends_with('-') && !simplified.is_empty() {
                simplified.push('-');
            }
        } else {
            simplified.push(c.to_ascii_lowercase());
        }
    }

    if simplified != "python"
        && (!simplified.starts_with("py-") || DOUBLE_PY_PREFIX.contains(&simplified.as_str()))
    {
        simplified.insert_str(0, "py-");
    }
    simplified
}

/// Translates requirements against the versions a provider knows.
///
/// The caches memoize version lookups and specifier resolutions for the
/// lifetime of the converter, so repeated runs over the same inputs return
/// identical results without hitting the provider again.
pub struct Converter<P> {
    provider: P,
    version_memo: FxHashMap<String, Vec<PackagingVersion>>,
    specifier_memo: FxHashMap<(String, SpecifierSet), VersionSet>,
}

impl<P: VersionLookup> Converter<P> {
    /// Create a converter over `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            version_memo: FxHashMap::default(),
            specifier_memo: FxHashMap::default(),
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// All known versions of `package`, ascending and deduplicated.
    /// `python` resolves against the built-in CPython table.
    pub fn package_versions(
        &mut self,
        package: &str,
    ) -> Result<Vec<PackagingVersion>, ConversionError> {
        if let Some(versions) = self.version_memo.get(package) {
            return Ok(versions.clone());
        }
        let mut versions = if package == PYTHON {
            python_releases()
        } else {
            self.provider
                .versions(package)
                .map_err(|source| ConversionError::Lookup {
                    package: package.to_string(),
                    source,
                })?
        };
        versions.sort();
        versions.dedup();
        self.version_memo
            .insert(package.to_string(), versions.clone());
        Ok(versions)
    }

    /// Resolve a specifier set against the known versions of `package`:
    /// the returned set contains every known version matching the
    /// specifiers and no known version that does not. The empty set means
    /// nothing matched.
    pub fn version_set(
        &mut self,
        package: &str,
        specifier: &SpecifierSet,
    ) -> Result<VersionSet, ConversionError> {
        let key = (package.to_string(), specifier.clone());
        if let Some(set) = self.specifier_memo.get(&key) {
            return Ok(set.clone());
        }
        let all = self.package_versions(package)?;
        let matching: Vec<PackagingVersion> = all
            .iter()
            .filter(|v| specifier.matches(v))
            .cloned()
            .collect();
        let set = if matching.is_empty() {
            VersionSet::empty()
        } else {
            condensed_version_set(&matching, &all)
        };
        self.specifier_memo.insert(key, set.clone());
        Ok(set)
    }

    fn eval_python(&mut self, op: MarkerOp, value: &str) -> MarkerEval {
        let op = match op {
            MarkerOp::Eq => CompareOp::Eq,
            MarkerOp::Ne => CompareOp::Ne,
            MarkerOp::Lt => CompareOp::Lt,
            MarkerOp::Le => CompareOp::Le,
            MarkerOp::Gt => CompareOp::Gt,
            MarkerOp::Ge => CompareOp::Ge,
            // `in` / `not in` do string matching, `~=` is not meaningful here
            _ => return MarkerEval::Unknown,
        };
        let version: PackagingVersion = match value.parse() {
            Ok(version) => version,
            Err(_) => {
                log::warn!("could not parse `{value}` as a python version");
                return MarkerEval::Unknown;
            }
        };
        let specifier = SpecifierSet(vec![Specifier { op, version }]);
        let set = match self.version_set(PYTHON, &specifier) {
            Ok(set) => set,
            Err(_) => return MarkerEval::Unknown,
        };
        let set = set.simplify_below(&unsupported_python_floor());
        if set.is_empty() {
            MarkerEval::Static(false)
        } else if set.is_full() {
            MarkerEval::Static(true)
        } else {
            MarkerEval::Disjunction(vec![
                ConstraintExpr::new().with_package_range(PYTHON, set)
            ])
        }
    }

    fn eval_atom(&mut self, atom: &MarkerAtom) -> MarkerEval {
        let Some((variable, op, value)) = atom.normalized() else {
            return MarkerEval::Unknown;
        };
        match variable {
            "implementation_name" | "platform_python_implementation" => {
                eval_implementation(op, value)
            }
            "platform_system" | "sys_platform" => eval_platform(op, value),
            "python_version" | "python_full_version" => self.eval_python(op, value),
            "extra" => eval_extra(op, value),
            _ => MarkerEval::Unknown,
        }
    }

    fn eval_and(&mut self, parts: &[MarkerExpr]) -> MarkerEval {
        let Some((first, rest)) = parts.split_first() else {
            return MarkerEval::Static(true);
        };
        let mut lhs = self.evaluate_marker(first);
        if lhs == MarkerEval::Static(false) {
            return lhs;
        }
        for part in rest {
            let rhs = self.evaluate_marker(part);
            lhs = match (lhs, rhs) {
                // false absorbs, even over unknown
                (MarkerEval::Static(false), _) | (_, MarkerEval::Static(false)) => {
                    return MarkerEval::Static(false);
                }
                // unknown poisons true and constraints alike
                (MarkerEval::Unknown, _) | (_, MarkerEval::Unknown) => MarkerEval::Unknown,
                (kept, MarkerEval::Static(true)) => kept,
                (MarkerEval::Static(true), kept) => kept,
                (MarkerEval::Disjunction(a), MarkerEval::Disjunction(b)) => {
                    let merged = intersect_all(&a, &b);
                    if merged.is_empty() {
                        return MarkerEval::Static(false);
                    }
                    MarkerEval::Disjunction(merged)
                }
            };
        }
        lhs
    }

    fn eval_or(&mut self, parts: &[MarkerExpr]) -> MarkerEval {
        let Some((first, rest)) = parts.split_first() else {
            return MarkerEval::Static(false);
        };
        let mut lhs = self.evaluate_marker(first);
        if lhs == MarkerEval::Static(true) {
            return lhs;
        }
        for part in rest {
            let rhs = self.evaluate_marker(part);
            lhs = match (lhs, rhs) {
                (MarkerEval::Static(true), _) | (_, MarkerEval::Static(true)) => {
                    return MarkerEval::Static(true);
                }
                (MarkerEval::Unknown, _) | (_, MarkerEval::Unknown) => MarkerEval::Unknown,
                (kept, MarkerEval::Static(false)) => kept,
                (MarkerEval::Static(false), kept) => kept,
                (MarkerEval::Disjunction(a), MarkerEval::Disjunction(b)) => {
                    MarkerEval::Disjunction(union_all(a, b))
                }
            };
        }
        lhs
    }

    /// Evaluate a marker tree: statically true or false, untranslatable,
    /// or a disjunction of constraints under which the marker holds.
    pub fn evaluate_marker(&mut self, marker: &MarkerExpr) -> MarkerEval {
        match marker {
            MarkerExpr::Atom(atom) => self.eval_atom(atom),
            MarkerExpr::And(parts) => self.eval_and(parts),
            MarkerExpr::Or(parts) => self.eval_or(parts),
        }
    }

    /// Convert one requirement into `(main, condition)` constraint pairs.
    ///
    /// A statically false marker yields no pairs; an untranslatable one is
    /// an error, as is a specifier no known version satisfies. `from_extra`
    /// names the extra of the depending package the requirement belongs
    /// to, and becomes a required flag on every condition.
    pub fn convert_requirement(
        &mut self,
        requirement: &Requirement,
        from_extra: Option<&str>,
    ) -> Result<Vec<(ConstraintExpr, ConstraintExpr)>, ConversionError> {
        let mut conditions = vec![ConstraintExpr::new()];
        if let Some(marker) = &requirement.marker {
            match self.evaluate_marker(marker) {
                MarkerEval::Static(false) => return Ok(Vec::new()),
                MarkerEval::Static(true) => {}
                MarkerEval::Unknown => {
                    return Err(ConversionError::UntranslatableMarker {
                        marker: marker.clone(),
                        requirement: requirement.clone(),
                    });
                }
                MarkerEval::Disjunction(exprs) => conditions = exprs,
            }
        }
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let mut main = ConstraintExpr::new();
        for extra in &requirement.extras {
            main.set_flag(extra.clone(), true);
        }
        let range = match &requirement.specifier {
            Some(specifier) => {
                let set = self.version_set(&requirement.name, specifier)?;
                if set.is_empty() {
                    return Err(ConversionError::NoMatchingVersion {
                        package: requirement.name.clone(),
                        specifier: specifier.clone(),
                        requirement: requirement.clone(),
                    });
                }
                set
            }
            None => VersionSet::full(),
        };
        main.set_package_range(spack_name(&requirement.name), range);

        if let Some(extra) = from_extra {
            for condition in &mut conditions {
                condition.set_flag(extra, true);
            }
        }
        Ok(conditions
            .into_iter()
            .map(|condition| (main.clone(), condition))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_mapping() {
        for (pypi, spack) in [
            ("black", "py-black"),
            ("Flask", "py-flask"),
            ("typing_extensions", "py-typing-extensions"),
            ("ruamel.yaml", "py-ruamel-yaml"),
            ("python", "python"),
            ("pytest", "py-pytest"),
            ("py-cpuinfo", "py-py-cpuinfo"),
            ("py-spy", "py-py-spy"),
            ("pybind11", "py-pybind11"),
        ] {
            assert_eq!(spack_name(pypi), spack, "{pypi}");
        }
    }
}
