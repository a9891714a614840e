// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Environment marker expressions and their evaluation results.
//!
//! Markers are the `; python_version >= "3.8" and sys_platform != "win32"`
//! part of a PyPI requirement. They are represented as an explicit
//! expression tree of atoms combined with `and`/`or`. Evaluation yields a
//! [`MarkerEval`]: statically true or false, untranslatable, or a
//! disjunction of [`ConstraintExpr`]s.

use std::fmt::{self, Display};

use crate::constraint::{ConstraintExpr, Platform};

/// Comparison operator of a marker atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerOp {
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
    /// `~=`
    Compatible,
    /// `in`, substring matching on the raw strings
    In,
    /// `not in`
    NotIn,
}

impl MarkerOp {
    /// The operator with its operands swapped, `None` when swapping has no
    /// equivalent (`in` / `not in`).
    pub fn flipped(self) -> Option<Self> {
        match self {
            MarkerOp::Lt => Some(MarkerOp::Gt),
            MarkerOp::Gt => Some(MarkerOp::Lt),
            MarkerOp::Le => Some(MarkerOp::Ge),
            MarkerOp::Ge => Some(MarkerOp::Le),
            MarkerOp::Eq | MarkerOp::Ne | MarkerOp::Compatible => Some(self),
            MarkerOp::In | MarkerOp::NotIn => None,
        }
    }
}

impl Display for MarkerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarkerOp::Eq => "==",
            MarkerOp::Ne => "!=",
            MarkerOp::Lt => "<",
            MarkerOp::Le => "<=",
            MarkerOp::Gt => ">",
            MarkerOp::Ge => ">=",
            MarkerOp::Compatible => "~=",
            MarkerOp::In => "in",
            MarkerOp::NotIn => "not in",
        };
        write!(f, "{s}")
    }
}

/// One side of a marker atom: an environment variable or a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerOperand {
    /// An environment variable such as `python_version`.
    Variable(String),
    /// A quoted string literal.
    Literal(String),
}

impl Display for MarkerOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerOperand::Variable(name) => write!(f, "{name}"),
            MarkerOperand::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}

/// A single `lhs op rhs` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerAtom {
    /// Left operand.
    pub lhs: MarkerOperand,
    /// Comparison operator.
    pub op: MarkerOp,
    /// Right operand.
    pub rhs: MarkerOperand,
}

impl MarkerAtom {
    /// Bring the atom into variable-on-the-left form, flipping the operator
    /// when the literal is on the left. `None` when no such form exists.
    pub fn normalized(&self) -> Option<(&str, MarkerOp, &str)> {
        match (&self.lhs, &self.rhs) {
            (MarkerOperand::Variable(var), MarkerOperand::Literal(lit)) => {
                Some((var, self.op, lit))
            }
            (MarkerOperand::Literal(lit), MarkerOperand::Variable(var)) => {
                match self.op.flipped() {
                    Some(op) => Some((var, op, lit)),
                    None => {
                        log::warn!("do not know how to evaluate `{self}`");
                        None
                    }
                }
            }
            _ => {
                log::warn!("do not know how to evaluate `{self}`");
                None
            }
        }
    }
}

impl Display for MarkerAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

/// A marker expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerExpr {
    /// A single comparison.
    Atom(MarkerAtom),
    /// Conjunction of subexpressions.
    And(Vec<MarkerExpr>),
    /// Disjunction of subexpressions.
    Or(Vec<MarkerExpr>),
}

impl MarkerExpr {
    /// A comparison between a variable and a literal.
    pub fn atom(lhs: MarkerOperand, op: MarkerOp, rhs: MarkerOperand) -> Self {
        Self::Atom(MarkerAtom { lhs, op, rhs })
    }

    /// `variable op "literal"`, the common case.
    pub fn comparison(variable: impl Into<String>, op: MarkerOp, literal: impl Into<String>) -> Self {
        Self::atom(
            MarkerOperand::Variable(variable.into()),
            op,
            MarkerOperand::Literal(literal.into()),
        )
    }

    /// Conjunction of subexpressions.
    pub fn and(parts: Vec<MarkerExpr>) -> Self {
        Self::And(parts)
    }

    /// Disjunction of subexpressions.
    pub fn or(parts: Vec<MarkerExpr>) -> Self {
        Self::Or(parts)
    }
}

impl Display for MarkerExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn group(
            f: &mut fmt::Formatter<'_>,
            parts: &[MarkerExpr],
            joiner: &str,
        ) -> fmt::Result {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {joiner} ")?;
                }
                match part {
                    MarkerExpr::Atom(atom) => write!(f, "{atom}")?,
                    nested => write!(f, "({nested})")?,
                }
            }
            Ok(())
        }
        match self {
            MarkerExpr::Atom(atom) => write!(f, "{atom}"),
            MarkerExpr::And(parts) => group(f, parts, "and"),
            MarkerExpr::Or(parts) => group(f, parts, "or"),
        }
    }
}

/// Result of evaluating a marker (sub)expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerEval {
    /// The marker is decided regardless of the environment.
    Static(bool),
    /// The marker cannot be translated.
    Unknown,
    /// The marker holds on the disjunction of these constraints.
    Disjunction(Vec<ConstraintExpr>),
}

pub(crate) fn eval_implementation(op: MarkerOp, value: &str) -> MarkerEval {
    // cpython is the only interpreter there is a package for
    match op {
        MarkerOp::Eq => MarkerEval::Static(value.eq_ignore_ascii_case("cpython")),
        MarkerOp::Ne => MarkerEval::Static(!value.eq_ignore_ascii_case("cpython")),
        _ => MarkerEval::Unknown,
    }
}

pub(crate) fn eval_platform(op: MarkerOp, value: &str) -> MarkerEval {
    if !matches!(op, MarkerOp::Eq | MarkerOp::Ne) {
        return MarkerEval::Unknown;
    }
    match Platform::from_marker_value(value) {
        Some(platform) => MarkerEval::Disjunction(
            Platform::ALL
                .iter()
                .filter(|p| (**p == platform) == (op == MarkerOp::Eq))
                .map(|p| ConstraintExpr::new().with_platform(*p))
                .collect(),
        ),
        // a platform outside the enumeration never occurs
        None => MarkerEval::Static(op == MarkerOp::Ne),
    }
}

pub(crate) fn eval_extra(op: MarkerOp, value: &str) -> MarkerEval {
    match op {
        MarkerOp::Eq => {
            MarkerEval::Disjunction(vec![ConstraintExpr::new().with_flag(value, true)])
        }
        MarkerOp::Ne => {
            MarkerEval::Disjunction(vec![ConstraintExpr::new().with_flag(value, false)])
        }
        _ => MarkerEval::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_flips_literal_on_the_left() {
        let atom = MarkerAtom {
            lhs: MarkerOperand::Literal("3.8".into()),
            op: MarkerOp::Le,
            rhs: MarkerOperand::Variable("python_version".into()),
        };
        assert_eq!(atom.normalized(), Some(("python_version", MarkerOp::Ge, "3.8")));

        let unflippable = MarkerAtom {
            lhs: MarkerOperand::Literal("win".into()),
            op: MarkerOp::In,
            rhs: MarkerOperand::Variable("sys_platform".into()),
        };
        assert_eq!(unflippable.normalized(), None);
    }

    #[test]
    fn platform_equality_and_inequality() {
        let eq = eval_platform(MarkerOp::Eq, "linux");
        assert_eq!(
            eq,
            MarkerEval::Disjunction(vec![ConstraintExpr::new().with_platform(Platform::Linux)])
        );
        // != expands to the three other known platforms
        match eval_platform(MarkerOp::Ne, "win32") {
            MarkerEval::Disjunction(exprs) => {
                assert_eq!(exprs.len(), 3);
                assert!(exprs
                    .iter()
                    .all(|e| e.platform() != Some(Platform::Windows)));
            }
            other => panic!("expected disjunction, got {other:?}"),
        }
        // unknown keywords are decided statically
        assert_eq!(eval_platform(MarkerOp::Eq, "cygwin"), MarkerEval::Static(false));
        assert_eq!(eval_platform(MarkerOp::Ne, "cygwin"), MarkerEval::Static(true));
        assert_eq!(eval_platform(MarkerOp::Lt, "linux"), MarkerEval::Unknown);
    }

    #[test]
    fn implementation_is_static() {
        assert_eq!(eval_implementation(MarkerOp::Eq, "CPython"), MarkerEval::Static(true));
        assert_eq!(eval_implementation(MarkerOp::Eq, "pypy"), MarkerEval::Static(false));
        assert_eq!(eval_implementation(MarkerOp::Ne, "pypy"), MarkerEval::Static(true));
    }

    #[test]
    fn extra_becomes_a_flag() {
        assert_eq!(
            eval_extra(MarkerOp::Eq, "docs"),
            MarkerEval::Disjunction(vec![ConstraintExpr::new().with_flag("docs", true)])
        );
        assert_eq!(
            eval_extra(MarkerOp::Ne, "docs"),
            MarkerEval::Disjunction(vec![ConstraintExpr::new().with_flag("docs", false)])
        );
    }

    #[test]
    fn display_parenthesizes_nested_groups() {
        let expr = MarkerExpr::or(vec![
            MarkerExpr::and(vec![
                MarkerExpr::comparison("python_version", MarkerOp::Ge, "3.8"),
                MarkerExpr::comparison("sys_platform", MarkerOp::Eq, "linux"),
            ]),
            MarkerExpr::comparison("extra", MarkerOp::Eq, "docs"),
        ]);
        assert_eq!(
            expr.to_string(),
            "(python_version >= \"3.8\" and sys_platform == \"linux\") or extra == \"docs\""
        );
    }
}
