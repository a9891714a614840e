// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Version types for both ecosystems.
//!
//! [`PackagingVersion`] is the source side: a PEP 440 version with epoch,
//! release tuple and pre/post/dev/local qualifiers, ordered the way the
//! Python packaging tools order it (trailing zeros in the release are
//! insignificant, `2.0 == 2.0.0`).
//!
//! [`Version`] is the target side: a Spack-style version made of release
//! components (numbers or words) plus a prerelease tag. Its order is plain
//! lexicographic over the components, with a shorter version ranking below
//! its extensions (`2.0 < 2.0.0 < 2.0.0.1`). The condenser's half-open
//! bounds rely on exactly this order.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

/// One release component of a [`Version`]: a number, or a word such as
/// `post`, `dev` or a local-version label. Words order below numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Component {
    /// Alphabetic component, e.g. the `post` in `1.2.post1`.
    Str(String),
    /// Numeric component.
    Num(u64),
}

impl Component {
    fn from_word(word: &str) -> Self {
        Self::Str(word.to_ascii_lowercase())
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Str(s) => write!(f, "{s}"),
            Component::Num(n) => write!(f, "{n}"),
        }
    }
}

/// Prerelease tag of a [`Version`]. A final version ranks above any
/// prerelease of the same release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prerelease {
    /// `-alpha<n>`
    Alpha(u64),
    /// `-beta<n>`
    Beta(u64),
    /// `-rc<n>`
    Rc(u64),
    /// No prerelease tag.
    Final,
}

impl Display for Prerelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prerelease::Alpha(n) => write!(f, "-alpha{n}"),
            Prerelease::Beta(n) => write!(f, "-beta{n}"),
            Prerelease::Rc(n) => write!(f, "-rc{n}"),
            Prerelease::Final => Ok(()),
        }
    }
}

/// A Spack-style version: release components plus a prerelease tag.
///
/// The derived order compares the release component-by-component (a prefix
/// ranks below its extensions) and then the prerelease tag, which gives a
/// strict total order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    release: Vec<Component>,
    prerelease: Prerelease,
}

impl Version {
    /// Create a version from release components and a prerelease tag.
    pub fn new(release: Vec<Component>, prerelease: Prerelease) -> Self {
        Self {
            release,
            prerelease,
        }
    }

    /// Create a final version from release components.
    pub fn from_release(release: Vec<Component>) -> Self {
        Self::new(release, Prerelease::Final)
    }

    /// The release components.
    pub fn release(&self) -> &[Component] {
        &self.release
    }

    /// The prerelease tag.
    pub fn prerelease(&self) -> Prerelease {
        self.prerelease
    }
}

impl From<(u64, u64, u64)> for Version {
    fn from((a, b, c): (u64, u64, u64)) -> Self {
        Self::from_release(vec![Component::Num(a), Component::Num(b), Component::Num(c)])
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous_was_word = false;
        for (i, component) in self.release.iter().enumerate() {
            // no separator between a word and its trailing number: `1.2.post1`
            if i > 0 && !(previous_was_word && matches!(component, Component::Num(_))) {
                write!(f, ".")?;
            }
            write!(f, "{component}")?;
            previous_was_word = matches!(component, Component::Str(_));
        }
        write!(f, "{}", self.prerelease)
    }
}

/// Error creating a [`Version`] or [`PackagingVersion`] from a string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionParseError {
    /// The string contains no version at all.
    #[error("empty version string")]
    Empty,
    /// A part of the version could not be understood.
    #[error("cannot parse `{part}` in `{full_version}`")]
    InvalidPart {
        /// Full version string that was being parsed.
        full_version: String,
        /// The part where parsing failed.
        part: String,
    },
}

impl VersionParseError {
    fn invalid(full: &str, part: &str) -> Self {
        Self::InvalidPart {
            full_version: full.to_string(),
            part: part.to_string(),
        }
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }
        let (body, prerelease) = match s.rfind('-') {
            Some(i) => match parse_prerelease_tag(&s[i + 1..]) {
                Some(tag) => (&s[..i], tag),
                None => (s, Prerelease::Final),
            },
            None => (s, Prerelease::Final),
        };
        let mut release = Vec::new();
        for part in body.split('.') {
            if part.is_empty() {
                return Err(VersionParseError::invalid(s, part));
            }
            // a part may mix words and numbers, e.g. `post1`
            let mut rest = part;
            while !rest.is_empty() {
                let digit_run = rest.starts_with(|c: char| c.is_ascii_digit());
                let split = rest
                    .find(|c: char| c.is_ascii_digit() != digit_run)
                    .unwrap_or(rest.len());
                let (run, tail) = rest.split_at(split);
                if digit_run {
                    let n: u64 = run
                        .parse()
                        .map_err(|_| VersionParseError::invalid(s, part))?;
                    release.push(Component::Num(n));
                } else if run.chars().all(|c| c.is_ascii_alphabetic()) {
                    release.push(Component::from_word(run));
                } else {
                    return Err(VersionParseError::invalid(s, part));
                }
                rest = tail;
            }
        }
        Ok(Self {
            release,
            prerelease,
        })
    }
}

fn parse_prerelease_tag(tag: &str) -> Option<Prerelease> {
    for (word, make) in [
        ("alpha", Prerelease::Alpha as fn(u64) -> Prerelease),
        ("beta", Prerelease::Beta),
        ("rc", Prerelease::Rc),
    ] {
        if let Some(num) = tag.strip_prefix(word) {
            if let Ok(n) = num.parse::<u64>() {
                return Some(make(n));
            }
        }
    }
    None
}

/// Kind of a PEP 440 prerelease segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PreKind {
    /// `aN`
    Alpha,
    /// `bN`
    Beta,
    /// `rcN`
    Rc,
}

/// A PEP 440 version as found on PyPI.
///
/// Ordering, equality and hashing follow PEP 440: trailing zeros in the
/// release are insignificant, a dev release sorts below prereleases, a
/// final release above them, and post releases above that.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackagingVersion {
    /// Version epoch, 0 in almost all real-world versions.
    pub epoch: u64,
    /// The dotted numeric release segment.
    pub release: Vec<u64>,
    /// Prerelease segment, e.g. `a1`.
    pub pre: Option<(PreKind, u64)>,
    /// Post-release segment, e.g. `.post2`.
    pub post: Option<u64>,
    /// Developmental release segment, e.g. `.dev3`.
    pub dev: Option<u64>,
    /// Local version label, e.g. `+cuda.11`.
    pub local: Option<String>,
}

/// Ordering rank with explicit bottom and top elements, used to compare
/// optional version segments.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Rank<T> {
    Bottom,
    Value(T),
    Top,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
enum LocalPart {
    Str(String),
    Num(u64),
}

impl PackagingVersion {
    /// A plain release without any qualifiers.
    pub fn from_release(release: Vec<u64>) -> Self {
        Self {
            epoch: 0,
            release,
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Whether this version survives the trip to the Spack encoding
    /// unchanged: a prerelease cannot carry post/dev/local qualifiers there.
    pub fn is_spack_representable(&self) -> bool {
        self.pre.is_none() || (self.post.is_none() && self.dev.is_none() && self.local.is_none())
    }

    /// Convert to the equivalent Spack-style [`Version`].
    pub fn to_spack(&self) -> Version {
        let mut release = Vec::with_capacity(self.release.len() + 2);
        let mut prerelease = Prerelease::Final;
        if self.epoch > 0 {
            log::warn!("epoch in `{self}` has no direct equivalent, keeping it as a leading component");
            release.push(Component::Num(self.epoch));
        }
        release.extend(self.release.iter().map(|&n| Component::Num(n)));
        if let Some((kind, n)) = self.pre {
            prerelease = match kind {
                PreKind::Alpha => Prerelease::Alpha(n),
                PreKind::Beta => Prerelease::Beta(n),
                PreKind::Rc => Prerelease::Rc(n),
            };
            if self.post.is_some() || self.dev.is_some() || self.local.is_some() {
                log::warn!("ignoring post/dev/local qualifiers of prerelease `{self}`");
            }
        } else {
            if let Some(n) = self.post {
                release.push(Component::from_word("post"));
                release.push(Component::Num(n));
            }
            if let Some(n) = self.dev {
                release.push(Component::from_word("dev"));
                release.push(Component::Num(n));
            }
            if let Some(local) = &self.local {
                for bit in local.split(['.', '_', '-']) {
                    match bit.parse::<u64>() {
                        Ok(n) => release.push(Component::Num(n)),
                        Err(_) => release.push(Component::from_word(bit)),
                    }
                }
            }
        }
        Version::new(release, prerelease)
    }

    fn trimmed_release(&self) -> &[u64] {
        let mut end = self.release.len();
        while end > 1 && self.release[end - 1] == 0 {
            end -= 1;
        }
        &self.release[..end]
    }

    fn pre_rank(&self) -> Rank<(PreKind, u64)> {
        match self.pre {
            Some(pre) => Rank::Value(pre),
            // a bare dev release sorts below any prerelease of the same release
            None if self.post.is_none() && self.dev.is_some() => Rank::Bottom,
            None => Rank::Top,
        }
    }

    fn post_rank(&self) -> Rank<u64> {
        match self.post {
            Some(n) => Rank::Value(n),
            None => Rank::Bottom,
        }
    }

    fn dev_rank(&self) -> Rank<u64> {
        match self.dev {
            Some(n) => Rank::Value(n),
            None => Rank::Top,
        }
    }

    fn local_parts(&self) -> Vec<LocalPart> {
        match &self.local {
            None => Vec::new(),
            Some(local) => local
                .split(['.', '_', '-'])
                .map(|bit| match bit.parse::<u64>() {
                    Ok(n) => LocalPart::Num(n),
                    Err(_) => LocalPart::Str(bit.to_ascii_lowercase()),
                })
                .collect(),
        }
    }
}

impl From<(u64, u64, u64)> for PackagingVersion {
    fn from((a, b, c): (u64, u64, u64)) -> Self {
        Self::from_release(vec![a, b, c])
    }
}

impl From<&PackagingVersion> for Version {
    fn from(v: &PackagingVersion) -> Self {
        v.to_spack()
    }
}

impl Ord for PackagingVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.pre_rank().cmp(&other.pre_rank()))
            .then_with(|| self.post_rank().cmp(&other.post_rank()))
            .then_with(|| self.dev_rank().cmp(&other.dev_rank()))
            .then_with(|| self.local_parts().cmp(&other.local_parts()))
    }
}

impl PartialOrd for PackagingVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackagingVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackagingVersion {}

impl Hash for PackagingVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch.hash(state);
        self.trimmed_release().hash(state);
        self.pre.hash(state);
        self.post.hash(state);
        self.dev.hash(state);
        self.local_parts().hash(state);
    }
}

impl Display for PackagingVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}!", self.epoch)?;
        }
        for (i, n) in self.release.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{n}")?;
        }
        if let Some((kind, n)) = self.pre {
            let word = match kind {
                PreKind::Alpha => "a",
                PreKind::Beta => "b",
                PreKind::Rc => "rc",
            };
            write!(f, "{word}{n}")?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

impl FromStr for PackagingVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let original = s;
        let mut s = s.trim().to_ascii_lowercase();
        if let Some(stripped) = s.strip_prefix('v') {
            s = stripped.to_string();
        }
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut version = PackagingVersion::from_release(Vec::new());

        if let Some((epoch, rest)) = s.split_once('!') {
            version.epoch = epoch
                .parse()
                .map_err(|_| VersionParseError::invalid(original, epoch))?;
            s = rest.to_string();
        }
        if let Some((rest, local)) = s.split_once('+') {
            if local.is_empty() {
                return Err(VersionParseError::invalid(original, "+"));
            }
            version.local = Some(local.to_string());
            s = rest.to_string();
        }

        // release: dotted numbers up to the first non-numeric part
        let mut rest = s.as_str();
        loop {
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits == 0 {
                return Err(VersionParseError::invalid(original, rest));
            }
            let n: u64 = rest[..digits]
                .parse()
                .map_err(|_| VersionParseError::invalid(original, &rest[..digits]))?;
            version.release.push(n);
            rest = &rest[digits..];
            match rest.as_bytes() {
                [b'.', next, ..] if next.is_ascii_digit() => rest = &rest[1..],
                _ => break,
            }
        }

        // qualifier segments: pre, post, dev, in any combination
        while !rest.is_empty() {
            let segment = rest.trim_start_matches(['.', '-', '_']);
            let implicit_post = segment.len() == rest.len() - 1
                && rest.starts_with('-')
                && segment.starts_with(|c: char| c.is_ascii_digit());
            let word_len = segment
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(segment.len());
            let (word, after_word) = segment.split_at(word_len);
            let after_word = after_word.trim_start_matches(['.', '-', '_']);
            let num_len = after_word
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_word.len());
            let n: u64 = if num_len == 0 {
                0
            } else {
                after_word[..num_len]
                    .parse()
                    .map_err(|_| VersionParseError::invalid(original, after_word))?
            };
            match word {
                _ if implicit_post => version.post = Some(n),
                "a" | "alpha" => version.pre = Some((PreKind::Alpha, n)),
                "b" | "beta" => version.pre = Some((PreKind::Beta, n)),
                "rc" | "c" | "pre" | "preview" => version.pre = Some((PreKind::Rc, n)),
                "post" | "rev" | "r" => version.post = Some(n),
                "dev" => version.dev = Some(n),
                _ => return Err(VersionParseError::invalid(original, segment)),
            }
            rest = &after_word[num_len..];
        }

        Ok(version)
    }
}
