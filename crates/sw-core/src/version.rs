//! Dotted upgrade versions with pre-release ordering.
//!
//! A version is a dot-separated list of segments. Each segment is either a
//! number or a pre-release tag (`alpha`, `beta`, `rc`) with an optional
//! trailing number. A pre-release segment sorts below any numeric segment, so
//! `6.2.alpha1 < 6.2.beta1 < 6.2.rc1 < 6.2.0 < 6.2.1`.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Pre-release tag, ordered `alpha < beta < rc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

impl PreRelease {
    fn tag(self) -> &'static str {
        match self {
            PreRelease::Alpha => "alpha",
            PreRelease::Beta => "beta",
            PreRelease::Rc => "rc",
        }
    }
}

/// One dot-separated component of a version.
///
/// Variant order matters: every `Pre` sorts before every `Num`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Pre(PreRelease, u32),
    Num(u64),
}

/// A parsed upgrade version such as `6.2.alpha1` or `9.9.9`.
///
/// Equality and ordering are defined on the parsed segments; the original
/// spelling is kept for display.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a version string.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let raw = input.trim();
        let invalid = |reason: &str| CoreError::InvalidVersion {
            version: input.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("version is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            segments.push(parse_segment(part).ok_or_else(|| {
                invalid(&format!(
                    "segment '{part}' is neither a number nor alpha/beta/rc"
                ))
            })?);
        }

        if !matches!(segments.first(), Some(Segment::Num(_))) {
            return Err(invalid("first segment must be numeric"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The version as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments, most significant first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any segment is a pre-release tag.
    pub fn is_prerelease(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Pre(_, _)))
    }

    /// The `major.minor` series this version belongs to, e.g. `6.2` for
    /// `6.2.alpha1`.
    pub fn series(&self) -> String {
        self.segments
            .iter()
            .take(2)
            .map(|s| match s {
                Segment::Num(n) => n.to_string(),
                Segment::Pre(tag, n) => format!("{}{}", tag.tag(), n),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn parse_segment(part: &str) -> Option<Segment> {
    if part.bytes().all(|b| b.is_ascii_digit()) {
        return part.parse().ok().map(Segment::Num);
    }

    let lower = part.to_ascii_lowercase();
    for tag in [PreRelease::Alpha, PreRelease::Beta, PreRelease::Rc] {
        if let Some(rest) = lower.strip_prefix(tag.tag()) {
            if rest.is_empty() {
                return Some(Segment::Pre(tag, 0));
            }
            if rest.bytes().all(|b| b.is_ascii_digit()) {
                return rest.parse().ok().map(|n| Segment::Pre(tag, n));
            }
        }
    }
    None
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Vec ordering is lexicographic, and a strict prefix sorts first.
        self.segments.cmp(&other.segments)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Version {
    type Error = CoreError;

    fn try_from(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
