//! Version numbers and range constraints.
//!
//! Versions are three non-negative integers with lexicographic ordering;
//! constraints are bounded ranges over versions used in manifests. The
//! engine only ever needs `VersionConstraint::satisfies`.

use crate::error::{CoreError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// `(major, minor, patch)`, ordered lexicographically by field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl Version {
    /// Build a version from its three components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, '.');
        let (Some(major), Some(minor), Some(patch)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CoreError::InvalidVersion {
                raw: raw.to_string(),
            });
        };
        if parts.next().is_some() {
            return Err(CoreError::InvalidVersion {
                raw: raw.to_string(),
            });
        }
        let invalid = || CoreError::InvalidVersion {
            raw: raw.to_string(),
        };
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
            patch: patch.parse().map_err(|_| invalid())?,
        })
    }
}

/// Which side of a bound is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Bound {
    Inclusive,
    Exclusive,
}

/// A bounded range `lower_bound min OP v OP max upper_bound`, e.g.
/// `1.0.0 <= v < 2.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionConstraint {
    min: Version,
    min_bound: Bound,
    max: Version,
    max_bound: Bound,
}

static CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<min>\d+\.\d+\.\d+)\s*(?P<lop><=|<)\s*v\s*(?P<rop><=|<)\s*(?P<max>\d+\.\d+\.\d+)$",
    )
    .expect("constraint regex is valid")
});

impl VersionConstraint {
    /// Construct a constraint directly from bounds (used by tests and by
    /// callers that already hold parsed versions).
    #[must_use]
    pub fn new(min: Version, min_inclusive: bool, max: Version, max_inclusive: bool) -> Self {
        Self {
            min,
            min_bound: if min_inclusive {
                Bound::Inclusive
            } else {
                Bound::Exclusive
            },
            max,
            max_bound: if max_inclusive {
                Bound::Inclusive
            } else {
                Bound::Exclusive
            },
        }
    }

    /// Parse the manifest grammar `"<min> <= v < <max>"` (operators may each
    /// independently be `<=` or `<`).
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConstraint` if the string doesn't match the
    /// grammar or either version fails to parse.
    pub fn parse(raw: &str) -> Result<Self> {
        let caps = CONSTRAINT_RE
            .captures(raw.trim())
            .ok_or_else(|| CoreError::InvalidConstraint {
                raw: raw.to_string(),
                reason: "expected '<min> <= v < <max>'".to_string(),
            })?;
        let min: Version =
            caps["min"]
                .parse()
                .map_err(|_| CoreError::InvalidConstraint {
                    raw: raw.to_string(),
                    reason: "invalid lower bound".to_string(),
                })?;
        let max: Version =
            caps["max"]
                .parse()
                .map_err(|_| CoreError::InvalidConstraint {
                    raw: raw.to_string(),
                    reason: "invalid upper bound".to_string(),
                })?;
        Ok(Self {
            min,
            min_bound: if &caps["lop"] == "<=" {
                Bound::Inclusive
            } else {
                Bound::Exclusive
            },
            max,
            max_bound: if &caps["rop"] == "<=" {
                Bound::Inclusive
            } else {
                Bound::Exclusive
            },
        })
    }

    /// Whether `v` falls within this range.
    #[must_use]
    pub fn satisfies(&self, v: &Version) -> bool {
        let lower_ok = match self.min_bound {
            Bound::Inclusive => *v >= self.min,
            Bound::Exclusive => *v > self.min,
        };
        let upper_ok = match self.max_bound {
            Bound::Inclusive => *v <= self.max,
            Bound::Exclusive => *v < self.max,
        };
        lower_ok && upper_ok
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lop = match self.min_bound {
            Bound::Inclusive => "<=",
            Bound::Exclusive => "<",
        };
        let rop = match self.max_bound {
            Bound::Inclusive => "<=",
            Bound::Exclusive => "<",
        };
        write!(f, "{} {lop} v {rop} {}", self.min, self.max)
    }
}

impl FromStr for VersionConstraint {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}
