//! Package identity: the `(owner, repo)` pair the hosting platform needs.

use crate::error::{CoreError, Result};
use std::fmt;
use std::str::FromStr;

/// A package's identity, split into the owner and repo halves the
/// hosting-platform interface requires. The registry stores this as one
/// `"<owner>/<repo>"` string; we split it once at ingest and carry the pair
/// everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName {
    /// The owner (user or organization) segment.
    pub owner: String,
    /// The repo segment.
    pub repo: String,
}

impl PackageName {
    /// Split a registry-style `"<owner>/<repo>"` string.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidPackageName` if there isn't exactly one `/`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(2, '/');
        let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
            return Err(CoreError::InvalidPackageName {
                raw: raw.to_string(),
            });
        };
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(CoreError::InvalidPackageName {
                raw: raw.to_string(),
            });
        }
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// The registry-style `"<owner>/<repo>"` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Whether this package's owner is the reserved ecosystem-root prefix,
    /// meaning it has no upstream hosting repository to open a PR against.
    #[must_use]
    pub fn is_reserved_root(&self) -> bool {
        self.owner == crate::RESERVED_ECOSYSTEM_ROOT
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for PackageName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
