//! Runtime versions.
//!
//! Interpreter versions are written with one to three numeric components
//! (`3`, `3.10`, `3.10.12`). Missing components compare as zero, so `3.10`
//! and `3.10.0` are the same version. A full semver string with pre-release
//! or build metadata is accepted as well.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid runtime version '{0}'")]
pub struct VersionError(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuntimeVersion {
  raw: String,
  parsed: semver::Version,
  /// Number of components written in `raw`.
  precision: usize,
}

impl RuntimeVersion {
  pub fn parse(s: &str) -> Result<Self, VersionError> {
    let raw = s.trim();
    if let Ok(parsed) = semver::Version::parse(raw) {
      return Ok(Self {
        raw: raw.to_string(),
        parsed,
        precision: 3,
      });
    }

    let parts: Vec<&str> = raw.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
      return Err(VersionError(s.to_string()));
    }
    let mut nums = [0u64; 3];
    for (slot, part) in nums.iter_mut().zip(&parts) {
      if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(VersionError(s.to_string()));
      }
      *slot = part.parse().map_err(|_| VersionError(s.to_string()))?;
    }

    Ok(Self {
      raw: raw.to_string(),
      parsed: semver::Version::new(nums[0], nums[1], nums[2]),
      precision: parts.len(),
    })
  }

  /// Whether `self` agrees with `prefix` on every component `prefix` spells out.
  ///
  /// `3.10.12` matches `3`, `3.10` and `3.10.12`, but not `3.1`.
  pub fn matches_prefix(&self, prefix: &RuntimeVersion) -> bool {
    let mine = [self.parsed.major, self.parsed.minor, self.parsed.patch];
    let theirs = [prefix.parsed.major, prefix.parsed.minor, prefix.parsed.patch];
    let numeric = mine[..prefix.precision] == theirs[..prefix.precision];
    if prefix.precision == 3 && !prefix.parsed.pre.is_empty() {
      return numeric && self.parsed.pre == prefix.parsed.pre;
    }
    numeric
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }
}

impl PartialEq for RuntimeVersion {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for RuntimeVersion {}

impl PartialOrd for RuntimeVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for RuntimeVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    self.parsed.cmp_precedence(&other.parsed)
  }
}

impl Hash for RuntimeVersion {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.parsed.major.hash(state);
    self.parsed.minor.hash(state);
    self.parsed.patch.hash(state);
    self.parsed.pre.hash(state);
  }
}

impl FromStr for RuntimeVersion {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl TryFrom<String> for RuntimeVersion {
  type Error = VersionError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<RuntimeVersion> for String {
  fn from(v: RuntimeVersion) -> Self {
    v.raw
  }
}

impl fmt::Display for RuntimeVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}
