//! Platform identifiers and the per-target matrix.
//!
//! A [`Target`] is an opaque `<arch>-<os>` string. The set of supported
//! targets is an external input ([`SystemSet`]); [`matrix`] replicates one
//! pure function over that set.

pub mod arch;
pub mod matrix;
pub mod os;
pub mod paths;
pub mod systems;

use std::fmt;
use std::str::FromStr;

use arch::Arch;
use os::Os;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use matrix::{Matrix, expand, expand_parallel};
pub use systems::{DEFAULT_SYSTEMS, SystemSet, SystemsError};

/// Platform identifier combining architecture and OS (e.g., "aarch64-darwin")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  /// Returns the platform triple string (e.g., "aarch64-darwin")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}

/// Error returned for malformed target identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target '{0}': expected a non-empty identifier without whitespace")]
pub struct TargetError(pub String);

/// An opaque target identifier such as `x86_64-linux`.
///
/// Targets are compared as strings; nothing in the matrix depends on
/// interpreting them, which keeps the supported set fully external.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Target(String);

impl Target {
  pub fn new(id: impl Into<String>) -> Result<Self, TargetError> {
    let id = id.into();
    if id.is_empty() || id.chars().any(char::is_whitespace) {
      return Err(TargetError(id));
    }
    Ok(Self(id))
  }

  /// The target of the machine running this process.
  pub fn current() -> Option<Self> {
    Platform::current().map(|p| Self(p.triple()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Interpret the identifier as a known platform, if it is one.
  pub fn platform(&self) -> Option<Platform> {
    let (arch, os) = self.0.split_once('-')?;
    Some(Platform::new(arch.parse().ok()?, os.parse().ok()?))
  }
}

impl FromStr for Target {
  type Err = TargetError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::new(s)
  }
}

impl TryFrom<String> for Target {
  type Error = TargetError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl From<Target> for String {
  fn from(target: Target) -> Self {
    target.0
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Returns the platform triple for the current system (e.g., "aarch64-darwin")
pub fn platform_triple() -> Option<String> {
  Platform::current().map(|p| p.triple())
}
