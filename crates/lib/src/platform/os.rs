//! The operating system half of a target identifier.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
  Linux,
  Darwin,
  Windows,
  FreeBsd,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operating system '{0}'")]
pub struct UnknownOs(pub String);

impl Os {
  pub const ALL: [Os; 4] = [Os::Linux, Os::Darwin, Os::Windows, Os::FreeBsd];

  /// The OS this binary was compiled for.
  pub fn current() -> Option<Self> {
    Self::from_rust_name(std::env::consts::OS)
  }

  /// Map `std::env::consts::OS` naming onto target naming, where macOS is
  /// `darwin`.
  fn from_rust_name(name: &str) -> Option<Self> {
    match name {
      "linux" => Some(Os::Linux),
      "macos" => Some(Os::Darwin),
      "windows" => Some(Os::Windows),
      "freebsd" => Some(Os::FreeBsd),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Os::Linux => "linux",
      Os::Darwin => "darwin",
      Os::Windows => "windows",
      Os::FreeBsd => "freebsd",
    }
  }
}

impl FromStr for Os {
  type Err = UnknownOs;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Os::ALL
      .into_iter()
      .find(|os| os.as_str() == s)
      .ok_or_else(|| UnknownOs(s.to_string()))
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
