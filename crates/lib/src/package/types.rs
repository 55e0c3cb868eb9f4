use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::runtime::RuntimeVersion;

/// Which project metadata file drives compile and install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildFormat {
  /// `pyproject.toml`
  Pyproject,
  /// `Cargo.toml`
  Cargo,
}

impl BuildFormat {
  pub fn metadata_file(&self) -> &'static str {
    match self {
      BuildFormat::Pyproject => "pyproject.toml",
      BuildFormat::Cargo => "Cargo.toml",
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      BuildFormat::Pyproject => "pyproject",
      BuildFormat::Cargo => "cargo",
    }
  }
}

impl FromStr for BuildFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pyproject" => Ok(BuildFormat::Pyproject),
      "cargo" => Ok(BuildFormat::Cargo),
      other => Err(format!("unknown build format '{other}' (expected 'pyproject' or 'cargo')")),
    }
  }
}

impl fmt::Display for BuildFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The three dependency tiers of a package build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  Build,
  Check,
  Runtime,
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Tier::Build => "build",
      Tier::Check => "check",
      Tier::Runtime => "runtime",
    })
  }
}

/// How to build one package from local source.
///
/// A spec carries no runtime of its own; the same spec can be built against
/// any runtime instance that passes `min_runtime_version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
  pub name: String,
  pub version: String,
  pub min_runtime_version: RuntimeVersion,
  pub source_root: PathBuf,
  pub build_format: BuildFormat,
  /// Visible only while constructing the artifact.
  #[serde(default)]
  pub build_deps: BTreeSet<String>,
  /// Visible only while running the check phase.
  #[serde(default)]
  pub check_deps: BTreeSet<String>,
  /// Retained, with everything they propagate, by the artifact.
  #[serde(default)]
  pub runtime_deps: BTreeSet<String>,
  /// Shell command that compiles and installs the staged source in place.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub build: Option<String>,
  /// Shell command running the package's own test suite.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub check: Option<String>,
}

impl PackageSpec {
  pub fn tier(&self, tier: Tier) -> &BTreeSet<String> {
    match tier {
      Tier::Build => &self.build_deps,
      Tier::Check => &self.check_deps,
      Tier::Runtime => &self.runtime_deps,
    }
  }

  /// Every dependency name across all tiers.
  pub fn all_deps(&self) -> impl Iterator<Item = &str> {
    self
      .build_deps
      .iter()
      .chain(&self.check_deps)
      .chain(&self.runtime_deps)
      .map(String::as_str)
  }

  /// Names appearing in more than one tier, with the tiers they appear in.
  pub fn tier_overlaps(&self) -> Vec<(String, Vec<Tier>)> {
    let all: BTreeSet<&str> = self.all_deps().collect();
    all
      .into_iter()
      .filter_map(|name| {
        let tiers: Vec<Tier> = [Tier::Build, Tier::Check, Tier::Runtime]
          .into_iter()
          .filter(|&tier| self.tier(tier).contains(name))
          .collect();
        (tiers.len() > 1).then(|| (name.to_string(), tiers))
      })
      .collect()
  }
}
