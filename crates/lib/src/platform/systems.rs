//! The supported target set.
//!
//! The set is consumed, not owned: it comes from a literal list in the
//! declaration, a JSON file inside a raw input tree, or the `systems` list of
//! an evaluable input's own declaration.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{Target, TargetError};

/// Target set used when a declaration names no systems at all.
pub const DEFAULT_SYSTEMS: &[&str] = &["aarch64-darwin", "aarch64-linux", "x86_64-darwin", "x86_64-linux"];

#[derive(Debug, Error)]
pub enum SystemsError {
  #[error(transparent)]
  InvalidTarget(#[from] TargetError),

  #[error("failed to read systems file '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse systems file '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// An ordered, duplicate-free set of targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemSet {
  targets: BTreeSet<Target>,
}

impl SystemSet {
  pub fn from_list<I, S>(ids: I) -> Result<Self, SystemsError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let targets = ids.into_iter().map(Target::new).collect::<Result<BTreeSet<_>, _>>()?;
    Ok(Self { targets })
  }

  /// Read a JSON array of target strings.
  pub fn from_json_file(path: &Path) -> Result<Self, SystemsError> {
    let content = fs::read_to_string(path).map_err(|source| SystemsError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let ids: Vec<String> = serde_json::from_str(&content).map_err(|source| SystemsError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_list(ids)
  }

  pub fn default_set() -> Self {
    let targets = DEFAULT_SYSTEMS
      .iter()
      .filter_map(|id| Target::new(*id).ok())
      .collect();
    Self { targets }
  }

  pub fn contains(&self, target: &Target) -> bool {
    self.targets.contains(target)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Target> {
    self.targets.iter()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }
}
