//! The package index shipped by a pinned input.
//!
//! The index lists runtime instances, the packages each of them can provide,
//! and the extra tools available to development shells:
//!
//! ```json
//! {
//!   "runtimes": {
//!     "python310": {
//!       "version": "3.10.12",
//!       "platforms": ["x86_64-linux", "aarch64-darwin"],
//!       "packages": {
//!         "numpy": { "version": "1.26.4" },
//!         "matplotlib": { "version": "3.8.2", "propagated": ["numpy"] }
//!       }
//!     }
//!   },
//!   "tools": { "pyright": { "version": "1.1.350" } }
//! }
//! ```
//!
//! A missing `platforms` list means "every target".

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{Package, Runtime, RuntimeVersion};
use crate::platform::Target;

#[derive(Debug, Error)]
pub enum IndexError {
  #[error("failed to read package index '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse package index '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("runtime '{id}' is not in the package index")]
  UnknownRuntime { id: String },

  #[error("runtime '{id}' does not support target '{target}'")]
  UnsupportedTarget { id: String, target: Target },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIndex {
  #[serde(default)]
  pub runtimes: BTreeMap<String, RuntimeEntry>,
  #[serde(default)]
  pub tools: BTreeMap<String, ToolEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEntry {
  pub version: RuntimeVersion,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platforms: Option<BTreeSet<Target>>,
  #[serde(default)]
  pub packages: BTreeMap<String, PackageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
  pub version: String,
  /// Packages that must accompany this one wherever it goes.
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub propagated: BTreeSet<String>,
  /// Packages that cannot share a runtime instance with this one.
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub conflicts: BTreeSet<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platforms: Option<BTreeSet<Target>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platforms: Option<BTreeSet<Target>>,
}

pub(crate) fn supports(platforms: &Option<BTreeSet<Target>>, target: &Target) -> bool {
  platforms.as_ref().is_none_or(|set| set.contains(target))
}

impl RuntimeEntry {
  pub fn supports(&self, target: &Target) -> bool {
    supports(&self.platforms, target)
  }
}

impl PackageIndex {
  pub fn load(path: &Path) -> Result<Self, IndexError> {
    let content = fs::read_to_string(path).map_err(|source| IndexError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let index: PackageIndex = serde_json::from_str(&content).map_err(|source| IndexError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(
      path = %path.display(),
      runtimes = index.runtimes.len(),
      tools = index.tools.len(),
      "loaded package index"
    );
    Ok(index)
  }

  /// Bind the runtime `id` to `target`.
  pub fn runtime(&self, id: &str, target: &Target) -> Result<Runtime, IndexError> {
    let entry = self
      .runtimes
      .get(id)
      .ok_or_else(|| IndexError::UnknownRuntime { id: id.to_string() })?;
    if !entry.supports(target) {
      return Err(IndexError::UnsupportedTarget {
        id: id.to_string(),
        target: target.clone(),
      });
    }
    Ok(Runtime::new(
      id,
      entry.version.clone(),
      target.clone(),
      Arc::new(entry.packages.clone()),
    ))
  }

  /// First runtime (by id) that supports `target` and matches `version`.
  pub fn select_runtime(&self, target: &Target, version: &RuntimeVersion) -> Option<Runtime> {
    self
      .runtimes
      .iter()
      .find(|(_, entry)| entry.supports(target) && entry.version.matches_prefix(version))
      .and_then(|(id, _)| self.runtime(id, target).ok())
  }

  /// Look up a shell tool available on `target`.
  pub fn tool(&self, name: &str, target: &Target) -> Option<Package> {
    let entry = self.tools.get(name)?;
    supports(&entry.platforms, target).then(|| Package {
      name: name.to_string(),
      version: entry.version.clone(),
      propagated: BTreeSet::new(),
      conflicts: BTreeSet::new(),
    })
  }
}
