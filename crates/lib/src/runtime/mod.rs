//! Runtime instances.
//!
//! A runtime instance is an interpreter at a fixed version bound to one target,
//! together with the package index it resolves dependency names against. The
//! package builder is parameterised by [`RuntimeInstance`] so any caller can
//! supply its own.

mod closure;
mod index;
mod version;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use closure::{Closure, UnresolvedNames, resolve_closure};
pub use index::{IndexError, PackageEntry, PackageIndex, RuntimeEntry, ToolEntry};
pub use version::{RuntimeVersion, VersionError};

use crate::platform::Target;

/// A package as resolved by a runtime instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
  pub name: String,
  pub version: String,
  pub propagated: BTreeSet<String>,
  pub conflicts: BTreeSet<String>,
}

/// The capability a package build is parameterised by.
pub trait RuntimeInstance: Send + Sync {
  fn id(&self) -> &str;

  fn version(&self) -> &RuntimeVersion;

  fn target(&self) -> &Target;

  /// Resolve a dependency name against this instance's package index.
  ///
  /// Returns `None` when the index has no such package, or has it but not for
  /// this instance's target.
  fn resolve(&self, name: &str) -> Option<Package>;
}

/// A runtime instance backed by one entry of a [`PackageIndex`].
#[derive(Debug, Clone)]
pub struct Runtime {
  id: String,
  version: RuntimeVersion,
  target: Target,
  packages: Arc<BTreeMap<String, PackageEntry>>,
}

impl Runtime {
  pub fn new(
    id: impl Into<String>,
    version: RuntimeVersion,
    target: Target,
    packages: Arc<BTreeMap<String, PackageEntry>>,
  ) -> Self {
    Self {
      id: id.into(),
      version,
      target,
      packages,
    }
  }
}

impl RuntimeInstance for Runtime {
  fn id(&self) -> &str {
    &self.id
  }

  fn version(&self) -> &RuntimeVersion {
    &self.version
  }

  fn target(&self) -> &Target {
    &self.target
  }

  fn resolve(&self, name: &str) -> Option<Package> {
    let entry = self.packages.get(name)?;
    if !index::supports(&entry.platforms, &self.target) {
      return None;
    }
    Some(Package {
      name: name.to_string(),
      version: entry.version.clone(),
      propagated: entry.propagated.clone(),
      conflicts: entry.conflicts.clone(),
    })
  }
}
