//! Build artifacts.
//!
//! Shells and packages share one artifact shape. Artifacts are computed on
//! demand per target and identified by a hash over everything that went into
//! them, so identical inputs always produce the same hash.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::package::PackageSpec;
use crate::platform::Target;
use crate::runtime::{RuntimeInstance, RuntimeVersion};
use crate::shell::EnvironmentSpec;
use crate::util::hash::{ContentHash, HashError, Hashable, ObjectHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
  Shell,
  Package,
}

impl fmt::Display for ArtifactKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ArtifactKind::Shell => "shell",
      ArtifactKind::Package => "package",
    })
  }
}

/// The runtime instance an artifact was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeBinding {
  pub id: String,
  pub version: RuntimeVersion,
}

impl RuntimeBinding {
  pub fn of(runtime: &dyn RuntimeInstance) -> Self {
    Self {
      id: runtime.id().to_string(),
      version: runtime.version().clone(),
    }
  }
}

impl fmt::Display for RuntimeBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.id, self.version)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Provenance {
  Package(PackageSpec),
  Environment(EnvironmentSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
  pub kind: ArtifactKind,
  pub target: Target,
  pub name: String,
  pub version: String,
  pub runtime: RuntimeBinding,
  /// Every package the artifact carries at run time, name to version.
  pub runtime_closure: BTreeMap<String, String>,
  /// Extra tools on a shell's PATH, name to version.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub tools: BTreeMap<String, String>,
  pub provenance: Provenance,
  /// Content hash of the source tree a package was built from.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_hash: Option<ContentHash>,
  pub hash: ObjectHash,
}

/// Everything an artifact hash covers.
#[derive(Serialize)]
struct ArtifactInputs<'a> {
  kind: ArtifactKind,
  target: &'a Target,
  name: &'a str,
  version: &'a str,
  runtime: &'a RuntimeBinding,
  runtime_closure: &'a BTreeMap<String, String>,
  tools: &'a BTreeMap<String, String>,
  provenance: Provenance,
  source_hash: &'a Option<ContentHash>,
}

impl Provenance {
  /// The provenance with the package's location on disk blanked out. The
  /// tree's content is covered by `source_hash` instead.
  fn relocatable(&self) -> Provenance {
    match self {
      Provenance::Package(spec) => Provenance::Package(PackageSpec {
        source_root: PathBuf::new(),
        ..spec.clone()
      }),
      Provenance::Environment(env) => Provenance::Environment(env.clone()),
    }
  }
}

impl Hashable for ArtifactInputs<'_> {}

impl BuildArtifact {
  /// Recompute the hash from the artifact's fields.
  pub fn seal(mut self) -> Result<Self, HashError> {
    self.hash = self.compute_hash()?;
    Ok(self)
  }

  pub fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    ArtifactInputs {
      kind: self.kind,
      target: &self.target,
      name: &self.name,
      version: &self.version,
      runtime: &self.runtime,
      runtime_closure: &self.runtime_closure,
      tools: &self.tools,
      provenance: self.provenance.relocatable(),
      source_hash: &self.source_hash,
    }
    .compute_hash()
  }

  pub fn closure_names(&self) -> BTreeSet<&str> {
    self.runtime_closure.keys().map(String::as_str).collect()
  }
}
