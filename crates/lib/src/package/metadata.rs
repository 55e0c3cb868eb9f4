//! Project metadata readers.
//!
//! Only the fields the builder cross-checks are read: the project name and
//! version, the build-system requirements and the runtime dependencies.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::types::BuildFormat;

#[derive(Debug, Error)]
pub enum MetadataError {
  #[error("project metadata file not found: {}", path.display())]
  Missing { path: PathBuf },

  #[error("failed to read project metadata '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse project metadata '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// The parts of a project metadata file the builder relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
  pub name: Option<String>,
  pub version: Option<String>,
  pub build_backend: Option<String>,
  /// Normalized names the build system requires.
  pub build_requires: BTreeSet<String>,
  /// Normalized names the project needs at run time.
  pub dependencies: BTreeSet<String>,
}

#[derive(Deserialize)]
struct Pyproject {
  #[serde(rename = "build-system")]
  build_system: Option<PyBuildSystem>,
  project: Option<PyProject>,
}

#[derive(Deserialize)]
struct PyBuildSystem {
  #[serde(default)]
  requires: Vec<String>,
  #[serde(rename = "build-backend")]
  build_backend: Option<String>,
}

#[derive(Deserialize)]
struct PyProject {
  name: Option<String>,
  version: Option<String>,
  #[serde(default)]
  dependencies: Vec<String>,
}

#[derive(Deserialize)]
struct CargoManifest {
  package: Option<CargoPackage>,
  #[serde(default)]
  dependencies: BTreeMap<String, toml::Value>,
  #[serde(default, rename = "build-dependencies")]
  build_dependencies: BTreeMap<String, toml::Value>,
}

#[derive(Deserialize)]
struct CargoPackage {
  name: Option<String>,
  version: Option<toml::Value>,
}

/// Read the metadata file `format` names from `source_root`.
pub fn read_metadata(format: BuildFormat, source_root: &Path) -> Result<ProjectMetadata, MetadataError> {
  let path = source_root.join(format.metadata_file());
  if !path.is_file() {
    return Err(MetadataError::Missing { path });
  }
  let content = fs::read_to_string(&path).map_err(|source| MetadataError::Read {
    path: path.clone(),
    source,
  })?;

  let metadata = match format {
    BuildFormat::Pyproject => parse_pyproject(&content),
    BuildFormat::Cargo => parse_cargo(&content),
  }
  .map_err(|source| MetadataError::Parse {
    path: path.clone(),
    source,
  })?;

  debug!(
    path = %path.display(),
    build_requires = metadata.build_requires.len(),
    dependencies = metadata.dependencies.len(),
    "read project metadata"
  );
  Ok(metadata)
}

fn parse_pyproject(content: &str) -> Result<ProjectMetadata, toml::de::Error> {
  let doc: Pyproject = toml::from_str(content)?;
  let mut metadata = ProjectMetadata::default();

  if let Some(build_system) = doc.build_system {
    metadata.build_backend = build_system.build_backend;
    metadata.build_requires = build_system.requires.iter().filter_map(|r| requirement_name(r)).collect();
  }
  if let Some(project) = doc.project {
    metadata.name = project.name;
    metadata.version = project.version;
    metadata.dependencies = project.dependencies.iter().filter_map(|r| requirement_name(r)).collect();
  }
  Ok(metadata)
}

fn parse_cargo(content: &str) -> Result<ProjectMetadata, toml::de::Error> {
  let doc: CargoManifest = toml::from_str(content)?;
  let (name, version) = match doc.package {
    Some(pkg) => (pkg.name, pkg.version.and_then(|v| v.as_str().map(String::from))),
    None => (None, None),
  };
  Ok(ProjectMetadata {
    name,
    version,
    build_backend: None,
    build_requires: doc.build_dependencies.keys().map(|n| normalize_name(n)).collect(),
    dependencies: doc.dependencies.keys().map(|n| normalize_name(n)).collect(),
  })
}

/// Extract the distribution name from a requirement such as
/// `numpy[extra]>=1.26; python_version >= "3.10"`.
pub fn requirement_name(requirement: &str) -> Option<String> {
  let end = requirement
    .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | ';' | '[' | '@' | '(' | ' '))
    .unwrap_or(requirement.len());
  let name = requirement[..end].trim();
  (!name.is_empty()).then(|| normalize_name(name))
}

/// Lowercase and collapse runs of `-`, `_` and `.` into a single `-`.
pub fn normalize_name(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut pending_sep = false;
  for c in name.trim().chars() {
    if matches!(c, '-' | '_' | '.') {
      pending_sep = true;
      continue;
    }
    if pending_sep && !out.is_empty() {
      out.push('-');
    }
    pending_sep = false;
    out.extend(c.to_lowercase());
  }
  out
}
