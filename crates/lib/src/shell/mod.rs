//! Development shell assembly.
//!
//! A shell pins one runtime instance, a set of extension packages, a set of
//! tools, and the package under development itself. The package's closure
//! joins the shell, so what is developed is exactly what is installed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::{ArtifactKind, BuildArtifact, Provenance, RuntimeBinding};
use crate::platform::Target;
use crate::runtime::{PackageIndex, RuntimeInstance, RuntimeVersion, UnresolvedNames, resolve_closure};
use crate::util::hash::{HashError, ObjectHash};

#[derive(Debug, Error)]
pub enum AssembleError {
  #[error("shell requires runtime {required}, but '{runtime}' is {found}")]
  RuntimeMismatch {
    required: RuntimeVersion,
    runtime: String,
    found: RuntimeVersion,
  },

  #[error("unresolved shell extensions in runtime '{runtime}': {names}")]
  UnresolvedDependency { runtime: String, names: UnresolvedNames },

  #[error("dependency conflict between {left} and {right}")]
  Conflict { left: Member, right: Member },

  #[error("unknown tool '{name}' for target '{target}'")]
  UnknownTool { name: String, target: Target },

  #[error("package artifact was built for '{found}', shell targets '{expected}'")]
  ForeignArtifact { expected: Target, found: Target },

  #[error("failed to hash shell: {0}")]
  Hash(#[from] HashError),
}

/// What a shell should contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
  pub runtime_version: RuntimeVersion,
  /// Extension packages in declaration order, without duplicates.
  pub extensions: Vec<String>,
  #[serde(default)]
  pub tools: BTreeSet<String>,
}

impl EnvironmentSpec {
  pub fn new<E, T>(runtime_version: RuntimeVersion, extensions: E, tools: T) -> Self
  where
    E: IntoIterator<Item = String>,
    T: IntoIterator<Item = String>,
  {
    let mut seen = BTreeSet::new();
    let extensions = extensions.into_iter().filter(|e| seen.insert(e.clone())).collect();
    Self {
      runtime_version,
      extensions,
      tools: tools.into_iter().collect(),
    }
  }
}

/// One side of a conflict: a package, its version, and why it is in the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
  pub name: String,
  pub version: String,
  pub origin: String,
}

impl fmt::Display for Member {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} (from {})", self.name, self.version, self.origin)
  }
}

#[derive(Default)]
struct Members {
  by_name: BTreeMap<String, Member>,
}

impl Members {
  /// Add a member; the same name at a different version is a conflict.
  fn insert(&mut self, member: Member) -> Result<(), AssembleError> {
    match self.by_name.get(&member.name) {
      Some(existing) if existing.version != member.version => Err(AssembleError::Conflict {
        left: existing.clone(),
        right: member,
      }),
      Some(_) => Ok(()),
      None => {
        self.by_name.insert(member.name.clone(), member);
        Ok(())
      }
    }
  }
}

/// Assemble the development shell for `runtime`'s target.
///
/// `package` is the package artifact built for the same target; when given,
/// it and its runtime closure become part of the shell.
pub fn assemble(
  spec: &EnvironmentSpec,
  runtime: &dyn RuntimeInstance,
  index: &PackageIndex,
  package: Option<&BuildArtifact>,
) -> Result<BuildArtifact, AssembleError> {
  let target = runtime.target();
  info!(runtime = runtime.id(), target = %target, extensions = spec.extensions.len(), "assembling shell");

  if !runtime.version().matches_prefix(&spec.runtime_version) {
    return Err(AssembleError::RuntimeMismatch {
      required: spec.runtime_version.clone(),
      runtime: runtime.id().to_string(),
      found: runtime.version().clone(),
    });
  }

  let closure = resolve_closure(runtime, spec.extensions.iter().map(String::as_str)).map_err(|names| {
    AssembleError::UnresolvedDependency {
      runtime: runtime.id().to_string(),
      names,
    }
  })?;

  let mut members = Members::default();
  for ext in &spec.extensions {
    for name in closure.reachable_from(ext) {
      let Some(pkg) = closure.get(&name) else { continue };
      members.insert(Member {
        name: pkg.name.clone(),
        version: pkg.version.clone(),
        origin: format!("extension '{ext}'"),
      })?;
    }
  }

  if let Some(pkg) = package {
    if &pkg.target != target {
      return Err(AssembleError::ForeignArtifact {
        expected: target.clone(),
        found: pkg.target.clone(),
      });
    }
    let origin = format!("package '{}'", pkg.name);
    members.insert(Member {
      name: pkg.name.clone(),
      version: pkg.version.clone(),
      origin: origin.clone(),
    })?;
    for (name, version) in &pkg.runtime_closure {
      members.insert(Member {
        name: name.clone(),
        version: version.clone(),
        origin: origin.clone(),
      })?;
    }
  }

  check_declared_conflicts(&members, runtime)?;

  let mut tools = BTreeMap::new();
  for name in &spec.tools {
    let tool = index.tool(name, target).ok_or_else(|| AssembleError::UnknownTool {
      name: name.clone(),
      target: target.clone(),
    })?;
    tools.insert(tool.name, tool.version);
  }

  let (name, version) = match package {
    Some(pkg) => (format!("{}-shell", pkg.name), pkg.version.clone()),
    None => ("shell".to_string(), "0".to_string()),
  };

  let artifact = BuildArtifact {
    kind: ArtifactKind::Shell,
    target: target.clone(),
    name,
    version,
    runtime: RuntimeBinding::of(runtime),
    runtime_closure: members.by_name.into_values().map(|m| (m.name, m.version)).collect(),
    tools,
    provenance: Provenance::Environment(spec.clone()),
    source_hash: package.and_then(|pkg| pkg.source_hash.clone()),
    hash: ObjectHash(String::new()),
  }
  .seal()?;

  debug!(shell = %artifact.name, hash = %artifact.hash, packages = artifact.runtime_closure.len(), "shell assembled");
  Ok(artifact)
}

/// Reject any member that declares a conflict with another member.
fn check_declared_conflicts(members: &Members, runtime: &dyn RuntimeInstance) -> Result<(), AssembleError> {
  for member in members.by_name.values() {
    let Some(pkg) = runtime.resolve(&member.name) else {
      continue;
    };
    if let Some(other) = pkg.conflicts.iter().find_map(|c| members.by_name.get(c)) {
      return Err(AssembleError::Conflict {
        left: member.clone(),
        right: other.clone(),
      });
    }
  }
  Ok(())
}
