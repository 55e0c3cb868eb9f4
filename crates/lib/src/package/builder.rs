//! The package builder.
//!
//! [`build`] is a pure function of a [`PackageSpec`], a runtime instance and
//! the two phase runners. It never looks at the declaration that produced the
//! spec, so a caller holding a different runtime instance gets an equivalently
//! specified artifact whose names are re-resolved against its own index.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::check::{CheckContext, CheckError, CheckRunner};
use super::construct::{CommandConstruct, ConstructContext, ConstructError, Constructor};
use super::metadata::{MetadataError, ProjectMetadata, normalize_name, read_metadata};
use super::types::{PackageSpec, Tier};
use crate::artifact::{ArtifactKind, BuildArtifact, Provenance, RuntimeBinding};
use crate::consts::TREE_HASH_EXCLUDES;
use crate::runtime::{RuntimeInstance, RuntimeVersion, UnresolvedNames, resolve_closure};
use crate::util::hash::{DirHashError, HashError, ObjectHash, hash_directory};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("package '{package}' requires runtime >= {required}, but '{runtime}' is {found}")]
  UnsupportedRuntime {
    package: String,
    required: RuntimeVersion,
    runtime: String,
    found: RuntimeVersion,
  },

  #[error("dependencies listed in more than one tier: {}", .names.join(", "))]
  OverlappingTiers { names: Vec<String> },

  #[error("unresolved dependencies for '{package}' in runtime '{runtime}': {names}")]
  UnresolvedDependency {
    package: String,
    runtime: String,
    names: UnresolvedNames,
  },

  #[error(transparent)]
  Metadata(#[from] MetadataError),

  #[error("{file} requires {} not provided by the {tier} tier", .names.join(", "))]
  MissingDeclaredDependency {
    file: &'static str,
    tier: Tier,
    names: Vec<String>,
  },

  #[error("construction failed for '{package}': {source}")]
  ConstructFailure {
    package: String,
    #[source]
    source: ConstructError,
  },

  #[error("check failed for '{package}': {source}")]
  CheckFailure {
    package: String,
    #[source]
    source: CheckError,
  },

  #[error("failed to create build directory: {0}")]
  Workspace(#[source] io::Error),

  #[error("failed to stage '{}': {source}", path.display())]
  Stage {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to hash source tree: {0}")]
  SourceHash(#[from] DirHashError),

  #[error("failed to hash artifact: {0}")]
  Hash(#[from] HashError),
}

/// Build `spec` against `runtime`.
///
/// Steps, each fatal on failure:
/// 1. the runtime must be at least `min_runtime_version`
/// 2. the three dependency tiers must be disjoint
/// 3. every name in every tier, and what it propagates, must resolve
/// 4. the project metadata must parse and its declared requirements must be
///    covered by the matching tier
/// 5. the source is staged into a scratch artifact directory and the build
///    command, if any, runs there with the build tier visible
/// 6. the check command, if any, runs against that directory with the check
///    tier and the runtime closure visible
///
/// The artifact's closure is the `runtime_deps` closure only.
pub fn build(
  spec: &PackageSpec,
  runtime: &dyn RuntimeInstance,
  constructor: &dyn Constructor,
  checker: &dyn CheckRunner,
) -> Result<BuildArtifact, BuildError> {
  info!(
    package = %spec.name,
    version = %spec.version,
    runtime = runtime.id(),
    target = %runtime.target(),
    "building package"
  );

  if runtime.version() < &spec.min_runtime_version {
    return Err(BuildError::UnsupportedRuntime {
      package: spec.name.clone(),
      required: spec.min_runtime_version.clone(),
      runtime: runtime.id().to_string(),
      found: runtime.version().clone(),
    });
  }

  let overlaps = spec.tier_overlaps();
  if !overlaps.is_empty() {
    return Err(BuildError::OverlappingTiers {
      names: overlaps.into_iter().map(|(name, _)| name).collect(),
    });
  }

  resolve_closure(runtime, spec.all_deps()).map_err(|names| BuildError::UnresolvedDependency {
    package: spec.name.clone(),
    runtime: runtime.id().to_string(),
    names,
  })?;

  let metadata = verify_metadata(spec)?;
  let runtime_closure = resolved_versions(spec, runtime, Tier::Runtime)?;

  let workspace = tempfile::Builder::new()
    .prefix("pinfold-build-")
    .tempdir()
    .map_err(BuildError::Workspace)?;
  let artifact_dir = workspace.path().join("artifact");
  stage_source(&spec.source_root, &artifact_dir)?;

  if let Some(command) = &spec.build {
    let build_deps = resolved_versions(spec, runtime, Tier::Build)?;
    let scratch_dir = workspace.path().join("build");
    let ctx = ConstructContext {
      package: &spec.name,
      version: &spec.version,
      runtime: runtime.id(),
      build_backend: metadata.build_backend.as_deref(),
      artifact_dir: &artifact_dir,
      scratch_dir: &scratch_dir,
      build_deps: &build_deps,
    };
    constructor
      .construct(command, &ctx)
      .map_err(|source| BuildError::ConstructFailure {
        package: spec.name.clone(),
        source,
      })?;
  }

  if let Some(command) = &spec.check {
    let check_deps = resolved_versions(spec, runtime, Tier::Check)?;
    let out_dir = workspace.path().join("check");
    let ctx = CheckContext {
      package: &spec.name,
      version: &spec.version,
      runtime: runtime.id(),
      artifact_dir: &artifact_dir,
      out_dir: &out_dir,
      check_deps: &check_deps,
      runtime_closure: &runtime_closure,
    };
    checker.run(command, &ctx).map_err(|source| BuildError::CheckFailure {
      package: spec.name.clone(),
      source,
    })?;
  }

  let source_hash = hash_directory(&spec.source_root, TREE_HASH_EXCLUDES)?;

  let artifact = BuildArtifact {
    kind: ArtifactKind::Package,
    target: runtime.target().clone(),
    name: spec.name.clone(),
    version: spec.version.clone(),
    runtime: RuntimeBinding::of(runtime),
    runtime_closure,
    tools: Default::default(),
    provenance: Provenance::Package(spec.clone()),
    source_hash: Some(source_hash),
    hash: ObjectHash(String::new()),
  }
  .seal()?;

  info!(package = %artifact.name, hash = %artifact.hash, closure = artifact.runtime_closure.len(), "package built");
  Ok(artifact)
}

fn resolved_versions(
  spec: &PackageSpec,
  runtime: &dyn RuntimeInstance,
  tier: Tier,
) -> Result<BTreeMap<String, String>, BuildError> {
  let closure = resolve_closure(runtime, spec.tier(tier).iter().map(String::as_str)).map_err(|names| {
    BuildError::UnresolvedDependency {
      package: spec.name.clone(),
      runtime: runtime.id().to_string(),
      names,
    }
  })?;
  debug!(package = %spec.name, %tier, packages = closure.len(), "resolved tier");
  Ok(closure.versions())
}

fn verify_metadata(spec: &PackageSpec) -> Result<ProjectMetadata, BuildError> {
  let metadata = read_metadata(spec.build_format, &spec.source_root)?;
  let file = spec.build_format.metadata_file();

  if let Some(name) = &metadata.name
    && normalize_name(name) != normalize_name(&spec.name)
  {
    warn!(file, declared = %spec.name, found = %name, "package name differs from project metadata");
  }
  if let Some(version) = &metadata.version
    && version != &spec.version
  {
    warn!(file, declared = %spec.version, found = %version, "package version differs from project metadata");
  }

  for (tier, required) in [
    (Tier::Build, &metadata.build_requires),
    (Tier::Runtime, &metadata.dependencies),
  ] {
    let provided: BTreeSet<String> = spec.tier(tier).iter().map(|n| normalize_name(n)).collect();
    let names: Vec<String> = required.difference(&provided).cloned().collect();
    if !names.is_empty() {
      return Err(BuildError::MissingDeclaredDependency { file, tier, names });
    }
  }
  Ok(metadata)
}

/// Copy the source tree into `dest`, leaving out VCS metadata and build
/// leftovers.
fn stage_source(src: &Path, dest: &Path) -> Result<(), BuildError> {
  let walker = WalkDir::new(src).into_iter().filter_entry(|e| {
    e.depth() == 0
      || !e
        .file_name()
        .to_str()
        .is_some_and(|name| TREE_HASH_EXCLUDES.contains(&name))
  });

  for entry in walker {
    let entry = entry.map_err(|e| BuildError::Stage {
      path: src.to_path_buf(),
      source: e.into(),
    })?;
    let target = dest.join(entry.path().strip_prefix(src).unwrap_or(entry.path()));
    let kind = entry.file_type();

    let copied = if kind.is_dir() {
      fs::create_dir_all(&target)
    } else if kind.is_symlink() {
      copy_link(entry.path(), &target)
    } else {
      fs::copy(entry.path(), &target).map(|_| ())
    };
    copied.map_err(|source| BuildError::Stage { path: target, source })?;
  }

  debug!(from = %src.display(), to = %dest.display(), "staged source");
  Ok(())
}

#[cfg(unix)]
fn copy_link(src: &Path, dest: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(fs::read_link(src)?, dest)
}

#[cfg(not(unix))]
fn copy_link(src: &Path, dest: &Path) -> io::Result<()> {
  fs::copy(src, dest).map(|_| ())
}

/// A package spec bound once and built against any runtime instance.
#[derive(Clone)]
pub struct PackageBuilder {
  spec: PackageSpec,
  constructor: Arc<dyn Constructor>,
}

impl fmt::Debug for PackageBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PackageBuilder")
      .field("spec", &self.spec)
      .finish_non_exhaustive()
  }
}

impl PackageBuilder {
  /// A builder whose construction phase runs the spec's build command with
  /// [`CommandConstruct`].
  pub fn new(spec: PackageSpec) -> Self {
    Self {
      spec,
      constructor: Arc::new(CommandConstruct::new()),
    }
  }

  pub fn with_constructor(mut self, constructor: impl Constructor + 'static) -> Self {
    self.constructor = Arc::new(constructor);
    self
  }

  pub fn spec(&self) -> &PackageSpec {
    &self.spec
  }

  pub fn build(&self, runtime: &dyn RuntimeInstance, checker: &dyn CheckRunner) -> Result<BuildArtifact, BuildError> {
    build(&self.spec, runtime, self.constructor.as_ref(), checker)
  }
}
