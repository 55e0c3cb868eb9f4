//! Declaration evaluation.
//!
//! [`evaluate`] loads a declaration, pins its inputs once, and reads the
//! supported target set and the package index. The resulting [`Evaluation`]
//! is plain data; per-target shells and packages are computed from it on
//! demand, sequentially or in parallel.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::BuildArtifact;
use crate::inputs::fetch::{Fetcher, GitFetcher};
use crate::inputs::{InputError, InputRegistry, ResolveError, resolve_inputs, save_lock_file_if_changed};
use crate::lua::{Declaration, SystemsDecl, load_declaration};
use crate::package::{BuildError, CheckRunner, PackageBuilder};
use crate::platform::{Matrix, SystemSet, SystemsError, Target, expand, expand_parallel, paths};
use crate::runtime::{IndexError, PackageIndex, Runtime, RuntimeVersion};
use crate::shell::{AssembleError, assemble};

/// Errors that abort a whole evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
  #[error("failed to load declaration '{}': {source}", path.display())]
  Lua {
    path: PathBuf,
    #[source]
    source: LuaError,
  },

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Input(#[from] InputError),

  #[error("invalid systems: {0}")]
  Systems(#[from] SystemsError),

  #[error(transparent)]
  Index(#[from] IndexError),

  #[error("declaration of input '{input}' must list its systems literally")]
  NestedSystems { input: String },
}

/// Errors confined to one target's slot.
#[derive(Debug, Error)]
pub enum TargetError {
  #[error("target '{0}' is not in the supported set")]
  UnsupportedTarget(Target),

  #[error("no runtime in the package index matches {version} on '{target}'")]
  NoRuntime { target: Target, version: RuntimeVersion },

  #[error("declaration defines no package")]
  NoPackage,

  #[error("declaration defines no shell")]
  NoShell,

  #[error("package '{package}' failed to build for '{target}', so its shell cannot be assembled")]
  PackageUnavailable { package: String, target: Target },

  #[error(transparent)]
  Index(#[from] IndexError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Assemble(#[from] AssembleError),
}

#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
  /// Inputs to re-resolve ignoring the lock. `Some(empty)` means all.
  pub force_update: Option<HashSet<String>>,
  /// Override for the git input cache directory.
  pub cache_dir: Option<PathBuf>,
}

/// The outputs of one target.
#[derive(Debug)]
pub struct TargetOutputs {
  pub shell: Result<BuildArtifact, TargetError>,
  pub package: Result<BuildArtifact, TargetError>,
}

/// An evaluated declaration.
#[derive(Debug, Clone)]
pub struct Evaluation {
  pub declaration: Declaration,
  pub registry: InputRegistry,
  pub systems: SystemSet,
  pub index: PackageIndex,
}

/// Evaluate the declaration at `path`, fetching git inputs into the cache.
pub fn evaluate(path: &Path, options: &EvalOptions) -> Result<Evaluation, EvalError> {
  let cache_dir = options.cache_dir.clone().unwrap_or_else(paths::inputs_cache_dir);
  evaluate_with(path, &GitFetcher::new(cache_dir), options)
}

/// Evaluate the declaration at `path` with a caller-provided fetcher.
pub fn evaluate_with(path: &Path, fetcher: &dyn Fetcher, options: &EvalOptions) -> Result<Evaluation, EvalError> {
  info!(path = %path.display(), "evaluating declaration");
  let declaration = load_declaration(path).map_err(|source| EvalError::Lua {
    path: path.to_path_buf(),
    source,
  })?;

  let result = resolve_inputs(
    &declaration.inputs,
    &declaration.dir,
    fetcher,
    options.force_update.as_ref(),
  )?;
  save_lock_file_if_changed(&result, &declaration.dir)?;
  let registry = result.registry;

  let systems = load_systems(&declaration.systems, &registry)?;
  let index_input = registry.get(&declaration.index.input)?;
  let index = PackageIndex::load(&index_input.file(&declaration.index.file)?)?;

  info!(
    inputs = registry.len(),
    systems = systems.len(),
    runtimes = index.runtimes.len(),
    "declaration evaluated"
  );

  Ok(Evaluation {
    declaration,
    registry,
    systems,
    index,
  })
}

fn load_systems(decl: &SystemsDecl, registry: &InputRegistry) -> Result<SystemSet, EvalError> {
  match decl {
    SystemsDecl::Default => Ok(SystemSet::default_set()),
    SystemsDecl::List(ids) => Ok(SystemSet::from_list(ids.iter().cloned())?),
    SystemsDecl::File(file_ref) => {
      let input = registry.get(&file_ref.input)?;
      Ok(SystemSet::from_json_file(&input.file(&file_ref.file)?)?)
    }
    SystemsDecl::Input(name) => {
      let input = registry.get(name)?;
      let path = input.declaration_path()?;
      debug!(input = %name, path = %path.display(), "reading systems from nested declaration");
      let nested = load_declaration(&path).map_err(|source| EvalError::Lua { path, source })?;
      match nested.systems {
        SystemsDecl::Default => Ok(SystemSet::default_set()),
        SystemsDecl::List(ids) => Ok(SystemSet::from_list(ids)?),
        SystemsDecl::File(_) | SystemsDecl::Input(_) => Err(EvalError::NestedSystems { input: name.clone() }),
      }
    }
  }
}

impl Evaluation {
  fn check_target(&self, target: &Target) -> Result<(), TargetError> {
    if !self.systems.contains(target) {
      return Err(TargetError::UnsupportedTarget(target.clone()));
    }
    Ok(())
  }

  /// The runtime instance selected for `target`: the first index runtime that
  /// supports it and matches the shell's runtime version.
  pub fn runtime_for(&self, target: &Target) -> Result<Runtime, TargetError> {
    self.check_target(target)?;
    let version = match (&self.declaration.shell, &self.declaration.package) {
      (Some(shell), _) => &shell.runtime_version,
      (None, Some(pkg)) => &pkg.min_runtime_version,
      (None, None) => return Err(TargetError::NoShell),
    };
    self
      .index
      .select_runtime(target, version)
      .ok_or_else(|| TargetError::NoRuntime {
        target: target.clone(),
        version: version.clone(),
      })
  }

  pub fn builder(&self) -> Result<PackageBuilder, TargetError> {
    let spec = self.declaration.package.clone().ok_or(TargetError::NoPackage)?;
    Ok(PackageBuilder::new(spec))
  }

  /// Build the package for `target` with the selected runtime.
  pub fn package(&self, target: &Target, checker: &dyn CheckRunner) -> Result<BuildArtifact, TargetError> {
    let builder = self.builder()?;
    let runtime = self.runtime_for(target)?;
    Ok(builder.build(&runtime, checker)?)
  }

  /// Build the package for `target` against the index runtime `runtime_id`.
  pub fn package_with_runtime(
    &self,
    target: &Target,
    runtime_id: &str,
    checker: &dyn CheckRunner,
  ) -> Result<BuildArtifact, TargetError> {
    self.check_target(target)?;
    let builder = self.builder()?;
    let runtime = self.index.runtime(runtime_id, target)?;
    Ok(builder.build(&runtime, checker)?)
  }

  /// Assemble the shell for `target`, including the package built for it.
  pub fn shell(&self, target: &Target, checker: &dyn CheckRunner) -> Result<BuildArtifact, TargetError> {
    let package = match &self.declaration.package {
      Some(_) => Some(self.package(target, checker)?),
      None => None,
    };
    self.assemble_shell(target, package.as_ref())
  }

  fn assemble_shell(&self, target: &Target, package: Option<&BuildArtifact>) -> Result<BuildArtifact, TargetError> {
    let spec = self.declaration.shell.as_ref().ok_or(TargetError::NoShell)?;
    let runtime = self.runtime_for(target)?;
    Ok(assemble(spec, &runtime, &self.index, package)?)
  }

  /// Both outputs of one target. The package is built once and reused by
  /// the shell.
  pub fn outputs(&self, target: &Target, checker: &dyn CheckRunner) -> TargetOutputs {
    let package = self.package(target, checker);
    let shell = match (&package, &self.declaration.package) {
      (Ok(pkg), _) => self.assemble_shell(target, Some(pkg)),
      (Err(TargetError::NoPackage), _) | (Err(_), None) => self.assemble_shell(target, None),
      (Err(_), Some(spec)) => Err(TargetError::PackageUnavailable {
        package: spec.name.clone(),
        target: target.clone(),
      }),
    };
    TargetOutputs { shell, package }
  }

  /// Outputs for every supported target, one at a time.
  pub fn expand(&self, checker: &dyn CheckRunner) -> Matrix<TargetOutputs> {
    expand(&self.systems, |target| self.outputs(target, checker))
  }

  /// Outputs for every supported target, on the rayon pool.
  pub fn expand_parallel(&self, checker: &dyn CheckRunner) -> Matrix<TargetOutputs> {
    expand_parallel(&self.systems, |target| self.outputs(target, checker))
  }
}
