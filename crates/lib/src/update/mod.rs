//! Input updates.
//!
//! `pinfold update` re-resolves inputs ignoring their locked revisions and
//! rewrites the lock file.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::{DECL_FILENAME, LOCK_FILENAME};
use crate::inputs::fetch::{Fetcher, GitFetcher};
use crate::inputs::lock::{LockError, LockFile};
use crate::inputs::{InputRegistry, ResolveError, resolve_inputs, save_lock_file_if_changed};
use crate::lua::entrypoint::extract_input_decls;
use crate::platform::paths::inputs_cache_dir;

#[derive(Debug, Default)]
pub struct UpdateOptions {
  /// Inputs to update. Empty means all.
  pub inputs: Vec<String>,
  /// Resolve and report without writing the lock file.
  pub dry_run: bool,
}

#[derive(Debug)]
pub struct UpdateResult {
  /// Inputs whose revision moved: name -> (old_rev, new_rev).
  pub updated: BTreeMap<String, (String, String)>,
  pub unchanged: Vec<String>,
  /// Inputs that were not locked before.
  pub added: Vec<String>,
  /// Locked inputs no longer declared.
  pub removed: Vec<String>,
  pub registry: InputRegistry,
  pub lock_changed: bool,
}

#[derive(Debug, Error)]
pub enum UpdateError {
  #[error("declaration not found: {path}")]
  DeclarationNotFound { path: String },

  #[error("failed to extract inputs from declaration: {0}")]
  ExtractInputs(#[from] mlua::Error),

  #[error("failed to resolve inputs: {0}")]
  Resolve(#[from] ResolveError),

  #[error("failed to load lock file: {0}")]
  LoadLock(#[source] LockError),

  #[error("input '{name}' is not declared")]
  InputNotFound { name: String },
}

/// Find the declaration file: the explicit path if given, else `./pinfold.lua`.
pub fn find_declaration_path(explicit: Option<&Path>) -> Result<PathBuf, UpdateError> {
  let path = explicit.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DECL_FILENAME));
  if path.is_file() {
    Ok(path)
  } else {
    Err(UpdateError::DeclarationNotFound {
      path: path.display().to_string(),
    })
  }
}

/// Update inputs, fetching git inputs into the default cache.
pub fn update_inputs(decl_path: &Path, options: &UpdateOptions) -> Result<UpdateResult, UpdateError> {
  update_inputs_with(decl_path, &GitFetcher::new(inputs_cache_dir()), options)
}

pub fn update_inputs_with(
  decl_path: &Path,
  fetcher: &dyn Fetcher,
  options: &UpdateOptions,
) -> Result<UpdateResult, UpdateError> {
  let decl_dir = decl_path.parent().unwrap_or(Path::new("."));
  info!(path = %decl_path.display(), "loading declaration for update");

  let decls = extract_input_decls(decl_path)?;
  for name in &options.inputs {
    if !decls.contains_key(name) {
      return Err(UpdateError::InputNotFound { name: name.clone() });
    }
  }

  let old_lock = LockFile::load(&decl_dir.join(LOCK_FILENAME))
    .map_err(UpdateError::LoadLock)?
    .unwrap_or_default();

  let force_update: HashSet<String> = if options.inputs.is_empty() {
    decls.keys().cloned().collect()
  } else {
    options.inputs.iter().cloned().collect()
  };
  info!(count = decls.len(), forced = force_update.len(), "re-resolving inputs");

  let result = resolve_inputs(&decls, decl_dir, fetcher, Some(&force_update))?;

  let mut updated = BTreeMap::new();
  let mut unchanged = Vec::new();
  let mut added = Vec::new();
  for input in result.registry.iter() {
    match old_lock.get(&input.name) {
      Some(old) if old.rev != input.rev => {
        updated.insert(input.name.clone(), (old.rev.clone(), input.rev.clone()));
      }
      Some(_) => unchanged.push(input.name.clone()),
      None => added.push(input.name.clone()),
    }
  }
  let removed = old_lock
    .inputs
    .keys()
    .filter(|name| !decls.contains_key(*name))
    .cloned()
    .collect();

  if !options.dry_run {
    save_lock_file_if_changed(&result, decl_dir)?;
  }

  Ok(UpdateResult {
    updated,
    unchanged,
    added,
    removed,
    lock_changed: result.lock_changed,
    registry: result.registry,
  })
}
