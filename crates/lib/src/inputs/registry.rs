//! Input resolution and the read-only input registry.
//!
//! Every declared input is resolved exactly once at the start of an
//! evaluation:
//!
//! - If the locator names a rev (`#v1.0.0`): use it, re-pin the lock if it differs
//! - If locked and the URL matches: use the locked revision
//! - If locked but the URL differs: error (requires `pinfold update`)
//! - If not locked: resolve the remote HEAD and add it to the lock file
//!
//! Path inputs are pinned to the content hash of their tree.
//!
//! The resulting [`InputRegistry`] only hands out shared references, so a
//! name resolves to the same revision for the rest of the evaluation.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::fetch::{FetchError, Fetcher, path_revision, resolve_path};
use super::lock::{LockError, LockFile, LockedInput, SourceKind};
use super::locator::{Locator, ParseError, parse};
use super::{InputDecls, ResolvedInput, ResolvedInputs};
use crate::consts::LOCK_FILENAME;

/// Errors that can occur during input resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("failed to parse input '{name}': {source}")]
  Parse {
    name: String,
    #[source]
    source: ParseError,
  },

  #[error("input '{name}' URL changed from '{locked_url}' to '{config_url}'. Run 'pinfold update {name}' to update.")]
  LockMismatch {
    name: String,
    locked_url: String,
    config_url: String,
  },

  #[error("failed to resolve input '{name}': {source}")]
  Fetch {
    name: String,
    #[source]
    source: FetchError,
  },

  #[error("no input named '{name}' is declared")]
  UnknownInput { name: String },

  #[error("failed to load lock file: {0}")]
  LoadLock(#[source] LockError),

  #[error("failed to save lock file: {0}")]
  SaveLock(#[source] LockError),
}

/// Read-only view of the inputs pinned for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRegistry {
  inputs: ResolvedInputs,
}

impl InputRegistry {
  pub fn new(inputs: ResolvedInputs) -> Self {
    Self { inputs }
  }

  pub fn get(&self, name: &str) -> Result<&ResolvedInput, ResolveError> {
    self.inputs.get(name).ok_or_else(|| ResolveError::UnknownInput {
      name: name.to_string(),
    })
  }

  pub fn iter(&self) -> impl Iterator<Item = &ResolvedInput> {
    self.inputs.values()
  }

  pub fn len(&self) -> usize {
    self.inputs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inputs.is_empty()
  }

  /// Revisions keyed by input name.
  pub fn revisions(&self) -> BTreeMap<String, String> {
    self.inputs.iter().map(|(k, v)| (k.clone(), v.rev.clone())).collect()
  }
}

/// Result of input resolution.
#[derive(Debug)]
pub struct ResolutionResult {
  pub registry: InputRegistry,
  /// Updated lock file (may have new entries).
  pub lock_file: LockFile,
  /// Whether the lock file changed and should be written.
  pub lock_changed: bool,
}

/// Resolve all declared inputs.
///
/// `force_update`:
/// - `None`: use lock file revisions when available
/// - `Some(empty set)`: ignore the lock for every input
/// - `Some(names)`: ignore the lock for the named inputs only
pub fn resolve_inputs(
  decls: &InputDecls,
  config_dir: &Path,
  fetcher: &dyn Fetcher,
  force_update: Option<&HashSet<String>>,
) -> Result<ResolutionResult, ResolveError> {
  let lock_path = config_dir.join(LOCK_FILENAME);
  let mut lock_file = LockFile::load(&lock_path)
    .map_err(ResolveError::LoadLock)?
    .unwrap_or_default();

  let mut resolved = BTreeMap::new();
  let mut lock_changed = false;

  info!(count = decls.len(), "resolving inputs");

  for (name, decl) in decls {
    debug!(name, url = %decl.url, "resolving input");

    let locator = parse(&decl.url).map_err(|e| ResolveError::Parse {
      name: name.clone(),
      source: e,
    })?;

    let locked_entry = lock_file.get(name).cloned();
    let should_force = force_update
      .map(|set| set.is_empty() || set.contains(name))
      .unwrap_or(false);

    if !should_force
      && let Some(locked) = &locked_entry
      && locked.url != decl.url
    {
      return Err(ResolveError::LockMismatch {
        name: name.clone(),
        locked_url: locked.url.clone(),
        config_url: decl.url.clone(),
      });
    }

    let fetch_err = |e| ResolveError::Fetch {
      name: name.clone(),
      source: e,
    };

    let (path, rev) = match &locator {
      Locator::Git { url, rev: config_rev } => {
        let target_rev = if should_force {
          config_rev.as_deref()
        } else {
          config_rev.as_deref().or(locked_entry.as_ref().map(|e| e.rev.as_str()))
        };
        fetcher.fetch_git(name, url, target_rev).map_err(fetch_err)?
      }
      Locator::Path { path } => {
        let resolved_path = resolve_path(&path.to_string_lossy(), config_dir).map_err(fetch_err)?;
        let rev = path_revision(&resolved_path).map_err(fetch_err)?;
        (resolved_path, rev)
      }
    };

    let should_update_lock = match &locked_entry {
      None => true,
      Some(locked) => locked.rev != rev || locked.url != decl.url,
    };

    if should_update_lock {
      info!(name, rev = %rev, "locking input");
      lock_file.pin(name, LockedInput::pinned(SourceKind::from(&locator), &decl.url, &rev));
      lock_changed = true;
    }

    resolved.insert(
      name.clone(),
      ResolvedInput {
        name: name.clone(),
        url: decl.url.clone(),
        path,
        rev,
        evaluable: decl.evaluable,
      },
    );
  }

  for stale in lock_file.prune(|name| decls.contains_key(name)) {
    warn!(name = %stale, "removing stale input from lock file");
    lock_changed = true;
  }

  Ok(ResolutionResult {
    registry: InputRegistry::new(resolved),
    lock_file,
    lock_changed,
  })
}

/// Save the lock file if it changed.
pub fn save_lock_file_if_changed(result: &ResolutionResult, config_dir: &Path) -> Result<(), ResolveError> {
  if result.lock_changed {
    let lock_path = config_dir.join(LOCK_FILENAME);
    info!(path = %lock_path.display(), "writing lock file");
    result.lock_file.save(&lock_path).map_err(ResolveError::SaveLock)?;
  }
  Ok(())
}
