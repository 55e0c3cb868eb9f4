//! The lock file, `pinfold.lock`.
//!
//! Records the revision every input was pinned to, so later evaluations see
//! the same inputs no matter when they run. It sits next to the declaration
//! as pretty-printed JSON:
//!
//! ```json
//! {
//!   "version": 1,
//!   "inputs": {
//!     "pkgs": {
//!       "type": "git",
//!       "url": "git:https://github.com/acme/pkg-index.git",
//!       "rev": "a1b2c3d4...",
//!       "lastModified": 1733667300
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::locator::Locator;

pub const LOCK_VERSION: u32 = 1;

/// Where a locked input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  Git,
  Path,
}

impl From<&Locator> for SourceKind {
  fn from(locator: &Locator) -> Self {
    match locator {
      Locator::Git { .. } => SourceKind::Git,
      Locator::Path { .. } => SourceKind::Path,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedInput {
  #[serde(rename = "type")]
  pub kind: SourceKind,
  /// Locator exactly as declared.
  pub url: String,
  /// Commit id for git inputs, tree content hash for path inputs.
  pub rev: String,
  /// Unix time the entry was written.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_modified: Option<u64>,
}

impl LockedInput {
  /// An entry pinning `url` to `rev`, stamped with the current time.
  pub fn pinned(kind: SourceKind, url: impl Into<String>, rev: impl Into<String>) -> Self {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs());
    Self {
      kind,
      url: url.into(),
      rev: rev.into(),
      last_modified: now,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
  pub version: u32,
  pub inputs: BTreeMap<String, LockedInput>,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error("failed to access '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("'{}' is not a valid lock file: {source}", path.display())]
  Malformed {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("'{}' uses lock format {found}, expected {LOCK_VERSION}", path.display())]
  UnsupportedVersion { path: PathBuf, found: u32 },
}

impl Default for LockFile {
  fn default() -> Self {
    Self {
      version: LOCK_VERSION,
      inputs: BTreeMap::new(),
    }
  }
}

impl LockFile {
  /// Read the lock file at `path`; `Ok(None)` when there is none yet.
  pub fn load(path: &Path) -> Result<Option<Self>, LockError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(LockError::Io {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let lock: LockFile = serde_json::from_str(&content).map_err(|source| LockError::Malformed {
      path: path.to_path_buf(),
      source,
    })?;
    if lock.version != LOCK_VERSION {
      return Err(LockError::UnsupportedVersion {
        path: path.to_path_buf(),
        found: lock.version,
      });
    }
    Ok(Some(lock))
  }

  pub fn save(&self, path: &Path) -> Result<(), LockError> {
    let io_err = |source| LockError::Io {
      path: path.to_path_buf(),
      source,
    };
    let mut content = serde_json::to_string_pretty(self).map_err(|e| io_err(e.into()))?;
    content.push('\n');
    fs::write(path, content).map_err(io_err)
  }

  pub fn get(&self, name: &str) -> Option<&LockedInput> {
    self.inputs.get(name)
  }

  pub fn pin(&mut self, name: &str, entry: LockedInput) {
    self.inputs.insert(name.to_string(), entry);
  }

  /// Drop entries for inputs that are no longer declared and return their
  /// names.
  pub fn prune(&mut self, declared: impl Fn(&str) -> bool) -> Vec<String> {
    let mut stale = Vec::new();
    self.inputs.retain(|name, _| {
      let keep = declared(name);
      if !keep {
        stale.push(name.clone());
      }
      keep
    });
    stale
  }
}
