//! Content addressing.
//!
//! Artifacts are identified by an [`ObjectHash`], a truncated SHA-256 of their
//! canonical JSON form. Source trees, path inputs and cache keys use a full
//! [`ContentHash`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::{DirEntry, WalkDir};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// Truncated digest naming a sealed artifact.
///
/// Every collection inside a hashed value is ordered, so equal values
/// serialize, and therefore hash, identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_vec(self)?;
    let mut full = hash_bytes(&serialized).0;
    full.truncate(OBJ_HASH_PREFIX_LEN);
    Ok(ObjectHash(full))
  }
}

/// Full hex SHA-256 of some content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk '{}': {source}", root.display())]
  Walk {
    root: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to read '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Digest of a tree's file contents, layout and symlink targets.
///
/// Timestamps and permissions do not contribute. Entries whose file name is in
/// `exclude` are skipped along with everything beneath them.
pub fn hash_directory(root: &Path, exclude: &[&str]) -> Result<ContentHash, DirHashError> {
  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !is_excluded(e, exclude));

  let mut lines: Vec<String> = Vec::new();
  for entry in walker {
    let entry = entry.map_err(|source| DirHashError::Walk {
      root: root.to_path_buf(),
      source,
    })?;
    if entry.depth() == 0 {
      continue;
    }

    let key = entry
      .path()
      .strip_prefix(root)
      .unwrap_or(entry.path())
      .to_string_lossy()
      .replace('\\', "/");
    let kind = entry.file_type();

    let line = if kind.is_dir() {
      format!("D:{key}")
    } else if kind.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(read_error(entry.path()))?;
      format!("L:{key}:{}", target.to_string_lossy())
    } else if kind.is_file() {
      format!("F:{key}:{}", file_digest(entry.path())?)
    } else {
      continue;
    };
    lines.push(line);
  }

  lines.sort();

  let mut tree = Sha256::new();
  for line in &lines {
    tree.update(line.as_bytes());
    tree.update(b"\n");
  }
  Ok(ContentHash(format!("{:x}", tree.finalize())))
}

pub fn hash_bytes(data: &[u8]) -> ContentHash {
  ContentHash(format!("{:x}", Sha256::digest(data)))
}

fn is_excluded(entry: &DirEntry, exclude: &[&str]) -> bool {
  entry.file_name().to_str().is_some_and(|name| exclude.contains(&name))
}

fn file_digest(path: &Path) -> Result<String, DirHashError> {
  let mut file = fs::File::open(path).map_err(read_error(path))?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher).map_err(read_error(path))?;
  Ok(format!("{:x}", hasher.finalize()))
}

fn read_error(path: &Path) -> impl FnOnce(io::Error) -> DirHashError + '_ {
  move |source| DirHashError::Read {
    path: path.to_path_buf(),
    source,
  }
}
