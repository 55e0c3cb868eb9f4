//! Git and path inputs.
//!
//! The remote registry is an external collaborator reached through
//! [`Fetcher`]. [`GitFetcher`] keeps one bare mirror per input name and
//! remote, and extracts every pinned commit into a directory of its own:
//!
//! ```text
//! <cache>/<name>-<url digest>/repo.git
//! <cache>/<name>-<url digest>/trees/<commit>/
//! ```
//!
//! An extracted tree is written once and never touched again, so a pinned
//! commit keeps serving the same files after the mirror has moved on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gix::remote::Direction;
use gix::revision::spec::parse::Error as RevParseError;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::consts::TREE_HASH_EXCLUDES;
use crate::platform::paths::home_dir;
use crate::util::hash::{DirHashError, hash_bytes, hash_directory};

/// Hex digits of the URL digest that keep two remotes of one input apart.
const URL_KEY_LEN: usize = 12;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to create cache directory '{0}': {1}")]
  CreateCacheDir(PathBuf, #[source] io::Error),

  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: BoxError,
  },

  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  #[error("failed to connect to remote '{url}': {source}")]
  Connect {
    url: String,
    #[source]
    source: BoxError,
  },

  #[error("failed to fetch from '{url}': {source}")]
  Fetch {
    url: String,
    #[source]
    source: BoxError,
  },

  #[error("revision '{rev}' not found in repository")]
  RevisionNotFound { rev: String },

  /// A revision qualifier matched more than one object.
  #[error("revision '{rev}' is ambiguous")]
  AmbiguousRevision { rev: String },

  #[error("failed to read tree of '{rev}': {source}")]
  ReadTree {
    rev: String,
    #[source]
    source: BoxError,
  },

  #[error("failed to extract '{}': {source}", path.display())]
  Extract {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("path does not exist: {0}")]
  PathNotFound(PathBuf),

  #[error("failed to resolve path '{path}': {source}")]
  CanonicalizePath {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to hash path input: {0}")]
  HashTree(#[from] DirHashError),
}

/// Resolves a git locator to an immutable tree and an exact commit id.
pub trait Fetcher {
  /// Returns `(tree, commit)`. With `rev == None` the remote's HEAD is used.
  fn fetch_git(&self, name: &str, url: &str, rev: Option<&str>) -> Result<(PathBuf, String), FetchError>;
}

/// [`Fetcher`] backed by bare mirrors in a local cache directory.
#[derive(Debug, Clone)]
pub struct GitFetcher {
  cache_dir: PathBuf,
}

impl GitFetcher {
  pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
    Self {
      cache_dir: cache_dir.into(),
    }
  }

  /// Cache slot for one input name and remote.
  fn slot(&self, name: &str, url: &str) -> PathBuf {
    let digest = hash_bytes(url.as_bytes());
    self.cache_dir.join(format!("{name}-{}", &digest.0[..URL_KEY_LEN]))
  }
}

impl Fetcher for GitFetcher {
  fn fetch_git(&self, name: &str, url: &str, rev: Option<&str>) -> Result<(PathBuf, String), FetchError> {
    let slot = self.slot(name, url);
    fs::create_dir_all(&slot).map_err(|e| FetchError::CreateCacheDir(slot.clone(), e))?;

    let repo = sync_mirror(url, &slot.join("repo.git"))?;
    let commit = resolve_commit(&repo, rev)?;
    let commit_id = commit.id.to_string();

    let tree_dir = slot.join("trees").join(&commit_id);
    if tree_dir.is_dir() {
      trace!(name, rev = %commit_id, "tree already extracted");
    } else {
      debug!(name, rev = %commit_id, path = %tree_dir.display(), "extracting tree");
      extract_tree(&repo, &commit, &tree_dir)?;
    }

    debug!(name, rev = %commit_id, "resolved revision");
    Ok((tree_dir, commit_id))
  }
}

/// Bring the mirror at `path` up to date with `url`, cloning it if needed.
fn sync_mirror(url: &str, path: &Path) -> Result<gix::Repository, FetchError> {
  if path.join("HEAD").is_file() {
    let repo = gix::open(path).map_err(|e| FetchError::Open {
      path: path.to_path_buf(),
      source: Box::new(e),
    })?;
    refresh(&repo, url)?;
    return Ok(repo);
  }

  // Left behind by an interrupted clone.
  if path.exists() {
    fs::remove_dir_all(path).map_err(|e| FetchError::CreateCacheDir(path.to_path_buf(), e))?;
  }

  info!(url, path = %path.display(), "cloning mirror");
  let clone_err = |e: BoxError| FetchError::Clone {
    url: url.to_string(),
    source: e,
  };
  let (repo, _outcome) = gix::prepare_clone_bare(url, path)
    .map_err(|e| clone_err(Box::new(e)))?
    .fetch_only(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| clone_err(Box::new(e)))?;
  Ok(repo)
}

fn refresh(repo: &gix::Repository, url: &str) -> Result<(), FetchError> {
  debug!(url, "fetching updates");
  let connect_err = |e: BoxError| FetchError::Connect {
    url: url.to_string(),
    source: e,
  };
  let fetch_err = |e: BoxError| FetchError::Fetch {
    url: url.to_string(),
    source: e,
  };

  repo
    .find_remote("origin")
    .map_err(|e| connect_err(Box::new(e)))?
    .connect(Direction::Fetch)
    .map_err(|e| connect_err(Box::new(e)))?
    .prepare_fetch(gix::progress::Discard, Default::default())
    .map_err(|e| fetch_err(Box::new(e)))?
    .receive(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| fetch_err(Box::new(e)))?;
  Ok(())
}

/// Resolve a revision qualifier to a commit.
///
/// Branch names refer to the remote's branches, so they are tried as
/// `refs/remotes/origin/<rev>` first, then as tags, then as anything
/// `rev-parse` accepts (commit ids included).
fn resolve_commit<'repo>(repo: &'repo gix::Repository, rev: Option<&str>) -> Result<gix::Commit<'repo>, FetchError> {
  let wanted = rev.unwrap_or("HEAD");
  let candidates = match rev {
    None => vec!["refs/remotes/origin/HEAD".to_string(), "HEAD".to_string()],
    Some(rev) => vec![
      format!("refs/remotes/origin/{rev}"),
      format!("refs/tags/{rev}"),
      rev.to_string(),
    ],
  };

  for candidate in &candidates {
    let spec = match repo.rev_parse(candidate.as_str()) {
      Ok(spec) => spec,
      Err(RevParseError::AmbiguousPrefix { .. } | RevParseError::AmbiguousRefAndObject { .. }) => {
        return Err(FetchError::AmbiguousRevision { rev: wanted.to_string() });
      }
      Err(err) => {
        trace!(candidate, %err, "revision candidate did not resolve");
        continue;
      }
    };

    let id = spec
      .single()
      .ok_or_else(|| FetchError::AmbiguousRevision { rev: wanted.to_string() })?;
    let read_err = |e: BoxError| FetchError::ReadTree {
      rev: wanted.to_string(),
      source: e,
    };
    return id
      .object()
      .map_err(|e| read_err(Box::new(e)))?
      .peel_to_commit()
      .map_err(|e| read_err(Box::new(e)));
  }

  Err(FetchError::RevisionNotFound { rev: wanted.to_string() })
}

/// Write the commit's tree to `dest`.
///
/// Files land in a staging directory next to `dest` that is renamed into
/// place at the end, so a partially written tree is never visible.
fn extract_tree(repo: &gix::Repository, commit: &gix::Commit<'_>, dest: &Path) -> Result<(), FetchError> {
  let rev = commit.id.to_string();
  let read_err = |e: BoxError| FetchError::ReadTree {
    rev: rev.clone(),
    source: e,
  };

  let parent = dest.parent().unwrap_or(dest);
  fs::create_dir_all(parent).map_err(extract_err(parent))?;
  let staging = tempfile::Builder::new()
    .prefix(".extract-")
    .tempdir_in(parent)
    .map_err(extract_err(parent))?;

  let entries = commit
    .tree()
    .map_err(|e| read_err(Box::new(e)))?
    .traverse()
    .breadthfirst
    .files()
    .map_err(|e| read_err(Box::new(e)))?;

  for entry in entries {
    let target = staging.path().join(gix::path::from_byte_slice(&entry.filepath));
    if entry.mode.is_tree() {
      fs::create_dir_all(&target).map_err(extract_err(&target))?;
      continue;
    }
    // Submodules are left empty.
    if entry.mode.is_commit() {
      continue;
    }

    if let Some(dir) = target.parent() {
      fs::create_dir_all(dir).map_err(extract_err(dir))?;
    }
    let object = repo.find_object(entry.oid).map_err(|e| read_err(Box::new(e)))?;
    if entry.mode.is_link() {
      write_link(&object.data, &target)?;
    } else {
      fs::write(&target, &object.data).map_err(extract_err(&target))?;
      if entry.mode.is_executable() {
        mark_executable(&target)?;
      }
    }
  }

  match fs::rename(staging.path(), dest) {
    Ok(()) => Ok(()),
    // Another process extracted the same commit first.
    Err(_) if dest.is_dir() => Ok(()),
    Err(e) => Err(FetchError::Extract {
      path: dest.to_path_buf(),
      source: e,
    }),
  }
}

#[cfg(unix)]
fn write_link(target: &[u8], path: &Path) -> Result<(), FetchError> {
  std::os::unix::fs::symlink(gix::path::from_byte_slice(target), path).map_err(extract_err(path))
}

#[cfg(not(unix))]
fn write_link(target: &[u8], path: &Path) -> Result<(), FetchError> {
  fs::write(path, target).map_err(extract_err(path))
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), FetchError> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(extract_err(path))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), FetchError> {
  Ok(())
}

fn extract_err(path: &Path) -> impl FnOnce(io::Error) -> FetchError + '_ {
  move |source| FetchError::Extract {
    path: path.to_path_buf(),
    source,
  }
}

/// Resolve a path input.
///
/// `~` expands to the home directory, relative paths resolve against
/// `config_dir`, and the result must exist.
pub fn resolve_path(path_str: &str, config_dir: &Path) -> Result<PathBuf, FetchError> {
  let expanded = match path_str.strip_prefix('~') {
    Some("") => home_dir(),
    Some(rest) if rest.starts_with('/') => home_dir().join(&rest[1..]),
    _ => config_dir.join(path_str),
  };

  match expanded.canonicalize() {
    Ok(canonical) => {
      debug!(path = %canonical.display(), "resolved path input");
      Ok(canonical)
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::PathNotFound(expanded)),
    Err(source) => Err(FetchError::CanonicalizePath { path: expanded, source }),
  }
}

/// Content address of a local tree, used as the revision of path inputs.
pub fn path_revision(path: &Path) -> Result<String, FetchError> {
  Ok(hash_directory(path, TREE_HASH_EXCLUDES)?.0)
}
