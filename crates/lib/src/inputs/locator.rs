//! Locator parsing for input sources.
//!
//! Supported forms:
//!
//! - `git:<url>` / `git:<url>#<rev>` - any git remote, optionally pinned
//! - `github:<owner>/<repo>` / `github:<owner>/<repo>/<rev>` - GitHub shorthand
//! - `path:<dir>` - a local directory (relative to the declaration, `~` expanded)

use std::path::PathBuf;

use thiserror::Error;

/// A parsed input locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
  Git { url: String, rev: Option<String> },
  Path { path: PathBuf },
}

/// Errors from parsing a locator string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("missing scheme in '{0}' (expected git:, github: or path:)")]
  MissingScheme(String),

  #[error("unknown scheme '{0}' (expected git:, github: or path:)")]
  UnknownScheme(String),

  #[error("empty {0} locator")]
  Empty(&'static str),

  #[error("empty revision after '#' in '{0}'")]
  EmptyRevision(String),

  #[error("invalid github locator '{0}' (expected owner/repo or owner/repo/rev)")]
  InvalidGithub(String),
}

impl Locator {
  /// Revision qualifier given in the locator itself, if any.
  pub fn rev(&self) -> Option<&str> {
    match self {
      Locator::Git { rev, .. } => rev.as_deref(),
      Locator::Path { .. } => None,
    }
  }
}

/// Parse a locator string.
pub fn parse(locator: &str) -> Result<Locator, ParseError> {
  let (scheme, rest) = locator
    .split_once(':')
    .ok_or_else(|| ParseError::MissingScheme(locator.to_string()))?;

  match scheme {
    "git" => parse_git(locator, rest),
    "github" => parse_github(rest),
    "path" => {
      if rest.is_empty() {
        return Err(ParseError::Empty("path"));
      }
      Ok(Locator::Path {
        path: PathBuf::from(rest),
      })
    }
    other => Err(ParseError::UnknownScheme(other.to_string())),
  }
}

fn parse_git(locator: &str, rest: &str) -> Result<Locator, ParseError> {
  let (url, rev) = match rest.split_once('#') {
    Some((_, "")) => return Err(ParseError::EmptyRevision(locator.to_string())),
    Some((url, rev)) => (url, Some(rev.to_string())),
    None => (rest, None),
  };
  if url.is_empty() {
    return Err(ParseError::Empty("git"));
  }
  Ok(Locator::Git {
    url: url.to_string(),
    rev,
  })
}

fn parse_github(rest: &str) -> Result<Locator, ParseError> {
  if rest.is_empty() {
    return Err(ParseError::Empty("github"));
  }
  let parts: Vec<&str> = rest.split('/').collect();
  let (owner, repo, rev) = match parts.as_slice() {
    [owner, repo] => (*owner, *repo, None),
    [owner, repo, rev] => (*owner, *repo, Some(rev.to_string())),
    _ => return Err(ParseError::InvalidGithub(rest.to_string())),
  };
  if owner.is_empty() || repo.is_empty() || rev.as_deref() == Some("") {
    return Err(ParseError::InvalidGithub(rest.to_string()));
  }
  Ok(Locator::Git {
    url: format!("https://github.com/{}/{}.git", owner, repo),
    rev,
  })
}
