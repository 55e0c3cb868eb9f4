//! Input types for declaration and resolution.
//!
//! - [`InputDecl`] - Parsed input declaration (before resolution)
//! - [`ResolvedInput`] - A pinned input with local path and exact revision

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::consts::DECL_FILENAME;

/// A parsed input declaration (before resolution).
///
/// Inputs can be declared in two forms:
///
/// ```lua
/// inputs = {
///   -- evaluable: the tree carries its own pinfold.lua
///   pkgs = "git:https://github.com/org/pkg-index.git",
///   -- raw file tree only
///   systems = { url = "github:org/systems", evaluable = false },
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDecl {
  /// The locator string, e.g. `git:https://...#v1.0.0` or `path:./vendor`.
  pub url: String,
  /// Whether the input may be dereferenced as a nested declaration.
  pub evaluable: bool,
}

impl InputDecl {
  /// An evaluable input (the default for the plain string form).
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      evaluable: true,
    }
  }

  /// A raw file tree that must never be evaluated.
  pub fn raw(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      evaluable: false,
    }
  }
}

/// Map of input names to their declarations.
pub type InputDecls = BTreeMap<String, InputDecl>;

/// Errors raised when a resolved input is used in a way its declaration forbids.
#[derive(Debug, Error)]
pub enum InputError {
  /// The input was declared `evaluable = false` but dereferenced as a declaration.
  #[error("input '{name}' is declared non-evaluable and cannot be read as a declaration")]
  NotEvaluable { name: String },

  /// The input is evaluable but carries no declaration file.
  #[error("input '{name}' has no {DECL_FILENAME} at '{}'", path.display())]
  MissingDeclaration { name: String, path: PathBuf },

  /// A raw file path pointed outside the input tree.
  #[error("path '{path}' escapes input '{name}'")]
  PathEscapes { name: String, path: String },
}

/// A resolved input ready for use.
///
/// Once produced by the registry it is never modified for the rest of the
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
  /// Symbolic name from the declaration.
  pub name: String,
  /// Locator string as declared.
  pub url: String,
  /// Absolute path to the input's root directory.
  pub path: PathBuf,
  /// The pinned revision (git commit id, or content hash for path inputs).
  pub rev: String,
  /// Whether the tree may be evaluated as a nested declaration.
  pub evaluable: bool,
}

impl ResolvedInput {
  /// Path of a raw file inside the input tree.
  ///
  /// Raw access is allowed for every input, evaluable or not.
  pub fn file(&self, relative: &str) -> Result<PathBuf, InputError> {
    let rel = Path::new(relative);
    let escapes = rel
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
      return Err(InputError::PathEscapes {
        name: self.name.clone(),
        path: relative.to_string(),
      });
    }
    Ok(self.path.join(rel))
  }

  /// Path of the input's own declaration file.
  ///
  /// Fails with [`InputError::NotEvaluable`] for raw inputs instead of falling
  /// back to a raw-file reading.
  pub fn declaration_path(&self) -> Result<PathBuf, InputError> {
    if !self.evaluable {
      return Err(InputError::NotEvaluable { name: self.name.clone() });
    }
    let path = self.path.join(DECL_FILENAME);
    if !path.is_file() {
      return Err(InputError::MissingDeclaration {
        name: self.name.clone(),
        path,
      });
    }
    Ok(path)
  }
}

/// Map of input names to their resolved state.
pub type ResolvedInputs = BTreeMap<String, ResolvedInput>;
