//! Scaffold a new project declaration.
//!
//! `pinfold init` writes:
//! - `pinfold.lua` with a commented starting point
//! - `.luarc.json` for LuaLS IDE integration
//! - `globals.d.lua` type definitions into the shared types directory

mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::DECL_FILENAME;
use crate::platform::paths::types_dir;

pub use templates::{DECL_LUA_TEMPLATE, GLOBALS_D_LUA, LUARC_JSON_TEMPLATE};

#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

#[derive(Debug)]
pub struct InitResult {
  /// The project directory (canonicalized)
  pub project_dir: PathBuf,
  pub declaration: PathBuf,
  pub luarc_json: PathBuf,
  pub types_dir: PathBuf,
}

fn write_file(path: &Path, content: &str) -> Result<(), InitError> {
  fs::write(path, content).map_err(|source| InitError::WriteFile {
    path: path.to_path_buf(),
    source,
  })
}

/// Initialize `dir` with a template declaration.
///
/// Refuses to overwrite an existing `pinfold.lua` or `.luarc.json`.
pub fn init(dir: &Path) -> Result<InitResult, InitError> {
  fs::create_dir_all(dir).map_err(|source| InitError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;
  let project_dir = dir.canonicalize().map_err(|source| InitError::Canonicalize {
    path: dir.to_path_buf(),
    source,
  })?;

  let declaration = project_dir.join(DECL_FILENAME);
  let luarc_json = project_dir.join(".luarc.json");
  for existing in [&declaration, &luarc_json] {
    if existing.exists() {
      return Err(InitError::PathExists { path: existing.clone() });
    }
  }

  let types_dir = types_dir();
  fs::create_dir_all(&types_dir).map_err(|source| InitError::CreateDir {
    path: types_dir.clone(),
    source,
  })?;

  write_file(&declaration, DECL_LUA_TEMPLATE)?;
  write_file(
    &luarc_json,
    &LUARC_JSON_TEMPLATE.replace("{types_path}", &types_dir.to_string_lossy()),
  )?;
  write_file(&types_dir.join("globals.d.lua"), GLOBALS_D_LUA)?;

  info!(dir = %project_dir.display(), "initialized project");
  Ok(InitResult {
    project_dir,
    declaration,
    luarc_json,
    types_dir,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  fn with_cache<F: FnOnce()>(temp: &TempDir, f: F) {
    let cache = temp.path().join("cache");
    temp_env::with_vars([("PINFOLD_CACHE", Some(cache.to_str().unwrap()))], f);
  }

  #[test]
  #[serial]
  fn init_creates_all_files() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    with_cache(&temp, || {
      let result = init(&project).unwrap();
      assert!(result.declaration.exists());
      assert!(result.luarc_json.exists());
      assert!(result.types_dir.join("globals.d.lua").exists());

      let luarc = fs::read_to_string(&result.luarc_json).unwrap();
      assert!(luarc.contains(&*result.types_dir.to_string_lossy()));
    });
  }

  #[test]
  #[serial]
  fn template_is_a_valid_declaration() {
    let temp = TempDir::new().unwrap();
    with_cache(&temp, || {
      let result = init(temp.path()).unwrap();
      let decl = crate::lua::load_declaration(&result.declaration).unwrap();
      assert!(decl.package.is_some());
      assert!(decl.inputs.contains_key("pkgs"));
    });
  }

  #[test]
  #[serial]
  fn refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(DECL_FILENAME), "return {}").unwrap();
    with_cache(&temp, || {
      assert!(matches!(init(temp.path()), Err(InitError::PathExists { .. })));
    });
  }
}
