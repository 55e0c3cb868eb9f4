use std::path::{Component, Path, PathBuf};

use mlua::prelude::*;

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::ParentDir => {
        normalized.pop();
      }
      Component::CurDir => {}
      _ => normalized.push(component),
    }
  }
  normalized
}

/// Create the `pinfold.path` table.
pub fn create_path_helpers(lua: &Lua) -> LuaResult<LuaTable> {
  let path = lua.create_table()?;

  // pinfold.path.join(...)
  path.set(
    "join",
    lua.create_function(|_, segments: LuaMultiValue| {
      let mut result = PathBuf::new();
      for segment in segments {
        if let LuaValue::String(s) = segment {
          result.push(s.to_str()?.as_ref());
        }
      }
      Ok(result.to_string_lossy().into_owned())
    })?,
  )?;

  // pinfold.path.normalize(path)
  path.set(
    "normalize",
    lua.create_function(|_, path: String| Ok(normalize(Path::new(&path)).to_string_lossy().into_owned()))?,
  )?;

  // pinfold.path.basename(path)
  path.set(
    "basename",
    lua.create_function(|_, path: String| {
      Ok(
        Path::new(&path)
          .file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_default(),
      )
    })?,
  )?;

  Ok(path)
}
