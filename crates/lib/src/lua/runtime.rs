use std::path::Path;

use mlua::prelude::*;

use crate::lua::globals;

/// Create a new Lua runtime with the `pinfold` global registered.
pub fn create_runtime() -> LuaResult<Lua> {
  let lua = Lua::new();
  globals::register_globals(&lua)?;
  Ok(lua)
}

/// Load and execute a Lua file at the given path.
///
/// Sets `pinfold.dir` to the directory of the loaded file and lets `require`
/// find modules under `<dir>/lua/`.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let canonical_path = path
    .canonicalize()
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  let dir = canonical_path
    .parent()
    .unwrap_or(Path::new(""))
    .to_string_lossy()
    .to_string();

  let package = lua.globals().get::<LuaTable>("package")?;
  let package_path = package.get::<String>("path")?;
  package.set("path", format!("{dir}/lua/?.lua;{dir}/lua/?/init.lua;{package_path}"))?;

  lua.globals().get::<LuaTable>("pinfold")?.set("dir", dir)?;

  lua
    .load(&content)
    .set_name(format!("@{}", canonical_path.display()))
    .eval::<LuaValue>()
}
