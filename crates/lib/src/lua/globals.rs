//! The `pinfold` global table.
//!
//! - `pinfold.version` - version of the evaluating tool
//! - `pinfold.dir` - directory of the declaration being loaded (set per file)
//! - `pinfold.path` - path helpers
//!
//! Host platform facts are deliberately absent: a declaration evaluates the
//! same way on every machine, and per-target differences come only from the
//! matrix.

use mlua::prelude::*;

use super::helpers;

pub fn register_globals(lua: &Lua) -> LuaResult<()> {
  let pinfold = lua.create_table()?;
  pinfold.set("version", env!("CARGO_PKG_VERSION"))?;
  pinfold.set("path", helpers::path::create_path_helpers(lua)?)?;
  lua.globals().set("pinfold", pinfold)?;
  Ok(())
}
