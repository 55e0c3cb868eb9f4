//! Declaration loading.
//!
//! ```lua
//! return {
//!   inputs = {
//!     pkgs = "git:https://github.com/acme/pkg-index.git#main",
//!     systems = { url = "github:acme/systems", evaluable = false },
//!   },
//!   systems = { input = "systems", file = "systems.json" },
//!   index = { input = "pkgs", file = "index.json" },
//!   package = {
//!     name = "berpf", version = "0.0.1", min_runtime = "3.10",
//!     source = ".", format = "pyproject",
//!     build_deps = { "setuptools", "wheel" },
//!     check_deps = { "pytest" },
//!     runtime_deps = { "numpy" },
//!     build = "python -m pip wheel --no-deps -w dist .",
//!     check = "pytest",
//!   },
//!   shell = { runtime = "3.10", extensions = { "ipython" }, tools = { "pyright" } },
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use tracing::debug;

use super::runtime;
use super::types::{Declaration, FileRef, SystemsDecl};
use crate::inputs::{InputDecl, InputDecls};
use crate::package::{BuildFormat, PackageSpec};
use crate::runtime::RuntimeVersion;
use crate::shell::EnvironmentSpec;

/// Input and file the package index is read from when `index` is omitted.
pub const DEFAULT_INDEX_INPUT: &str = "pkgs";
pub const DEFAULT_INDEX_FILE: &str = "index.json";

/// Evaluate a declaration file and convert it to a [`Declaration`].
pub fn load_declaration(path: &Path) -> LuaResult<Declaration> {
  let lua = runtime::create_runtime()?;
  let result = runtime::load_file(&lua, path)?;

  let table = result
    .as_table()
    .ok_or_else(|| LuaError::external("declaration must return a table"))?;

  let path = path
    .canonicalize()
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

  let inputs = match table.get::<LuaValue>("inputs")? {
    LuaValue::Nil => BTreeMap::new(),
    LuaValue::Table(inputs) => parse_input_decls(&inputs)?,
    _ => return Err(LuaError::external("inputs must be a table")),
  };

  let systems = parse_systems(table.get("systems")?)?;

  let index = match table.get::<LuaValue>("index")? {
    LuaValue::Nil => FileRef {
      input: DEFAULT_INDEX_INPUT.to_string(),
      file: DEFAULT_INDEX_FILE.to_string(),
    },
    LuaValue::Table(t) => FileRef {
      input: required_string(&t, "input", "index")?,
      file: optional_string(&t, "file", "index")?.unwrap_or_else(|| DEFAULT_INDEX_FILE.to_string()),
    },
    _ => return Err(LuaError::external("index must be a table { input = ..., file = ... }")),
  };

  let package = match table.get::<LuaValue>("package")? {
    LuaValue::Nil => None,
    LuaValue::Table(t) => Some(parse_package(&t, &dir)?),
    _ => return Err(LuaError::external("package must be a table")),
  };

  let shell = match table.get::<LuaValue>("shell")? {
    LuaValue::Nil => None,
    LuaValue::Table(t) => Some(t),
    _ => return Err(LuaError::external("shell must be a table")),
  };
  let shell = parse_shell(shell.as_ref(), package.as_ref())?;

  debug!(
    path = %path.display(),
    inputs = inputs.len(),
    package = ?package.as_ref().map(|p| p.name.as_str()),
    "loaded declaration"
  );

  Ok(Declaration {
    path,
    dir,
    inputs,
    systems,
    index,
    package,
    shell,
  })
}

/// Read only the inputs of a declaration.
pub fn extract_input_decls(path: &Path) -> LuaResult<InputDecls> {
  Ok(load_declaration(path)?.inputs)
}

fn parse_input_decls(inputs_table: &LuaTable) -> LuaResult<InputDecls> {
  let mut decls = BTreeMap::new();
  for pair in inputs_table.pairs::<String, LuaValue>() {
    let (name, value) = pair?;
    let decl = parse_input_decl(&name, value)?;
    decls.insert(name, decl);
  }
  Ok(decls)
}

fn parse_input_decl(name: &str, value: LuaValue) -> LuaResult<InputDecl> {
  match value {
    LuaValue::String(url) => Ok(InputDecl::new(url.to_str()?.to_string())),
    LuaValue::Table(table) => {
      let ctx = format!("input '{name}'");
      let url = required_string(&table, "url", &ctx)?;
      let evaluable: Option<bool> = table.get("evaluable")?;
      Ok(InputDecl {
        url,
        evaluable: evaluable.unwrap_or(true),
      })
    }
    _ => Err(LuaError::external(format!(
      "input '{name}' must be a string URL or a table with 'url'"
    ))),
  }
}

fn parse_systems(value: LuaValue) -> LuaResult<SystemsDecl> {
  match value {
    LuaValue::Nil => Ok(SystemsDecl::Default),
    LuaValue::Table(t) => {
      let input = optional_string(&t, "input", "systems")?;
      match input {
        Some(input) => match optional_string(&t, "file", "systems")? {
          Some(file) => Ok(SystemsDecl::File(FileRef { input, file })),
          None => Ok(SystemsDecl::Input(input)),
        },
        None => Ok(SystemsDecl::List(string_list(&t, "systems")?)),
      }
    }
    _ => Err(LuaError::external(
      "systems must be a list of targets or a table { input = ..., file = ... }",
    )),
  }
}

fn parse_package(t: &LuaTable, dir: &Path) -> LuaResult<PackageSpec> {
  let ctx = "package";
  let source = optional_string(t, "source", ctx)?.unwrap_or_else(|| ".".to_string());
  let source_root = if Path::new(&source).is_absolute() {
    PathBuf::from(&source)
  } else {
    dir.join(&source)
  };
  let build_format = match optional_string(t, "format", ctx)? {
    Some(format) => format.parse::<BuildFormat>().map_err(LuaError::external)?,
    None => BuildFormat::Pyproject,
  };

  Ok(PackageSpec {
    name: required_string(t, "name", ctx)?,
    version: required_string(t, "version", ctx)?,
    min_runtime_version: parse_version(&required_string(t, "min_runtime", ctx)?)?,
    source_root,
    build_format,
    build_deps: optional_list(t, "build_deps")?.into_iter().collect(),
    check_deps: optional_list(t, "check_deps")?.into_iter().collect(),
    runtime_deps: optional_list(t, "runtime_deps")?.into_iter().collect(),
    build: optional_string(t, "build", ctx)?,
    check: optional_string(t, "check", ctx)?,
  })
}

/// The shell's runtime defaults to the package's minimum runtime.
fn parse_shell(t: Option<&LuaTable>, package: Option<&PackageSpec>) -> LuaResult<Option<EnvironmentSpec>> {
  let runtime = match t {
    Some(t) => optional_string(t, "runtime", "shell")?,
    None => None,
  };
  let runtime_version = match (runtime, package) {
    (Some(runtime), _) => parse_version(&runtime)?,
    (None, Some(pkg)) => pkg.min_runtime_version.clone(),
    (None, None) if t.is_some() => return Err(LuaError::external("shell: missing 'runtime'")),
    (None, None) => return Ok(None),
  };
  let (extensions, tools) = match t {
    Some(t) => (optional_list(t, "extensions")?, optional_list(t, "tools")?),
    None => (Vec::new(), Vec::new()),
  };
  Ok(Some(EnvironmentSpec::new(runtime_version, extensions, tools)))
}

fn parse_version(s: &str) -> LuaResult<RuntimeVersion> {
  RuntimeVersion::parse(s).map_err(LuaError::external)
}

fn required_string(t: &LuaTable, field: &str, ctx: &str) -> LuaResult<String> {
  optional_string(t, field, ctx)?.ok_or_else(|| LuaError::external(format!("{ctx}: missing '{field}'")))
}

fn optional_string(t: &LuaTable, field: &str, ctx: &str) -> LuaResult<Option<String>> {
  match t.get::<LuaValue>(field)? {
    LuaValue::Nil => Ok(None),
    LuaValue::String(s) => Ok(Some(s.to_str()?.to_string())),
    _ => Err(LuaError::external(format!("{ctx}: '{field}' must be a string"))),
  }
}

fn optional_list(t: &LuaTable, field: &str) -> LuaResult<Vec<String>> {
  match t.get::<LuaValue>(field)? {
    LuaValue::Nil => Ok(Vec::new()),
    LuaValue::Table(list) => string_list(&list, field),
    _ => Err(LuaError::external(format!("'{field}' must be a list of strings"))),
  }
}

fn string_list(list: &LuaTable, ctx: &str) -> LuaResult<Vec<String>> {
  list
    .sequence_values::<LuaValue>()
    .map(|value| match value? {
      LuaValue::String(s) => Ok(s.to_str()?.to_string()),
      _ => Err(LuaError::external(format!("'{ctx}' must contain only strings"))),
    })
    .collect()
}
