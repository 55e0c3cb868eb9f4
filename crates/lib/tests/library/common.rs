//! Shared fixtures for library integration tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pinfold_lib::eval::{EvalError, EvalOptions, Evaluation, evaluate_with};
use pinfold_lib::inputs::fetch::{FetchError, Fetcher};
use pinfold_lib::package::{CheckContext, CheckError, CheckRunner};
use pinfold_lib::platform::Target;
use tempfile::TempDir;

pub const INDEX_JSON: &str = r#"{
  "runtimes": {
    "python39": {
      "version": "3.9.18",
      "packages": {
        "setuptools": { "version": "68.0.0" },
        "wheel": { "version": "0.41.2" },
        "pytest": { "version": "7.4.0", "propagated": ["pluggy", "iniconfig"] },
        "pluggy": { "version": "1.3.0" },
        "iniconfig": { "version": "2.0.0" },
        "numpy": { "version": "1.24.4" },
        "ipython": { "version": "8.12.0" }
      }
    },
    "python310": {
      "version": "3.10.12",
      "packages": {
        "setuptools": { "version": "68.2.0" },
        "wheel": { "version": "0.41.2" },
        "pytest": { "version": "7.4.3", "propagated": ["pluggy", "iniconfig"] },
        "pluggy": { "version": "1.3.0" },
        "iniconfig": { "version": "2.0.0" },
        "numpy": { "version": "1.26.4" },
        "ipython": { "version": "8.18.1" },
        "pillow": { "version": "10.1.0", "conflicts": ["pil"] },
        "pil": { "version": "1.1.7" },
        "tensorflow": { "version": "2.15.0", "platforms": ["x86_64-linux"] }
      }
    }
  },
  "tools": {
    "pyright": { "version": "1.1.350" },
    "valgrind": { "version": "3.22.0", "platforms": ["x86_64-linux"] }
  }
}"#;

pub const PYPROJECT: &str = r#"
[build-system]
requires = ["setuptools>=61", "wheel"]
build-backend = "setuptools.build_meta"

[project]
name = "berpf"
version = "0.0.1"
dependencies = ["numpy>=1.20"]
"#;

/// The reference declaration: package `berpf` with a 3.9 floor, developed on
/// 3.10 across four targets.
pub const BERPF_DECL: &str = r#"
return {
  inputs = {
    pkgs = { url = "path:./pkgs", evaluable = false },
  },
  systems = { "x86_64-linux", "aarch64-linux", "x86_64-darwin", "aarch64-darwin" },
  package = {
    name = "berpf",
    version = "0.0.1",
    min_runtime = "3.9",
    source = "src",
    build_deps = { "setuptools", "wheel" },
    check_deps = { "pytest" },
    runtime_deps = { "numpy" },
    check = "pytest",
  },
  shell = {
    runtime = "3.10",
    extensions = { "ipython" },
    tools = { "pyright" },
  },
}
"#;

pub fn t(id: &str) -> Target {
  Target::new(id).unwrap()
}

/// A project directory holding a declaration, the index input, and sources.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new(decl: &str) -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.write("pinfold.lua", decl);
    project.write("pkgs/index.json", INDEX_JSON);
    project.write("src/pyproject.toml", PYPROJECT);
    project
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn decl_path(&self) -> PathBuf {
    self.root().join("pinfold.lua")
  }

  pub fn write(&self, relative: &str, content: &str) {
    let path = self.root().join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }

  pub fn evaluate(&self, fetcher: &dyn Fetcher) -> Result<Evaluation, EvalError> {
    evaluate_with(&self.decl_path(), fetcher, &EvalOptions::default())
  }
}

/// Fetcher that serves git inputs from local directories.
///
/// Each url maps to a tree and the commit its remote HEAD points at. Requests
/// for an explicit revision succeed as long as that revision was ever served.
#[derive(Default)]
pub struct FakeRemote {
  pub heads: RefCell<BTreeMap<String, (PathBuf, String)>>,
  pub requests: RefCell<Vec<(String, Option<String>)>>,
}

impl FakeRemote {
  pub fn serve(&self, url: &str, tree: &Path, head: &str) {
    self
      .heads
      .borrow_mut()
      .insert(url.to_string(), (tree.to_path_buf(), head.to_string()));
  }
}

impl Fetcher for FakeRemote {
  fn fetch_git(&self, _name: &str, url: &str, rev: Option<&str>) -> Result<(PathBuf, String), FetchError> {
    self.requests.borrow_mut().push((url.to_string(), rev.map(str::to_string)));
    let heads = self.heads.borrow();
    let (tree, head) = heads.get(url).ok_or_else(|| FetchError::Connect {
      url: url.to_string(),
      source: "no such remote".into(),
    })?;
    Ok((tree.clone(), rev.unwrap_or(head).to_string()))
  }
}

/// Check runner that always passes without spawning anything.
pub struct PassCheck;

impl CheckRunner for PassCheck {
  fn run(&self, _command: &str, _ctx: &CheckContext<'_>) -> Result<(), CheckError> {
    Ok(())
  }
}
