//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Package index shared by the project fixtures.
pub const INDEX_JSON: &str = r#"{
  "runtimes": {
    "python39": {
      "version": "3.9.18",
      "packages": {
        "setuptools": { "version": "68.0.0" },
        "wheel": { "version": "0.41.2" },
        "pytest": { "version": "7.4.0", "propagated": ["pluggy"] },
        "pluggy": { "version": "1.3.0" },
        "ipython": { "version": "8.12.0" }
      }
    },
    "python310": {
      "version": "3.10.12",
      "packages": {
        "setuptools": { "version": "68.2.0" },
        "wheel": { "version": "0.41.2" },
        "pytest": { "version": "7.4.3", "propagated": ["pluggy"] },
        "pluggy": { "version": "1.3.0" },
        "ipython": { "version": "8.18.1" },
        "numpy": { "version": "1.26.4", "platforms": ["x86_64-linux"] }
      }
    }
  },
  "tools": {
    "pyright": { "version": "1.1.350" }
  }
}"#;

/// Project metadata matching the `berpf` declaration.
pub const PYPROJECT: &str = r#"
[build-system]
requires = ["setuptools>=61", "wheel"]
build-backend = "setuptools.build_meta"

[project]
name = "berpf"
version = "0.0.1"
dependencies = []
"#;

/// Declaration building `berpf` and a shell on two targets.
pub const BERPF_DECL: &str = r#"
return {
  inputs = {
    pkgs = { url = "path:./pkgs", evaluable = false },
  },
  systems = { "x86_64-linux", "aarch64-darwin" },
  package = {
    name = "berpf",
    version = "0.0.1",
    min_runtime = "3.9",
    source = "src",
    build_deps = { "setuptools", "wheel" },
    check_deps = { "pytest" },
    check = "true",
  },
  shell = {
    runtime = "3.10",
    extensions = { "ipython" },
    tools = { "pyright" },
  },
}
"#;

/// Isolated test environment.
///
/// Each test gets its own project directory and its own input cache.
pub struct TestEnv {
  pub temp: TempDir,
  pub decl_path: PathBuf,
}

impl TestEnv {
  /// Create an empty test environment.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let decl_path = temp.path().join("pinfold.lua");
    Self { temp, decl_path }
  }

  /// A project with the shared index, `src/pyproject.toml`, and `decl` as its
  /// declaration.
  pub fn project(decl: &str) -> Self {
    let env = Self::empty();
    env.write_file("pkgs/index.json", INDEX_JSON);
    env.write_file("src/pyproject.toml", PYPROJECT);
    env.write_file("pinfold.lua", decl);
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn lock_path(&self) -> PathBuf {
    self.temp.path().join("pinfold.lock")
  }

  /// Cache path for fetched inputs and type definitions.
  pub fn cache_path(&self) -> PathBuf {
    let p = self.temp.path().join("cache");
    std::fs::create_dir_all(&p).unwrap();
    p
  }

  /// Get a pre-configured Command for the pinfold binary, pointed at this
  /// environment's declaration.
  pub fn pinfold_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("pinfold");
    cmd.env("PINFOLD_CACHE", self.cache_path());
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(self.temp.path());
    cmd.arg("--file").arg(&self.decl_path);
    cmd
  }
}
