//! The construction phase.
//!
//! The builder stages the source tree into a fresh artifact directory and
//! hands it to a [`Constructor`], which runs the package's build command in
//! place. Only the build tier is visible here.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use super::sandbox::{self, Sandbox};

#[derive(Debug, Error)]
pub enum ConstructError {
  #[error("failed to start build command '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  #[error("build command '{cmd}' failed with exit code {code:?}: {stderr}")]
  Failed {
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("failed to prepare build environment: {0}")]
  Setup(#[source] std::io::Error),
}

/// What the construction phase can see.
#[derive(Debug, Clone, Copy)]
pub struct ConstructContext<'a> {
  pub package: &'a str,
  pub version: &'a str,
  pub runtime: &'a str,
  /// Build backend named by the project metadata.
  pub build_backend: Option<&'a str>,
  /// Staged copy of the source tree; becomes the artifact.
  pub artifact_dir: &'a Path,
  pub scratch_dir: &'a Path,
  /// Closure of the build tier, name to version.
  pub build_deps: &'a BTreeMap<String, String>,
}

/// Turns a staged source tree into the package artifact.
pub trait Constructor: Send + Sync {
  fn construct(&self, command: &str, ctx: &ConstructContext<'_>) -> Result<(), ConstructError>;
}

/// Leaves the staged source as the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstruct;

impl Constructor for NoConstruct {
  fn construct(&self, command: &str, ctx: &ConstructContext<'_>) -> Result<(), ConstructError> {
    debug!(package = ctx.package, cmd = command, "construction skipped");
    Ok(())
  }
}

/// Runs the build command in a shell with a scrubbed environment.
#[derive(Debug, Clone, Default)]
pub struct CommandConstruct {
  shell: Option<String>,
}

impl CommandConstruct {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_shell(shell: impl Into<String>) -> Self {
    Self {
      shell: Some(shell.into()),
    }
  }
}

impl Constructor for CommandConstruct {
  fn construct(&self, command: &str, ctx: &ConstructContext<'_>) -> Result<(), ConstructError> {
    let rt = sandbox::current_thread().map_err(ConstructError::Setup)?;
    rt.block_on(execute_construct(command, ctx, self.shell.as_deref()))
  }
}

/// Run `cmd` in `ctx.artifact_dir`, which is also `out`.
///
/// `PINFOLD_BUILD_DEPS` lists the build tier as `name=version` and
/// `PINFOLD_BUILD_BACKEND` names the metadata's backend when there is one.
pub async fn execute_construct(
  cmd: &str,
  ctx: &ConstructContext<'_>,
  shell: Option<&str>,
) -> Result<(), ConstructError> {
  info!(package = ctx.package, runtime = ctx.runtime, cmd = %cmd, "constructing artifact");

  let tmp_dir = ctx.scratch_dir.join("tmp");
  tokio::fs::create_dir_all(&tmp_dir).await.map_err(ConstructError::Setup)?;

  let mut command = sandbox::command(
    cmd,
    shell,
    &Sandbox {
      cwd: ctx.artifact_dir,
      out_dir: ctx.artifact_dir,
      tmp_dir: &tmp_dir,
    },
  );
  command
    .env("PINFOLD_PACKAGE", ctx.package)
    .env("PINFOLD_VERSION", ctx.version)
    .env("PINFOLD_RUNTIME", ctx.runtime)
    .env("PINFOLD_BUILD_DEPS", sandbox::format_set(ctx.build_deps));
  if let Some(backend) = ctx.build_backend {
    command.env("PINFOLD_BUILD_BACKEND", backend);
  }

  let output = command.output().await.map_err(|source| ConstructError::Spawn {
    cmd: cmd.to_string(),
    source,
  })?;

  if !output.status.success() {
    return Err(ConstructError::Failed {
      cmd: cmd.to_string(),
      code: output.status.code(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }

  debug!(package = ctx.package, "artifact constructed");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  struct Fixture {
    temp: TempDir,
    build_deps: BTreeMap<String, String>,
  }

  impl Fixture {
    fn new() -> Self {
      let temp = TempDir::new().unwrap();
      std::fs::create_dir_all(temp.path().join("artifact")).unwrap();
      Self {
        temp,
        build_deps: BTreeMap::from([
          ("setuptools".to_string(), "69.0.3".to_string()),
          ("wheel".to_string(), "0.42.0".to_string()),
        ]),
      }
    }

    fn artifact(&self) -> std::path::PathBuf {
      self.temp.path().join("artifact")
    }

    fn ctx<'a>(&'a self, artifact: &'a Path) -> ConstructContext<'a> {
      ConstructContext {
        package: "berpf",
        version: "0.0.1",
        runtime: "python310",
        build_backend: Some("setuptools.build_meta"),
        artifact_dir: artifact,
        scratch_dir: self.temp.path(),
        build_deps: &self.build_deps,
      }
    }
  }

  #[test]
  fn no_construct_leaves_the_tree_alone() {
    let fx = Fixture::new();
    let artifact = fx.artifact();
    NoConstruct.construct("touch built", &fx.ctx(&artifact)).unwrap();
    assert!(!artifact.join("built").exists());
  }

  #[cfg(unix)]
  mod unix {
    use super::*;

    #[test]
    fn command_builds_in_the_artifact_dir() {
      let fx = Fixture::new();
      let artifact = fx.artifact();
      CommandConstruct::new()
        .construct("echo wheel > \"$out/built\"", &fx.ctx(&artifact))
        .unwrap();
      assert_eq!(std::fs::read_to_string(artifact.join("built")).unwrap(), "wheel\n");
    }

    #[tokio::test]
    async fn sees_build_tier_and_backend() {
      let fx = Fixture::new();
      let artifact = fx.artifact();
      let script = r#"test "$PINFOLD_BUILD_DEPS" = "setuptools=69.0.3 wheel=0.42.0" \
        && test "$PINFOLD_BUILD_BACKEND" = setuptools.build_meta \
        && test -z "$PINFOLD_CHECK_DEPS" \
        && test "$HOME" = /homeless-shelter"#;
      execute_construct(script, &fx.ctx(&artifact), None).await.unwrap();
    }

    #[test]
    fn failing_command_reports_exit_code() {
      let fx = Fixture::new();
      let artifact = fx.artifact();
      let err = CommandConstruct::new()
        .construct("echo 'no backend' >&2; exit 2", &fx.ctx(&artifact))
        .unwrap_err();
      match err {
        ConstructError::Failed { code, stderr, .. } => {
          assert_eq!(code, Some(2));
          assert_eq!(stderr, "no backend");
        }
        other => panic!("unexpected error: {other}"),
      }
    }
  }
}
