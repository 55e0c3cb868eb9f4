//! The check phase.
//!
//! After construction, the package's own test suite runs against the fresh
//! artifact. Only the check tier and the runtime closure are visible to it;
//! build dependencies are not.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use super::sandbox::{self, Sandbox};

#[derive(Debug, Error)]
pub enum CheckError {
  #[error("failed to start check command '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  #[error("check command '{cmd}' failed with exit code {code:?}: {stderr}")]
  Failed {
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("failed to prepare check environment: {0}")]
  Setup(#[source] std::io::Error),
}

/// What the check phase can see.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
  pub package: &'a str,
  pub version: &'a str,
  pub runtime: &'a str,
  /// The constructed artifact the test suite runs against.
  pub artifact_dir: &'a Path,
  /// Scratch output directory for the check run.
  pub out_dir: &'a Path,
  pub check_deps: &'a BTreeMap<String, String>,
  pub runtime_closure: &'a BTreeMap<String, String>,
}

/// Runs a package's check command.
pub trait CheckRunner: Send + Sync {
  fn run(&self, command: &str, ctx: &CheckContext<'_>) -> Result<(), CheckError>;
}

/// Skips the check phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheck;

impl CheckRunner for NoCheck {
  fn run(&self, command: &str, ctx: &CheckContext<'_>) -> Result<(), CheckError> {
    debug!(package = ctx.package, cmd = command, "check phase skipped");
    Ok(())
  }
}

/// Runs the check command in a shell with a scrubbed environment.
#[derive(Debug, Clone, Default)]
pub struct CommandCheck {
  shell: Option<String>,
}

impl CommandCheck {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_shell(shell: impl Into<String>) -> Self {
    Self {
      shell: Some(shell.into()),
    }
  }
}

impl CheckRunner for CommandCheck {
  fn run(&self, command: &str, ctx: &CheckContext<'_>) -> Result<(), CheckError> {
    let rt = sandbox::current_thread().map_err(CheckError::Setup)?;
    rt.block_on(execute_check(command, ctx, self.shell.as_deref()))
  }
}

/// Run `cmd` in `ctx.artifact_dir` inside the build sandbox, with `out` at
/// `ctx.out_dir`. `PINFOLD_CHECK_DEPS` and `PINFOLD_RUNTIME_CLOSURE` list the
/// visible packages as `name=version`.
pub async fn execute_check(cmd: &str, ctx: &CheckContext<'_>, shell: Option<&str>) -> Result<(), CheckError> {
  info!(package = ctx.package, runtime = ctx.runtime, cmd = %cmd, "running check");

  let tmp_dir = ctx.out_dir.join("tmp");
  tokio::fs::create_dir_all(&tmp_dir).await.map_err(CheckError::Setup)?;

  let mut command = sandbox::command(
    cmd,
    shell,
    &Sandbox {
      cwd: ctx.artifact_dir,
      out_dir: ctx.out_dir,
      tmp_dir: &tmp_dir,
    },
  );
  command
    .env("PINFOLD_PACKAGE", ctx.package)
    .env("PINFOLD_VERSION", ctx.version)
    .env("PINFOLD_RUNTIME", ctx.runtime)
    .env("PINFOLD_CHECK_DEPS", sandbox::format_set(ctx.check_deps))
    .env("PINFOLD_RUNTIME_CLOSURE", sandbox::format_set(ctx.runtime_closure));

  debug!(cwd = %ctx.artifact_dir.display(), "spawning check");

  let output = command.output().await.map_err(|source| CheckError::Spawn {
    cmd: cmd.to_string(),
    source,
  })?;

  if !output.status.success() {
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "check stdout");
    }
    return Err(CheckError::Failed {
      cmd: cmd.to_string(),
      code: output.status.code(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }

  debug!(package = ctx.package, "check passed");
  Ok(())
}
