use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::output::{format_duration, print_artifact, print_json, print_success};

use super::{checker, load, target};

/// Evaluate the development shell for one target.
pub fn cmd_develop(file: &Path, system: Option<&str>, run_checks: bool, json: bool) -> Result<()> {
  let start = Instant::now();
  let evaluation = load(file)?;
  let target = target(system)?;
  let checker = checker(run_checks);

  let shell = evaluation
    .shell(&target, checker.as_ref())
    .with_context(|| format!("Failed to assemble the shell for {target}"))?;

  if json {
    print_json(&shell)?;
    return Ok(());
  }

  print_success(&format!(
    "Shell {} for {} ({})",
    shell.name,
    target,
    format_duration(start.elapsed())
  ));
  print_artifact(&shell);
  Ok(())
}
