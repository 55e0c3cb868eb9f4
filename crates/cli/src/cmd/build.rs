use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::output::{format_duration, print_artifact, print_json, print_success};

use super::{checker, load, target};

/// Build the declared package for one target.
pub fn cmd_build(file: &Path, system: Option<&str>, runtime: Option<&str>, run_checks: bool, json: bool) -> Result<()> {
  let start = Instant::now();
  let evaluation = load(file)?;
  let target = target(system)?;
  let checker = checker(run_checks);

  let artifact = match runtime {
    Some(id) => evaluation.package_with_runtime(&target, id, checker.as_ref()),
    None => evaluation.package(&target, checker.as_ref()),
  }
  .with_context(|| format!("Failed to build for {target}"))?;

  if json {
    print_json(&artifact)?;
    return Ok(());
  }

  print_success(&format!(
    "Built {} {} for {} ({})",
    artifact.name,
    artifact.version,
    target,
    format_duration(start.elapsed())
  ));
  print_artifact(&artifact);
  Ok(())
}
