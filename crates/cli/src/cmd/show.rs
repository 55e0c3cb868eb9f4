use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde_json::{Value, json};

use pinfold_lib::artifact::BuildArtifact;
use pinfold_lib::eval::TargetError;

use crate::output::{print_info, print_json, print_stat, symbols, truncate_hash};

use super::{checker, load};

/// Evaluate every supported target and report each slot.
///
/// A failing target never hides the others; the command fails only after
/// every slot has been reported.
pub fn cmd_show(file: &Path, parallel: bool, run_checks: bool, json: bool) -> Result<()> {
  let evaluation = load(file)?;
  let checker = checker(run_checks);

  let matrix = if parallel {
    evaluation.expand_parallel(checker.as_ref())
  } else {
    evaluation.expand(checker.as_ref())
  };

  let has_package = evaluation.declaration.package.is_some();
  let has_shell = evaluation.declaration.shell.is_some();
  let mut failed = 0usize;

  if json {
    let mut targets = BTreeMap::new();
    for (target, outputs) in matrix.iter() {
      let mut slot = serde_json::Map::new();
      if has_package {
        failed += usize::from(outputs.package.is_err());
        slot.insert("package".into(), slot_json(&outputs.package));
      }
      if has_shell {
        failed += usize::from(outputs.shell.is_err());
        slot.insert("shell".into(), slot_json(&outputs.shell));
      }
      targets.insert(target.to_string(), Value::Object(slot));
    }
    print_json(&json!({
      "inputs": evaluation.registry.revisions(),
      "systems": targets,
    }))?;
  } else {
    print_info(&format!("{} supported target(s)", matrix.len()));
    for (target, outputs) in matrix.iter() {
      println!("{}", target.if_supports_color(Stream::Stdout, |s| s.bold()));
      if has_package {
        failed += usize::from(outputs.package.is_err());
        print_slot("package", &outputs.package);
      }
      if has_shell {
        failed += usize::from(outputs.shell.is_err());
        print_slot("shell", &outputs.shell);
      }
    }
  }

  if failed > 0 {
    anyhow::bail!("{failed} output(s) failed to evaluate");
  }
  Ok(())
}

fn slot_json(slot: &Result<BuildArtifact, TargetError>) -> Value {
  match slot {
    Ok(artifact) => serde_json::to_value(artifact).unwrap_or(Value::Null),
    Err(err) => json!({ "error": err.to_string() }),
  }
}

fn print_slot(label: &str, slot: &Result<BuildArtifact, TargetError>) {
  match slot {
    Ok(artifact) => print_stat(
      label,
      &format!(
        "{} {} {} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        artifact.name,
        symbols::ARROW,
        truncate_hash(&artifact.hash.0)
      ),
    ),
    Err(err) => print_stat(
      label,
      &format!(
        "{} {}",
        symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()),
        err
      ),
    ),
  }
}
