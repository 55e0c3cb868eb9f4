//! `pinfold update`: move inputs to their newest revisions and rewrite the
//! lock file.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use pinfold_lib::consts::LOCK_FILENAME;
use pinfold_lib::update::{UpdateOptions, UpdateResult, find_declaration_path, update_inputs};

use crate::output::{format_duration, print_info, print_stat, print_success, symbols, truncate_hash};

/// One lock entry that the update touches.
#[derive(Debug, PartialEq, Eq)]
enum Change<'a> {
  Moved { name: &'a str, from: &'a str, to: &'a str },
  Pinned { name: &'a str, rev: &'a str },
  Dropped { name: &'a str },
}

impl Change<'_> {
  fn symbol(&self) -> &'static str {
    match self {
      Change::Moved { .. } => symbols::MODIFY,
      Change::Pinned { .. } => symbols::ADD,
      Change::Dropped { .. } => symbols::REMOVE,
    }
  }

  fn describe(&self, dry_run: bool) -> String {
    match self {
      Change::Moved { name, from, to } => format!(
        "{} {name}: {} {} {}",
        if dry_run { "Would update" } else { "Updated" },
        truncate_hash(from),
        symbols::ARROW,
        truncate_hash(to)
      ),
      Change::Pinned { name, rev } => format!(
        "{} {name} at {}",
        if dry_run { "Would pin" } else { "Pinned" },
        truncate_hash(rev)
      ),
      Change::Dropped { name } => format!("{} {name}", if dry_run { "Would drop" } else { "Dropped" }),
    }
  }
}

/// Moves first, then new pins, then dropped entries; each group in name order.
fn changes(result: &UpdateResult) -> Vec<Change<'_>> {
  let moved = result.updated.iter().map(|(name, (from, to))| Change::Moved {
    name: name.as_str(),
    from: from.as_str(),
    to: to.as_str(),
  });
  let pinned = result.added.iter().filter_map(|name| {
    let input = result.registry.get(name).ok()?;
    Some(Change::Pinned {
      name: name.as_str(),
      rev: input.rev.as_str(),
    })
  });
  let dropped = result.removed.iter().map(|name| Change::Dropped { name: name.as_str() });
  moved.chain(pinned).chain(dropped).collect()
}

/// `inputs` limits the refresh to the named inputs; empty refreshes all.
pub fn cmd_update(file: &Path, inputs: Vec<String>, dry_run: bool) -> Result<()> {
  let start = Instant::now();
  let decl_path = find_declaration_path(Some(file)).context("Failed to find declaration")?;
  let result = update_inputs(&decl_path, &UpdateOptions { inputs, dry_run }).context("Failed to update inputs")?;

  if dry_run {
    print_info("Dry run, the lock file is left as is");
  }

  for change in changes(&result) {
    let symbol = change.symbol();
    println!(
      "  {} {}",
      symbol.if_supports_color(Stream::Stdout, |s| s.yellow()),
      change.describe(dry_run)
    );
  }
  if !result.unchanged.is_empty() {
    print_stat("unchanged", &result.unchanged.join(", "));
  }

  if !result.lock_changed {
    print_success("All inputs are up to date.");
    return Ok(());
  }
  if !dry_run {
    let lock_path = decl_path.parent().unwrap_or(Path::new(".")).join(LOCK_FILENAME);
    print_success(&format!("Wrote {}", lock_path.display()));
    print_stat("duration", &format_duration(start.elapsed()));
  }
  Ok(())
}
