//! Implementation of the `pinfold init` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use pinfold_lib::init::init;

use crate::output::symbols;

/// Write a template declaration and LuaLS configuration into `path`.
///
/// # Errors
///
/// Returns an error if the declaration already exists or cannot be written.
pub fn cmd_init(path: &Path) -> Result<()> {
  let result = init(path).context("Failed to initialize project")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized pinfold project!".green().bold()
  );
  println!();
  println!(
    "  {} Project directory: {}",
    symbols::INFO.cyan(),
    result.project_dir.display()
  );
  println!(
    "  {} Declaration:       {}",
    symbols::INFO.cyan(),
    result.declaration.display()
  );
  println!(
    "  {} LuaLS config:      {}",
    symbols::INFO.cyan(),
    result.luarc_json.display()
  );
  println!(
    "  {} Type definitions:  {}",
    symbols::INFO.cyan(),
    result.types_dir.display()
  );
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Edit {} to declare your inputs, package and shell",
    result.declaration.display().to_string().cyan()
  );
  println!("  2. Run: {}", "pinfold show".cyan());

  Ok(())
}
