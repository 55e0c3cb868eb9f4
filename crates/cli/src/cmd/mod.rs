mod build;
mod develop;
mod info;
mod init;
mod show;
mod update;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use pinfold_lib::eval::{EvalOptions, Evaluation, evaluate};
use pinfold_lib::package::{CheckRunner, CommandCheck, NoCheck};
use pinfold_lib::platform::Target;

pub use build::cmd_build;
pub use develop::cmd_develop;
pub use info::cmd_info;
pub use init::cmd_init;
pub use show::cmd_show;
pub use update::cmd_update;

fn load(file: &Path) -> Result<Evaluation> {
  if !file.is_file() {
    anyhow::bail!("Declaration not found: {}", file.display());
  }
  debug!(file = %file.display(), "evaluating declaration");
  evaluate(file, &EvalOptions::default()).with_context(|| format!("Failed to evaluate {}", file.display()))
}

fn target(system: Option<&str>) -> Result<Target> {
  match system {
    Some(id) => Target::new(id).context("Invalid --system"),
    None => Target::current().context("Could not detect the host platform; pass --system"),
  }
}

fn checker(run_checks: bool) -> Box<dyn CheckRunner> {
  if run_checks {
    Box::new(CommandCheck::new())
  } else {
    Box::new(NoCheck)
  }
}
