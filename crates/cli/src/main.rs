mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pinfold_lib::consts::DECL_FILENAME;

use crate::cmd::{cmd_build, cmd_develop, cmd_info, cmd_init, cmd_show, cmd_update};
use crate::output::print_error;

/// Declarative per-platform development shells and package builds
#[derive(Parser)]
#[command(name = "pinfold")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the declaration file
  #[arg(short, long, global = true, default_value = DECL_FILENAME)]
  file: PathBuf,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate the development shell for a target
  Develop {
    /// Target to evaluate (defaults to the host)
    #[arg(short, long)]
    system: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Skip the package's check phase
    #[arg(long)]
    no_check: bool,
  },

  /// Build the package for a target
  Build {
    /// Target to build for (defaults to the host)
    #[arg(short, long)]
    system: Option<String>,

    /// Build against this runtime from the package index instead of the
    /// shell's runtime
    #[arg(short, long)]
    runtime: Option<String>,

    /// Skip the package's check phase
    #[arg(long)]
    no_check: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Evaluate every supported target
  Show {
    /// Evaluate targets in parallel
    #[arg(long)]
    parallel: bool,

    /// Skip the package's check phase
    #[arg(long)]
    no_check: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Re-resolve inputs and rewrite the lock file
  Update {
    /// Inputs to update (all if omitted)
    inputs: Vec<String>,

    /// Show what would change without writing
    #[arg(long)]
    dry_run: bool,
  },

  /// Write a template declaration
  Init {
    /// Project directory
    #[arg(default_value = ".")]
    path: PathBuf,
  },

  /// Show host information
  Info,
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(err) = run(cli) {
    print_error(&format!("{err:#}"));
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  match cli.command {
    Commands::Develop { system, json, no_check } => cmd_develop(&cli.file, system.as_deref(), !no_check, json),
    Commands::Build {
      system,
      runtime,
      no_check,
      json,
    } => cmd_build(&cli.file, system.as_deref(), runtime.as_deref(), !no_check, json),
    Commands::Show {
      parallel,
      no_check,
      json,
    } => cmd_show(&cli.file, parallel, !no_check, json),
    Commands::Update { inputs, dry_run } => cmd_update(&cli.file, inputs, dry_run),
    Commands::Init { path } => cmd_init(&path),
    Commands::Info => {
      cmd_info();
      Ok(())
    }
  }
}
