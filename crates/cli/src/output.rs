//! CLI output formatting utilities.
//!
//! Colored status lines, artifact summaries, and JSON printing.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

use pinfold_lib::artifact::BuildArtifact;

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Comma-separated `name==version` pairs.
pub fn format_pins<'a, I>(pins: I) -> String
where
  I: IntoIterator<Item = (&'a String, &'a String)>,
{
  let parts: Vec<String> = pins.into_iter().map(|(n, v)| format!("{n}=={v}")).collect();
  if parts.is_empty() { "(none)".to_string() } else { parts.join(", ") }
}

/// Human summary of one shell or package artifact.
pub fn print_artifact(artifact: &BuildArtifact) {
  print_stat("target", artifact.target.as_str());
  print_stat(
    "runtime",
    &format!("{} ({})", artifact.runtime.id, artifact.runtime.version),
  );
  print_stat("packages", &format_pins(&artifact.runtime_closure));
  if !artifact.tools.is_empty() {
    print_stat("tools", &format_pins(&artifact.tools));
  }
  if let Some(source) = &artifact.source_hash {
    print_stat("source", truncate_hash(&source.to_string()));
  }
  print_stat("hash", truncate_hash(&artifact.hash.0));
}
