//! The process environment the construction and check phases run in.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::process::Command;

/// Where a phase command runs and writes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sandbox<'a> {
  pub cwd: &'a Path,
  pub out_dir: &'a Path,
  pub tmp_dir: &'a Path,
}

/// `cmd` under the platform shell with the environment cleared and rebuilt:
/// - `HOME` is `/homeless-shelter`
/// - `TMPDIR` (and `TMP`, `TEMP`) is `sandbox.tmp_dir`, `out` is `sandbox.out_dir`
/// - `SOURCE_DATE_EPOCH` is fixed, locale is `C`
/// - `PATH` is passed through, since tool binaries are provided by the host
pub(crate) fn command(cmd: &str, shell: Option<&str>, sandbox: &Sandbox<'_>) -> Command {
  let (shell_cmd, shell_args) = get_shell(shell);
  let mut command = Command::new(&shell_cmd);
  command
    .args(&shell_args)
    .arg(cmd)
    .current_dir(sandbox.cwd)
    .env_clear()
    .env("HOME", "/homeless-shelter")
    .env("TMPDIR", sandbox.tmp_dir)
    .env("TMP", sandbox.tmp_dir)
    .env("TEMP", sandbox.tmp_dir)
    .env("out", sandbox.out_dir)
    .env("LANG", "C")
    .env("LC_ALL", "C")
    .env("SOURCE_DATE_EPOCH", "315532800");
  if let Some(path) = std::env::var_os("PATH") {
    command.env("PATH", path);
  }
  command
}

/// `name=version` pairs, space separated.
pub(crate) fn format_set(deps: &BTreeMap<String, String>) -> String {
  deps
    .iter()
    .map(|(name, version)| format!("{name}={version}"))
    .collect::<Vec<_>>()
    .join(" ")
}

pub(crate) fn current_thread() -> std::io::Result<tokio::runtime::Runtime> {
  tokio::runtime::Builder::new_current_thread().enable_all().build()
}

fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
