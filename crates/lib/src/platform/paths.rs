use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var_os("USERPROFILE").map(PathBuf::from).unwrap_or_default()
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default()
}

/// Returns the directory for cache files for the application.
///
/// `PINFOLD_CACHE` overrides the platform default.
pub fn cache_dir() -> PathBuf {
  if let Some(dir) = std::env::var_os("PINFOLD_CACHE") {
    return PathBuf::from(dir);
  }
  default_cache_dir()
}

#[cfg(windows)]
fn default_cache_dir() -> PathBuf {
  let local_appdata = std::env::var_os("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|| home_dir().join("AppData").join("Local"));
  local_appdata.join(APP_NAME).join("Cache")
}

#[cfg(not(windows))]
fn default_cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Directory holding checked-out git inputs.
pub fn inputs_cache_dir() -> PathBuf {
  cache_dir().join("inputs")
}

/// Directory holding LuaLS type definitions for declarations.
pub fn types_dir() -> PathBuf {
  cache_dir().join("types")
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn override_takes_precedence() {
    temp_env::with_vars(
      [
        ("PINFOLD_CACHE", Some("/tmp/pinfold-cache")),
        ("XDG_CACHE_HOME", Some("/custom/cache")),
      ],
      || {
        assert_eq!(cache_dir(), PathBuf::from("/tmp/pinfold-cache"));
        assert_eq!(inputs_cache_dir(), PathBuf::from("/tmp/pinfold-cache/inputs"));
      },
    );
  }

  #[test]
  #[serial]
  fn xdg_fallback_to_home_directories() {
    temp_env::with_vars(
      [
        ("PINFOLD_CACHE", None::<&str>),
        ("XDG_CACHE_HOME", None::<&str>),
        ("HOME", Some("/home/user")),
      ],
      || {
        assert_eq!(cache_dir(), PathBuf::from("/home/user/.cache").join(APP_NAME));
      },
    );
  }
}
