/// Application name, used for cache directories and environment variables.
pub const APP_NAME: &str = "pinfold";

/// Default name of the declaration file.
pub const DECL_FILENAME: &str = "pinfold.lua";

/// Name of the lock file written next to the declaration.
pub const LOCK_FILENAME: &str = "pinfold.lock";

/// Length of the truncated object hash used to identify artifacts.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Entries never included when content-hashing a source tree or path input.
pub const TREE_HASH_EXCLUDES: &[&str] = &[".git", "target", "__pycache__", ".pytest_cache", "result"];
