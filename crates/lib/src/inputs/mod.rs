//! Input pinning.
//!
//! This module resolves the external inputs declared in the declaration's
//! `inputs` table (git repositories and local paths) to exact revisions, once
//! per evaluation.
//!
//! # Modules
//!
//! - [`locator`] - Locator parsing (`git:`, `github:`, `path:`)
//! - [`lock`] - Lock file management for reproducible evaluation
//! - [`fetch`] - Git fetch and path resolution operations
//! - [`registry`] - Resolution orchestration and the read-only registry
//! - [`types`] - Input declarations and resolved inputs

pub mod fetch;
pub mod locator;
pub mod lock;
pub mod registry;
mod types;

pub use registry::{InputRegistry, ResolutionResult, ResolveError, resolve_inputs, save_lock_file_if_changed};
pub use types::*;
