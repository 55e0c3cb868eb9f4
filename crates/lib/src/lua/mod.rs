//! Lua declarations.
//!
//! A declaration file (`pinfold.lua`) is evaluated once and immediately
//! converted into a plain [`Declaration`]. No Lua state outlives loading, so
//! everything downstream is `Send + Sync`.
//!
//! # Submodules
//!
//! - [`entrypoint`] - Declaration file loading and conversion
//! - [`globals`] - The `pinfold` global table
//! - [`helpers`] - Lua helper modules exposed to declarations
//! - [`runtime`] - Low-level Lua VM management
//! - [`types`] - The plain declaration types

pub mod entrypoint;
pub mod globals;
pub mod helpers;
pub mod runtime;
pub mod types;

pub use entrypoint::load_declaration;
pub use types::{Declaration, FileRef, SystemsDecl};
