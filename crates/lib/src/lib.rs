//! pinfold-lib: declarative build and environment provisioning
//!
//! From a declaration (`pinfold.lua`) and a set of pinned inputs, this crate
//! derives per target platform:
//! - a development shell with a fixed runtime and package set
//! - a package artifact built from local source against a runtime instance
//!
//! The package builder is a pure function of a [`package::PackageSpec`] and a
//! [`runtime::RuntimeInstance`], so it can be reused with any runtime.

pub mod artifact;
pub mod consts;
pub mod eval;
pub mod init;
pub mod inputs;
pub mod lua;
pub mod package;
pub mod platform;
pub mod runtime;
pub mod shell;
pub mod update;
pub mod util;
