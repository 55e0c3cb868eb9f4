use std::path::PathBuf;

use crate::inputs::InputDecls;
use crate::package::PackageSpec;
use crate::shell::EnvironmentSpec;

/// A file inside a pinned input's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
  pub input: String,
  pub file: String,
}

/// Where the supported target set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemsDecl {
  /// Nothing declared: the built-in default set.
  Default,
  /// A literal list in the declaration.
  List(Vec<String>),
  /// A JSON string array read from an input's raw tree.
  File(FileRef),
  /// The `systems` of an evaluable input's own declaration.
  Input(String),
}

/// A loaded declaration, free of any Lua state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
  /// Canonical path of the declaration file.
  pub path: PathBuf,
  /// Directory containing the declaration file.
  pub dir: PathBuf,
  pub inputs: InputDecls,
  pub systems: SystemsDecl,
  /// Location of the package index.
  pub index: FileRef,
  pub package: Option<PackageSpec>,
  /// Absent only when neither a package nor a shell runtime is declared.
  pub shell: Option<EnvironmentSpec>,
}
