//! Package definitions and the reusable builder.

mod builder;
mod check;
mod construct;
mod metadata;
mod sandbox;
mod types;

pub use builder::{BuildError, PackageBuilder, build};
pub use check::{CheckContext, CheckError, CheckRunner, CommandCheck, NoCheck, execute_check};
pub use construct::{CommandConstruct, ConstructContext, ConstructError, Constructor, NoConstruct, execute_construct};
pub use metadata::{MetadataError, ProjectMetadata, normalize_name, read_metadata, requirement_name};
pub use types::{BuildFormat, PackageSpec, Tier};
