//! Package builds.
//!
//! A `BuildDescriptor` declares a source tree, a pinned dependency set and a
//! fixed sequence of post-build steps. Building it yields an immutable
//! artifact in a content-addressed store; the same dependency set also feeds
//! the development environments in [`devenv`].

mod artifact;
mod descriptor;
pub mod devenv;
mod hashing;
mod plan;
mod source;


pub use artifact::{Artifact, ArtifactManifest, MANIFEST_FILE};
pub use descriptor::{BuildDescriptor, Dependency, DependencySet, PostBuildStep};
pub use devenv::{DevEnvironment, DevProfile};
pub use plan::{BuildPlan, StagedBuild, build};
