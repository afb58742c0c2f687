//! Filesystem utilities for voxdeploy.
//!
//! Manifests and rendered unit files are written atomically so a crashed run
//! never leaves a half-written file where the supervisor or a later build
//! would read it.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
