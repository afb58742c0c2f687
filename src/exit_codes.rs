//! Exit code constants for the voxdeploy CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unreadable deploy.yaml, unknown service)
//! - 2: Configuration failure (schema definition or override resolution)
//! - 3: Build failure (missing auxiliary file, bad dependency pin)
//! - 4: Compile failure (unresolved artifact, naming collision)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid project state.
pub const USER_ERROR: i32 = 1;

/// Configuration failure: malformed schema or type-mismatched override.
pub const CONFIG_FAILURE: i32 = 2;

/// Build failure: artifact could not be produced.
pub const BUILD_FAILURE: i32 = 3;

/// Compile failure: process unit could not be synthesized.
pub const COMPILE_FAILURE: i32 = 4;
