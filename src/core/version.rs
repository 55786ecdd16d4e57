//! Build metadata shared by the binary and the library.
//! This includes the generated version.rs from the build script into a core module,
//! providing a single source of truth.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Crate version from Cargo metadata
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// One-line package description from Cargo.toml
pub fn description() -> &'static str {
    PACKAGE_DESCRIPTION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Version banner used by the startup log line
pub fn banner() -> String {
    format!("{} ({}, built {})", version(), git_hash(), build_time())
}
