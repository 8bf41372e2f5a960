//! Command: print version information.

/// Version string embedded at build time, or the crate version for
/// untagged builds.
#[must_use]
pub fn version() -> &'static str {
    option_env!("THUNDERIZE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the thunderize version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("thunderize {}", version());
}
