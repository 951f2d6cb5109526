//! Version and build information for Meridian

/// Full version string: "meridian {version} ({commit}) rustc {rustc_version}"
pub fn version() -> String {
    format!(
        "meridian {} ({}) rustc {}",
        package_version(),
        build_commit(),
        rustc_version()
    )
}

/// Package version (e.g., "0.4.0")
pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build commit SHA, "unknown" if not built from a git checkout
pub fn build_commit() -> &'static str {
    option_env!("MERIDIAN_COMMIT_SHA").unwrap_or("unknown")
}

/// Rust compiler version used for the build
pub fn rustc_version() -> &'static str {
    option_env!("MERIDIAN_RUSTC_VERSION").unwrap_or("unknown")
}
