//! Build metadata and ledger protocol version generated by the build script.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Ledger wire protocol revision this build speaks.
/// Falls back to the baseline revision if the build script could not read it.
pub fn ledger_protocol_version() -> u32 {
    LEDGER_PROTOCOL_VERSION.parse().unwrap_or(20240914)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Long version line used by `--version`
pub fn long_version() -> String {
    format!(
        "{} (protocol {}, built {}, git {})",
        env!("CARGO_PKG_VERSION"),
        ledger_protocol_version(),
        build_time(),
        git_hash()
    )
}
