//! Public SDK surface for callcast.
//!
//! Re-exports the workspace crates and provides the logging setup shared by
//! the binary and embedders.

/// Re-export for convenience.
pub use callcast_config as config;
pub use callcast_core as hub;
/// Re-export for convenience.
pub use callcast_protocol as protocol;
pub use callcast_server as server;

pub use callcast_config::CallcastConfig;
pub use callcast_core::CallHub;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Uses millisecond timestamps and honours `RUST_LOG`. Calling it more than
/// once is harmless.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
