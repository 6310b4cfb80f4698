//! Diagnostic logging setup for the `pwvault` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is
//! left to the binary.  Events never carry passwords, ciphertext, or key
//! material, only ids, counts, paths and key fingerprints.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "PWVAULT_LOG";

/// Pick the filter: `PWVAULT_LOG` wins, otherwise `debug` when verbose
/// and `warn` when not.
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(format!("pwvault={level}"))
    })
}

/// Install the global stderr subscriber.  Later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
