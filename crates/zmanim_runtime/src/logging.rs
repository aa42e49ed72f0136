//! Log output for the command line tools.
//!
//! Logs go to stderr so they never mix with results on stdout. `RUST_LOG`
//! takes precedence over the level passed in.

use tracing_subscriber::EnvFilter;

/// Level used when neither `RUST_LOG` nor a flag asks for more.
pub const DEFAULT_LEVEL: &str = "warn";

/// Installs the global subscriber. Later calls are ignored.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The level for a count of `-v` flags.
#[must_use]
pub const fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
