// redactgate/src/logger.rs
//! Logging setup for the CLI.

use env_logger::Env;
use log::LevelFilter;

/// Initializes the global logger. `--debug` forces debug output and
/// `--quiet` drops everything below errors; otherwise `RUST_LOG` applies,
/// falling back to `info`. Logs go to stderr so stdout stays a clean
/// transport for processed text.
pub fn init(quiet: bool, debug: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    } else if quiet {
        builder.filter_level(LevelFilter::Error);
    }
    builder.format_timestamp(None);
    // Tests may initialize more than once.
    let _ = builder.try_init();
}
