//! Tracing subscriber set-up for the CLI.
//!
//! Filter precedence:
//! 1. `--verbose`: debug for the repodocs crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for the repodocs crates
//!
//! Logs go to stderr; stdout is reserved for the run summary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "repodocs=debug,repodocs_core=debug";
const QUIET_FILTER: &str = "repodocs=error,repodocs_core=error";
const DEFAULT_FILTER: &str = "repodocs=info,repodocs_core=info";

/// Filter for the given flags; `verbose` wins over `quiet`.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Installs the global subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .init();
}
