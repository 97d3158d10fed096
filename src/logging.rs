//! Logging setup for rmdupes.
//!
//! Uses the `log` facade with the `env_logger` backend. The level comes from
//! (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `-v`/`-vv`/`-vvv`
//! 3. Default: warnings, so a normal run prints only the final report
//!
//! Log output goes to stderr; the report goes to stdout.
//!
//! # Example
//!
//! ```rust,no_run
//! use rmdupes::logging::init_logging;
//!
//! // -vv: per-file decisions from the deduplicator
//! init_logging(2, false).expect("logger already set");
//! log::debug!("ready");
//! ```

use env_logger::Builder;
use log::{LevelFilter, SetLoggerError};
use std::env;
use std::io::Write;

/// Initialize the global logger from CLI verbosity flags.
///
/// # Arguments
///
/// * `verbose` - Verbosity count (0=warn, 1=info, 2=debug, 3+=trace)
/// * `quiet` - If true, only errors are shown (overridden by `RUST_LOG`)
///
/// # Errors
///
/// Returns an error if a global logger was already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<(), SetLoggerError> {
    let from_env = env::var_os("RUST_LOG").is_some();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level);
    }
    configure_format(&mut builder, verbose);
    builder.try_init()?;

    if from_env {
        log::debug!("Logging configured from RUST_LOG");
    } else {
        log::debug!("Logging initialized at level: {}", level);
    }
    Ok(())
}

/// Map CLI flags to a level filter.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Debug builds and `-vv` and above add a timestamp and the thread name
/// (digest workers are named `rmdupes-hasher-N`).
fn configure_format(builder: &mut Builder, verbose: u8) {
    let detailed = cfg!(debug_assertions) || verbose >= 2;

    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        if detailed {
            let thread = std::thread::current();
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} [{}] {}",
                buf.timestamp_millis(),
                level,
                thread.name().unwrap_or("-"),
                record.args()
            )
        } else {
            writeln!(buf, "{level_style}{:<5}{level_style:#} {}", level, record.args())
        }
    });
}
