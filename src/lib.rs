//! rmdupes - Duplicate File Remover
//!
//! Removes duplicate files from a single directory: every regular file is
//! hashed, one file is kept per distinct content, and the rest are deleted.
//!
//! The work runs as a three-stage pipeline joined by bounded queues: a
//! directory scanner, a fixed pool of digest workers, and a single
//! deduplicator. The first fatal error in any stage ends the run.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateRemover, RemoverConfig};
use crate::error::ExitCode;
use crate::progress::Progress;

/// Merge command-line overrides on top of the loaded configuration.
#[must_use]
pub fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(workers) = cli.workers {
        config.workers = workers as usize;
    }
    if let Some(capacity) = cli.queue_capacity {
        config.queue_capacity = capacity as usize;
    }
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(size) = cli.buffer_size {
        config.read_buffer_size = size;
    }
    config
}

/// Run the application for parsed arguments.
///
/// # Errors
///
/// Returns a [`config::ConfigError`] for bad configuration and a
/// [`duplicates::PipelineError`] if the run fails.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("Warning: logging unavailable: {e}");
    }

    let loaded = Config::extract(&Config::figment(cli.config.as_deref()))?;
    let config = apply_overrides(loaded, &cli);
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::Success);
    }

    let Some(path) = cli.path.as_deref() else {
        anyhow::bail!("No directory given");
    };

    let mut remover_config = RemoverConfig::default()
        .with_workers(config.workers)
        .with_queue_capacity(config.queue_capacity)
        .with_read_buffer_size(config.read_buffer_size);
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
    if show_progress {
        remover_config = remover_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let summary = DuplicateRemover::new(remover_config)
        .run_with_algorithm(path, config.algorithm)?;

    let stdout = io::stdout();
    output::write_report(&mut stdout.lock(), &summary, cli.output)
        .map_err(|e| anyhow::anyhow!("Failed to write report: {e}"))?;
    Ok(ExitCode::Success)
}
