//! Command-line interface definitions for rmdupes.
//!
//! The CLI takes a single directory and a handful of tuning options. Every
//! option that is also a config setting overrides the config file and the
//! `RMDUPES_*` environment variables.
//!
//! # Example
//!
//! ```bash
//! # Remove duplicates with the defaults (10 workers, SHA-256)
//! rmdupes ~/Downloads
//!
//! # More workers, faster digest, JSON summary
//! rmdupes ~/Downloads -w 32 --algorithm blake3 --output json
//!
//! # Verbose mode for debugging
//! rmdupes -v ~/Downloads
//! ```

use bytesize::ByteSize;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::scanner::{DigestAlgorithm, MAX_READ_BUFFER_SIZE};

/// Remove duplicate files from a directory.
///
/// Every regular file directly inside PATH is hashed; for each distinct
/// content exactly one file is kept and the others are deleted permanently.
/// Subdirectories are ignored. Which copy survives is not specified.
#[derive(Debug, Parser)]
#[command(name = "rmdupes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory whose duplicate files are removed
    #[arg(value_name = "PATH", required_unless_present = "print_config")]
    pub path: Option<PathBuf>,

    /// Number of concurrent digest workers [default: 10]
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Capacity of the queues between stages [default: 50]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub queue_capacity: Option<u32>,

    /// Digest function used to compare file contents [default: sha256]
    #[arg(short, long, value_enum, value_name = "ALGORITHM")]
    pub algorithm: Option<DigestAlgorithm>,

    /// Read buffer size per worker (e.g. 64KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_buffer_size)]
    pub buffer_size: Option<usize>,

    /// Configuration file (TOML) to use instead of the platform default
    #[arg(short, long, value_name = "FILE", env = "RMDUPES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Format of the final report
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Output format for the final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary line
    #[default]
    Text,
    /// JSON summary for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use rmdupes::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a read buffer size: a [`parse_size`] value between one byte and
/// [`MAX_READ_BUFFER_SIZE`].
///
/// # Errors
///
/// Returns an error for zero, unparsable or oversized values.
pub fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Buffer size must be at least 1 byte".to_string());
    }
    match usize::try_from(bytes) {
        Ok(size) if size <= MAX_READ_BUFFER_SIZE => Ok(size),
        _ => Err(format!(
            "Buffer size too large: '{s}' (at most {})",
            ByteSize(MAX_READ_BUFFER_SIZE as u64)
        )),
    }
}
