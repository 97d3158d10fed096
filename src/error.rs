//! Structured error handling and exit codes.

use serde::Serialize;

use crate::config::ConfigError;
use crate::duplicates::PipelineError;

/// Exit codes for rmdupes.
///
/// - 0: Success (including "nothing to delete")
/// - 1: General error (listing, reading or deleting failed)
/// - 2: Invalid configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The run completed.
    Success = 0,
    /// The run stopped on a fatal error.
    GeneralError = 1,
    /// The configuration could not be loaded or is out of range.
    InvalidConfig = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RM000",
            Self::GeneralError => "RM001",
            Self::InvalidConfig => "RM002",
        }
    }

    /// Pick the exit code for an application error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<ConfigError>().is_some() {
            Self::InvalidConfig
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Failure category: enumeration, read, deletion, config or internal
    pub category: &'static str,
    /// File or directory involved, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        let pipeline = err.downcast_ref::<PipelineError>();
        let category = match pipeline {
            Some(e) => e.category(),
            None if exit_code == ExitCode::InvalidConfig => "config",
            None => "internal",
        };
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            category,
            path: pipeline
                .and_then(PipelineError::path)
                .map(|p| p.display().to_string()),
        }
    }
}
