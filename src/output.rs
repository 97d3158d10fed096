//! Final report rendering.
//!
//! The text report keeps the classic one-line total; JSON exposes the full
//! [`RunSummary`].

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::cli::OutputFormat;
use crate::duplicates::RunSummary;

/// Write the report for `summary` in the requested format.
///
/// # Errors
///
/// Returns an error if writing fails or the summary cannot be serialized.
pub fn write_report<W: Write>(
    writer: &mut W,
    summary: &RunSummary,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => write_text(writer, summary),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, summary)?;
            writeln!(writer)
        }
    }
}

fn write_text<W: Write>(writer: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(writer, "Deleted a total of {} files.", summary.deleted_files)?;
    if summary.deleted_files > 0 {
        writeln!(
            writer,
            "Reclaimed {} ({} unique of {} files, {})",
            ByteSize(summary.bytes_reclaimed),
            summary.unique_files,
            summary.files_hashed,
            summary.algorithm
        )?;
    }
    Ok(())
}
