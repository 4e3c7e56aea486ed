use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::error::AnalysisError;
use crate::types::Report;

/// Outputs the report as JSON. Writes to a file if given, otherwise stdout.
pub fn report_json(report: &Report, output_file: Option<&Path>) -> Result<(), AnalysisError> {
    match output_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| export_err(path, e))?;
            write_report(report, BufWriter::new(file)).map_err(|e| export_err(path, e))?;
            eprintln!("✓ JSON report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_report(report, BufWriter::new(stdout.lock()))
                .map_err(|e| export_err(Path::new("<stdout>"), e))?;
        }
    }
    Ok(())
}

fn write_report<W: Write>(report: &Report, mut writer: W) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn export_err(path: &Path, e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Export { path: path.to_path_buf(), reason: e.to_string() }
}
