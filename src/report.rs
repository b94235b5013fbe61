use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::analysis::stats::Statistics;
use crate::error::Result;

pub const REPORT_TITLE: &str = "FUSIONSIM SIMULATION STATISTICS";

/// Write the plain-text statistics report.
///
/// ```text
/// ============================================================
/// FUSIONSIM SIMULATION STATISTICS
/// ============================================================
///
/// GENERAL STATISTICS
/// ----------------------------------------
/// Total particles: 1000
/// Mean energy (keV): 1.2346e+01
/// ...
///
/// ============================================================
/// ```
pub fn write_report<W: Write>(out: &mut W, stats: &Statistics) -> Result<()> {
    let rule = "=".repeat(60);
    writeln!(out, "{rule}")?;
    writeln!(out, "{REPORT_TITLE}")?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;
    writeln!(out, "GENERAL STATISTICS")?;
    writeln!(out, "{}", "-".repeat(40))?;
    for (key, value) in stats.entries() {
        writeln!(out, "{key}: {value}")?;
    }
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    Ok(())
}

/// Export the report to `path`, replacing any existing file.
pub fn export_statistics(path: &Path, stats: &Statistics) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_report(&mut out, stats)?;
    out.flush()?;
    info!("statistics exported: {}", path.display());
    Ok(())
}
