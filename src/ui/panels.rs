use std::io::{self, Write};

use crate::analysis::pairwise::DistanceHistogram;
use crate::analysis::stats::{format_scientific, Statistics};
use crate::data::filter::EnergyBounds;
use crate::session::DatasetSummary;

// ---------------------------------------------------------------------------
// Text panels for the console front end
// ---------------------------------------------------------------------------

/// Banner with dataset summary followed by the option list.
pub fn menu(out: &mut impl Write, summary: &DatasetSummary, bounds: &EnergyBounds) -> io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "  FUSIONSIM INTERACTIVE EXPLORER")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "  Loaded: {} particles", summary.particles)?;
    writeln!(
        out,
        "  Energy range: {:.2} - {:.2} keV",
        summary.min_energy_kev, summary.max_energy_kev
    )?;
    writeln!(
        out,
        "  Filter: {:.2} - {:.2} keV",
        bounds.min_kev, bounds.max_kev
    )?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;
    writeln!(out, "Available plots:")?;
    writeln!(out, "  [1] Comprehensive Analysis (6 panels)")?;
    writeln!(out, "  [2] Phase Space (x-vx, y-vy, z-vz)")?;
    writeln!(out, "  [3] 3D Particle Distribution")?;
    writeln!(out, "  [4] Energy vs Radius (filtered)")?;
    writeln!(out, "  [5] Show Statistics")?;
    writeln!(out, "  [6] Energy Filter Settings")?;
    writeln!(out, "  [7] Pairwise Distance Histogram")?;
    writeln!(out, "  [s] Save current plot to file")?;
    writeln!(out, "  [q] Quit")?;
    writeln!(out, "{}", "-".repeat(60))
}

pub fn statistics(out: &mut impl Write, stats: &Statistics) -> io::Result<()> {
    let rule = "=".repeat(50);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "SIMULATION STATISTICS")?;
    writeln!(out, "{rule}")?;
    for (key, value) in stats.entries() {
        writeln!(out, "  {key}: {value}")?;
    }
    writeln!(out, "{rule}")
}

/// Headline numbers of a distance histogram.
pub fn distances(out: &mut impl Write, histogram: &DistanceHistogram) -> io::Result<()> {
    let (lo, hi) = histogram.range();
    writeln!(out, "Pairs binned: {}", histogram.total())?;
    if histogram.rejected() > 0 {
        writeln!(out, "Pairs with non-finite distance: {}", histogram.rejected())?;
    }
    writeln!(
        out,
        "Range: {} - {} m in {} bins",
        format_scientific(lo),
        format_scientific(hi),
        histogram.bins()
    )?;
    if let Some(mode) = histogram.mode() {
        writeln!(out, "Most common distance: {} m", format_scientific(mode))?;
    }
    Ok(())
}
