//! Figure production and persistence.
//!
//! The session only depends on the [`Renderer`] and [`Persister`] traits. The
//! raster implementations here draw `plotters` charts into an in-memory RGB
//! buffer and write PNG files.
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::pairwise::DistanceHistogram;
use crate::data::filter::{DatasetView, EnergyBounds};
use crate::error::Result;

pub mod raster;

pub use raster::{PngPersister, RasterFigure, RasterRenderer};

// ---------------------------------------------------------------------------
// Plot kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlotKind {
    /// Six-panel overview.
    Comprehensive,
    /// x–vx, y–vy, z–vz.
    PhaseSpace,
    Positions3d,
    EnergyVsRadius,
    /// Pairwise distance histogram; produced by the distance analysis, not by
    /// [`Renderer::render`].
    DistanceHistogram,
}

impl PlotKind {
    /// Kinds selectable from the menu and in batch mode.
    pub const SELECTABLE: [PlotKind; 4] = [
        PlotKind::Comprehensive,
        PlotKind::PhaseSpace,
        PlotKind::Positions3d,
        PlotKind::EnergyVsRadius,
    ];

    /// Used in default interactive file names.
    pub fn slug(self) -> &'static str {
        match self {
            PlotKind::Comprehensive => "comprehensive",
            PlotKind::PhaseSpace => "phase_space",
            PlotKind::Positions3d => "3d",
            PlotKind::EnergyVsRadius => "energy_filter",
            PlotKind::DistanceHistogram => "distances",
        }
    }

    /// Used in batch output file names.
    pub fn batch_suffix(self) -> &'static str {
        match self {
            PlotKind::EnergyVsRadius => "energy",
            other => other.slug(),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PlotKind::Comprehensive => "Comprehensive Analysis",
            PlotKind::PhaseSpace => "Phase Space",
            PlotKind::Positions3d => "3D Particle Distribution",
            PlotKind::EnergyVsRadius => "Energy vs Radius",
            PlotKind::DistanceHistogram => "Distance between Particles",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// ---------------------------------------------------------------------------
// Configuration and parameters
// ---------------------------------------------------------------------------

/// Static rendering style, fixed at renderer construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
    pub axis_color: [u8; 3],
    /// Half-size of a scatter marker in pixels.
    pub marker_radius: u32,
    /// Grid radii in metres, drawn as reference lines/circles.
    pub grid_radii: Vec<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1600,
            height: 1200,
            background: [255, 255, 255],
            axis_color: [40, 40, 40],
            marker_radius: 1,
            grid_radii: vec![0.016, 0.08],
        }
    }
}

/// Per-call parameters: the energy window the view was selected with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub bounds: EnergyBounds,
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Turns particle views into figures.
pub trait Renderer {
    /// Exclusively owned; dropping it releases the figure.
    type Figure;

    fn render(
        &mut self,
        view: &DatasetView<'_>,
        kind: PlotKind,
        params: &RenderParams,
    ) -> Result<Self::Figure>;

    fn render_distances(&mut self, histogram: &DistanceHistogram) -> Result<Self::Figure>;
}

/// Writes a figure to disk.
pub trait Persister<F> {
    fn persist(&self, figure: &F, path: &Path) -> Result<()>;
}
