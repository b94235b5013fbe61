use log::debug;

use crate::data::filter::{DatasetView, EnergyBounds};
use crate::data::model::Dataset;
use crate::render::PlotKind;

// ---------------------------------------------------------------------------
// Exploration state
// ---------------------------------------------------------------------------

/// The mutable part of an exploration session, independent of I/O.
///
/// Holds the energy window, the last plot kind and at most one figure.
/// Replacing or clearing the figure drops the previous one.
#[derive(Debug)]
pub struct ExplorationState<F> {
    /// Energy window applied to every view.
    bounds: EnergyBounds,

    /// Upper clamp for `bounds`: the dataset's largest energy.
    ceiling_kev: f64,

    /// Kind of the most recently rendered figure.
    current_plot: PlotKind,

    /// The single owned figure, if any.
    figure: Option<F>,
}

impl<F> ExplorationState<F> {
    /// Full energy window, no figure.
    pub fn new(dataset: &Dataset) -> Self {
        Self {
            bounds: EnergyBounds::full(dataset),
            ceiling_kev: dataset.max_energy_kev(),
            current_plot: PlotKind::Comprehensive,
            figure: None,
        }
    }

    pub fn bounds(&self) -> EnergyBounds {
        self.bounds
    }

    pub fn ceiling_kev(&self) -> f64 {
        self.ceiling_kev
    }

    /// Clamp and store a new energy window.
    pub fn set_bounds(&mut self, min_kev: f64, max_kev: f64) -> EnergyBounds {
        self.bounds = EnergyBounds::clamped(min_kev, max_kev, self.ceiling_kev);
        self.bounds
    }

    /// The dataset rows inside the current window.
    pub fn view<'a>(&self, dataset: &'a Dataset) -> DatasetView<'a> {
        DatasetView::filtered(dataset, &self.bounds)
    }

    pub fn current_plot(&self) -> PlotKind {
        self.current_plot
    }

    pub fn figure(&self) -> Option<&F> {
        self.figure.as_ref()
    }

    pub fn has_figure(&self) -> bool {
        self.figure.is_some()
    }

    /// Drop the held figure, if any.
    pub fn release_figure(&mut self) {
        if self.figure.take().is_some() {
            debug!("released {} figure", self.current_plot.slug());
        }
    }

    /// Take ownership of a freshly rendered figure.
    pub fn hold_figure(&mut self, kind: PlotKind, figure: F) {
        self.release_figure();
        self.current_plot = kind;
        self.figure = Some(figure);
    }
}
