use std::fmt;
use std::path::PathBuf;

use log::{info, warn};

use crate::analysis::pairwise::{
    DistanceHistogram, InterruptSignal, LogProgress, PairwiseDistanceAnalyzer, ProgressSink,
};
use crate::analysis::stats::Statistics;
use crate::config::ExplorerConfig;
use crate::data::filter::{DatasetView, EnergyBounds};
use crate::data::model::Dataset;
use crate::error::{Error, Result};
use crate::render::{Persister, PlotKind, RenderParams, Renderer};
use crate::state::ExplorationState;

// ---------------------------------------------------------------------------
// Session states
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a menu command. Initial state.
    MenuIdle,
    /// A figure was just produced and awaits acknowledgement.
    PlotDisplayed(PlotKind),
    /// Terminal; the figure has been released.
    Exited,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::MenuIdle => write!(f, "at the menu"),
            SessionState::PlotDisplayed(kind) => write!(f, "displaying {kind}"),
            SessionState::Exited => write!(f, "exited"),
        }
    }
}

/// Particle count and energy range of the loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSummary {
    pub particles: usize,
    pub min_energy_kev: f64,
    pub max_energy_kev: f64,
}

// ---------------------------------------------------------------------------
// ExplorationSession
// ---------------------------------------------------------------------------

/// Finite-state controller over one dataset.
///
/// ```text
///   MenuIdle ──select(kind)──► PlotDisplayed(kind) ──acknowledge──► MenuIdle
///   MenuIdle ──configure / save / statistics──► MenuIdle
///   MenuIdle ──quit──► Exited
/// ```
///
/// Failed operations leave the state untouched. `select` and
/// `analyze_distances` release the held figure before rendering its
/// replacement, so a render failure leaves no figure held. An interrupted
/// distance sweep fails before that point and keeps the previous figure.
pub struct ExplorationSession<R: Renderer, P> {
    dataset: Dataset,
    renderer: R,
    persister: P,
    analyzer: PairwiseDistanceAnalyzer,
    signal: InterruptSignal,
    output_dir: PathBuf,
    figure_prefix: String,
    state: ExplorationState<R::Figure>,
    phase: SessionState,
}

impl<R, P> ExplorationSession<R, P>
where
    R: Renderer,
    P: Persister<R::Figure>,
{
    pub fn new(dataset: Dataset, renderer: R, persister: P, config: &ExplorerConfig) -> Self {
        let state = ExplorationState::new(&dataset);
        ExplorationSession {
            dataset,
            renderer,
            persister,
            analyzer: PairwiseDistanceAnalyzer::new(
                config.analysis.histogram_bins,
                config.analysis.block_size,
            ),
            signal: InterruptSignal::new(),
            output_dir: config.output_dir.clone(),
            figure_prefix: config.figure_prefix.clone(),
            state,
            phase: SessionState::MenuIdle,
        }
    }

    /// Share an interrupt signal with an external handler.
    pub fn with_signal(mut self, signal: InterruptSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn state(&self) -> SessionState {
        self.phase
    }

    pub fn exploration(&self) -> &ExplorationState<R::Figure> {
        &self.state
    }

    pub fn bounds(&self) -> EnergyBounds {
        self.state.bounds()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn signal(&self) -> &InterruptSignal {
        &self.signal
    }

    pub fn has_figure(&self) -> bool {
        self.state.has_figure()
    }

    /// Rows inside the current energy window.
    pub fn view(&self) -> DatasetView<'_> {
        self.state.view(&self.dataset)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            particles: self.dataset.len(),
            min_energy_kev: self.dataset.min_energy_kev(),
            max_energy_kev: self.dataset.max_energy_kev(),
        }
    }

    fn require_idle(&self, operation: &'static str) -> Result<()> {
        match self.phase {
            SessionState::MenuIdle => Ok(()),
            state => Err(Error::InvalidTransition { operation, state }),
        }
    }

    /// Render `kind` over the filtered view and hold the result.
    ///
    /// The previous figure is released before rendering. Selecting
    /// [`PlotKind::DistanceHistogram`] runs the distance analysis with
    /// log-based progress.
    pub fn select(&mut self, kind: PlotKind) -> Result<()> {
        self.require_idle("select")?;
        if kind == PlotKind::DistanceHistogram {
            return self.analyze_distances(&mut LogProgress::default()).map(|_| ());
        }

        self.state.release_figure();
        let params = RenderParams {
            bounds: self.state.bounds(),
        };
        let view = self.state.view(&self.dataset);
        info!("rendering {kind} for {} particles", view.len());
        let figure = self.renderer.render(&view, kind, &params)?;

        self.state.hold_figure(kind, figure);
        self.phase = SessionState::PlotDisplayed(kind);
        Ok(())
    }

    /// Return to the menu, keeping the figure for a later save.
    pub fn acknowledge(&mut self) -> Result<()> {
        match self.phase {
            SessionState::PlotDisplayed(_) => {
                self.phase = SessionState::MenuIdle;
                Ok(())
            }
            state => Err(Error::InvalidTransition {
                operation: "acknowledge",
                state,
            }),
        }
    }

    /// Set the energy window from raw user input.
    ///
    /// An empty input keeps that bound. Both inputs are validated before
    /// anything changes, so a bad maximum does not leave a new minimum behind.
    pub fn configure(&mut self, min_input: &str, max_input: &str) -> Result<EnergyBounds> {
        self.require_idle("configure")?;
        let current = self.state.bounds();
        let min = parse_bound(min_input, current.min_kev)?;
        let max = parse_bound(max_input, current.max_kev)?;

        let bounds = self.state.set_bounds(min, max);
        info!(
            "energy window set to {:.2} - {:.2} keV ({} particles)",
            bounds.min_kev,
            bounds.max_kev,
            self.view().len()
        );
        Ok(bounds)
    }

    /// Write the held figure to `<output_dir>/<name>.png`.
    ///
    /// A missing or blank name falls back to `<prefix>_<plot kind>`.
    pub fn save(&mut self, name: Option<&str>) -> Result<PathBuf> {
        self.require_idle("save")?;
        let figure = self.state.figure().ok_or(Error::NoActiveFigure)?;

        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("{}_{}", self.figure_prefix, self.state.current_plot().slug()),
        };
        let path = self.output_dir.join(format!("{name}.png"));
        self.persister.persist(figure, &path)?;
        Ok(path)
    }

    /// Statistics over the current filtered view.
    pub fn statistics(&self) -> Result<Statistics> {
        self.require_idle("statistics")?;
        Statistics::compute(&self.view())
    }

    /// Histogram all pair distances of the filtered view and display it.
    ///
    /// On interruption the partial result is discarded and the session stays
    /// at the menu with its previous figure.
    pub fn analyze_distances(&mut self, progress: &mut dyn ProgressSink) -> Result<DistanceHistogram> {
        self.require_idle("analyze distances")?;
        let histogram = {
            let _armed = self.signal.arm();
            let view = self.state.view(&self.dataset);
            info!(
                "computing {} pair distances",
                PairwiseDistanceAnalyzer::pair_count(view.len())
            );
            match self.analyzer.analyze(&view, &self.signal, progress) {
                Ok(h) => h,
                Err(e) => {
                    warn!("distance analysis abandoned: {e}");
                    return Err(e);
                }
            }
        };

        self.state.release_figure();
        let figure = self.renderer.render_distances(&histogram)?;
        self.state.hold_figure(PlotKind::DistanceHistogram, figure);
        self.phase = SessionState::PlotDisplayed(PlotKind::DistanceHistogram);
        Ok(histogram)
    }

    /// Leave the session, releasing the figure. Idempotent.
    pub fn quit(&mut self) {
        if self.phase != SessionState::Exited {
            info!("session closed");
        }
        self.state.release_figure();
        self.phase = SessionState::Exited;
    }
}

/// Empty input keeps `current`; anything else must be a finite number.
fn parse_bound(input: &str, current: f64) -> Result<f64> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(current);
    }
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InvalidFilter(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_parsing() {
        assert_eq!(parse_bound("  ", 3.0).unwrap(), 3.0);
        assert_eq!(parse_bound(" 2.5 ", 3.0).unwrap(), 2.5);
        assert_eq!(parse_bound("1e2", 3.0).unwrap(), 100.0);
        assert!(matches!(parse_bound("abc", 3.0), Err(Error::InvalidFilter(s)) if s == "abc"));
        assert!(matches!(parse_bound("nan", 3.0), Err(Error::InvalidFilter(_))));
        assert!(matches!(parse_bound("inf", 3.0), Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn states_describe_themselves() {
        assert_eq!(SessionState::MenuIdle.to_string(), "at the menu");
        assert_eq!(
            SessionState::PlotDisplayed(PlotKind::PhaseSpace).to_string(),
            "displaying Phase Space"
        );
    }
}
