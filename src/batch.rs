use std::path::{Path, PathBuf};

use log::info;

use crate::analysis::pairwise::{InterruptSignal, LogProgress, PairwiseDistanceAnalyzer};
use crate::analysis::stats::Statistics;
use crate::data::filter::{DatasetView, EnergyBounds};
use crate::data::model::Dataset;
use crate::error::Result;
use crate::render::{Persister, PlotKind, RenderParams, Renderer};
use crate::report::export_statistics;

// ---------------------------------------------------------------------------
// Non-interactive runs
// ---------------------------------------------------------------------------

/// What a batch run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub particles: usize,
    /// One entry per figure, in request order.
    pub figures: Vec<(PlotKind, PathBuf)>,
    pub statistics: Option<PathBuf>,
}

/// `<output_base>_<suffix>.png`
pub fn figure_path(output_base: &str, kind: PlotKind) -> PathBuf {
    PathBuf::from(format!("{output_base}_{}.png", kind.batch_suffix()))
}

/// Render every requested kind over the whole dataset and persist it, then
/// optionally export statistics. Uses the default distance analyzer.
pub fn run_batch<R, P>(
    dataset: &Dataset,
    kinds: &[PlotKind],
    output_base: &str,
    export_path: Option<&Path>,
    renderer: &mut R,
    persister: &P,
) -> Result<BatchReport>
where
    R: Renderer,
    P: Persister<R::Figure>,
{
    run_batch_with(
        dataset,
        kinds,
        output_base,
        export_path,
        renderer,
        persister,
        &PairwiseDistanceAnalyzer::default(),
        &InterruptSignal::new(),
    )
}

/// [`run_batch`] with an explicit analyzer and interrupt signal for
/// [`PlotKind::DistanceHistogram`].
///
/// Duplicate kinds are rendered once. The first failure aborts the run;
/// figures already written stay on disk.
#[allow(clippy::too_many_arguments)]
pub fn run_batch_with<R, P>(
    dataset: &Dataset,
    kinds: &[PlotKind],
    output_base: &str,
    export_path: Option<&Path>,
    renderer: &mut R,
    persister: &P,
    analyzer: &PairwiseDistanceAnalyzer,
    signal: &InterruptSignal,
) -> Result<BatchReport>
where
    R: Renderer,
    P: Persister<R::Figure>,
{
    let view = DatasetView::all(dataset);
    let params = RenderParams {
        bounds: EnergyBounds::full(dataset),
    };
    let mut report = BatchReport {
        particles: dataset.len(),
        ..Default::default()
    };

    let mut done: Vec<PlotKind> = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        if done.contains(&kind) {
            continue;
        }
        done.push(kind);

        let figure = if kind == PlotKind::DistanceHistogram {
            let histogram = {
                let _armed = signal.arm();
                analyzer.analyze(&view, signal, &mut LogProgress::default())?
            };
            renderer.render_distances(&histogram)?
        } else {
            renderer.render(&view, kind, &params)?
        };

        let path = figure_path(output_base, kind);
        persister.persist(&figure, &path)?;
        report.figures.push((kind, path));
    }

    if let Some(path) = export_path {
        let stats = Statistics::compute(&view)?;
        export_statistics(path, &stats)?;
        report.statistics = Some(path.to_path_buf());
    }

    info!(
        "batch finished: {} figure(s), statistics {}",
        report.figures.len(),
        if report.statistics.is_some() { "exported" } else { "skipped" }
    );
    Ok(report)
}
