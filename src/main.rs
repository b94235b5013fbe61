use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};

use fusor_explorer::analysis::pairwise::{InterruptSignal, PairwiseDistanceAnalyzer};
use fusor_explorer::analysis::stats::Statistics;
use fusor_explorer::app::ConsoleApp;
use fusor_explorer::batch::run_batch_with;
use fusor_explorer::config::ExplorerConfig;
use fusor_explorer::data::filter::DatasetView;
use fusor_explorer::data::model::Dataset;
use fusor_explorer::data::species::SpeciesClassifier;
use fusor_explorer::render::{PlotKind, PngPersister, RasterRenderer};
use fusor_explorer::session::ExplorationSession;
use fusor_explorer::ui::panels;

/// Exit status after an unarmed Ctrl-C.
const SIGINT_EXIT: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlotArg {
    Comprehensive,
    Phase,
    #[value(name = "3d")]
    ThreeD,
    Energy,
    All,
}

impl PlotArg {
    fn kinds(self) -> Vec<PlotKind> {
        match self {
            PlotArg::Comprehensive => vec![PlotKind::Comprehensive],
            PlotArg::Phase => vec![PlotKind::PhaseSpace],
            PlotArg::ThreeD => vec![PlotKind::Positions3d],
            PlotArg::Energy => vec![PlotKind::EnergyVsRadius],
            PlotArg::All => PlotKind::SELECTABLE.to_vec(),
        }
    }
}

/// Explore fusor particle snapshots interactively, or render figures in batch.
#[derive(Parser, Debug)]
#[command(name = "fusor-explorer", version, about)]
struct Cli {
    /// Particle file (.csv, .json or .parquet)
    #[arg(short, long, default_value = "fusion_particles.csv")]
    input: PathBuf,

    /// Base name for batch figures
    #[arg(short, long, default_value = "fusion_analysis")]
    output: String,

    /// Plots to generate in batch mode [default: comprehensive]
    #[arg(short, long, value_enum, num_args = 1..)]
    plot: Vec<PlotArg>,

    /// Generate every plot (batch mode)
    #[arg(short, long)]
    all: bool,

    /// Save figures without opening the interactive menu
    #[arg(short, long)]
    save: bool,

    /// Export statistics to this file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Include the pairwise distance histogram in batch mode
    #[arg(long)]
    distances: bool,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Histogram bins for the distance analysis
    #[arg(long)]
    bins: Option<usize>,
}

impl Cli {
    fn batch_kinds(&self) -> Vec<PlotKind> {
        let mut kinds = if self.all {
            PlotArg::All.kinds()
        } else {
            self.plot.iter().flat_map(|p| p.kinds()).collect()
        };
        if kinds.is_empty() {
            kinds.push(PlotKind::Comprehensive);
        }
        if self.distances {
            kinds.push(PlotKind::DistanceHistogram);
        }
        kinds
    }

    fn is_batch(&self) -> bool {
        self.save || self.all || !self.plot.is_empty() || self.distances || self.export.is_some()
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ExplorerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bins) = cli.bins {
        config.analysis.histogram_bins = bins;
        config.validate().context("--bins")?;
    }

    let dataset = Dataset::load(&cli.input, &SpeciesClassifier::default())
        .with_context(|| format!("loading {}", cli.input.display()))?;

    let signal = InterruptSignal::new();
    let handler_signal = signal.clone();
    ctrlc::set_handler(move || {
        if !handler_signal.trigger() {
            std::process::exit(SIGINT_EXIT);
        }
    })
    .context("installing Ctrl-C handler")?;

    let mut renderer = RasterRenderer::new(config.render.clone());

    if cli.is_batch() {
        match Statistics::compute(&DatasetView::all(&dataset)) {
            Ok(stats) => panels::statistics(&mut io::stdout().lock(), &stats)?,
            Err(e) => warn!("no statistics to print: {e}"),
        }
        let kinds = cli.batch_kinds();
        let analyzer = PairwiseDistanceAnalyzer::new(
            config.analysis.histogram_bins,
            config.analysis.block_size,
        );
        let report = run_batch_with(
            &dataset,
            &kinds,
            &cli.output,
            cli.export.as_deref(),
            &mut renderer,
            &PngPersister,
            &analyzer,
            &signal,
        )?;
        for (kind, path) in &report.figures {
            println!("Saved {kind}: {}", path.display());
        }
        if let Some(path) = &report.statistics {
            println!("Statistics exported to {}", path.display());
        }
        println!("\nBatch export complete.");
        return Ok(());
    }

    let session = ExplorationSession::new(dataset, renderer, PngPersister, &config).with_signal(signal);
    let stdin = io::stdin();
    let mut app = ConsoleApp::new(session, stdin.lock(), io::stdout());
    app.run()?;
    info!("bye");
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_select_batch_kinds() {
        let cli = Cli::parse_from(["fusor-explorer", "-p", "3d", "--distances"]);
        assert!(cli.is_batch());
        assert_eq!(
            cli.batch_kinds(),
            vec![PlotKind::Positions3d, PlotKind::DistanceHistogram]
        );

        let cli = Cli::parse_from(["fusor-explorer", "--all", "-i", "x.parquet"]);
        assert_eq!(cli.batch_kinds(), PlotKind::SELECTABLE.to_vec());
        assert_eq!(cli.input, PathBuf::from("x.parquet"));

        let cli = Cli::parse_from(["fusor-explorer"]);
        assert!(!cli.is_batch());
        assert_eq!(cli.output, "fusion_analysis");
    }

    #[test]
    fn save_alone_defaults_to_comprehensive() {
        let cli = Cli::parse_from(["fusor-explorer", "--save"]);
        assert!(cli.is_batch());
        assert_eq!(cli.batch_kinds(), vec![PlotKind::Comprehensive]);

        let cli = Cli::parse_from(["fusor-explorer", "-s", "--distances"]);
        assert_eq!(
            cli.batch_kinds(),
            vec![PlotKind::Comprehensive, PlotKind::DistanceHistogram]
        );
    }

    #[test]
    fn plot_takes_several_values() {
        let cli = Cli::parse_from(["fusor-explorer", "--save", "--plot", "phase", "3d"]);
        assert_eq!(
            cli.batch_kinds(),
            vec![PlotKind::PhaseSpace, PlotKind::Positions3d]
        );

        let cli = Cli::parse_from(["fusor-explorer", "-p", "energy", "all", "-o", "run7"]);
        assert_eq!(cli.batch_kinds()[0], PlotKind::EnergyVsRadius);
        assert_eq!(cli.batch_kinds().len(), 5);
        assert_eq!(cli.output, "run7");
    }
}
