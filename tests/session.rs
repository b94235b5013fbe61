use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fusor_explorer::analysis::pairwise::{DistanceHistogram, InterruptSignal};
use fusor_explorer::config::ExplorerConfig;
use fusor_explorer::data::filter::DatasetView;
use fusor_explorer::data::model::{Dataset, RawParticle};
use fusor_explorer::data::species::SpeciesClassifier;
use fusor_explorer::render::{Persister, PlotKind, RenderParams, Renderer};
use fusor_explorer::session::{ExplorationSession, SessionState};
use fusor_explorer::{Error, Result};

// ---------------------------------------------------------------------------
// Test collaborators
// ---------------------------------------------------------------------------

/// Figure that keeps a shared token alive, so live figures can be counted.
#[derive(Debug)]
struct Figure {
    kind: PlotKind,
    particles: usize,
    _token: Rc<()>,
}

struct CountingRenderer {
    token: Rc<()>,
    /// When set, the next render fails.
    fail: Rc<Cell<bool>>,
}

impl CountingRenderer {
    fn check(&self) -> Result<()> {
        if self.fail.replace(false) {
            return Err(Error::Plot("backend unavailable".to_string()));
        }
        Ok(())
    }
}

impl Renderer for CountingRenderer {
    type Figure = Figure;

    fn render(&mut self, view: &DatasetView<'_>, kind: PlotKind, _: &RenderParams) -> Result<Figure> {
        self.check()?;
        Ok(Figure {
            kind,
            particles: view.len(),
            _token: self.token.clone(),
        })
    }

    fn render_distances(&mut self, h: &DistanceHistogram) -> Result<Figure> {
        self.check()?;
        Ok(Figure {
            kind: PlotKind::DistanceHistogram,
            particles: h.total() as usize,
            _token: self.token.clone(),
        })
    }
}

#[derive(Clone, Default)]
struct RecordingPersister {
    saved: Rc<RefCell<Vec<(PathBuf, PlotKind, usize)>>>,
}

impl Persister<Figure> for RecordingPersister {
    fn persist(&self, figure: &Figure, path: &Path) -> Result<()> {
        self.saved
            .borrow_mut()
            .push((path.to_path_buf(), figure.kind, figure.particles));
        Ok(())
    }
}

struct Harness {
    session: ExplorationSession<CountingRenderer, RecordingPersister>,
    token: Rc<()>,
    fail: Rc<Cell<bool>>,
    saved: Rc<RefCell<Vec<(PathBuf, PlotKind, usize)>>>,
}

impl Harness {
    /// Figures currently alive (the renderer and the harness hold one token each).
    fn live_figures(&self) -> usize {
        Rc::strong_count(&self.token) - 2
    }
}

/// Deuterons at rest spread along x, with energies 0..n keV set via vx.
fn harness_with(n: usize, config: ExplorerConfig) -> Harness {
    let mass = 3.343583719e-27;
    let raw: Vec<RawParticle> = (0..n)
        .map(|i| {
            // E = 0.5 m v^2 = i keV
            let v = (2.0 * i as f64 * 1.602176634e-16 / mass).sqrt();
            RawParticle {
                vx: v,
                ..RawParticle::at_rest([i as f64 * 0.001, (i % 7) as f64 * 0.001, 0.0], mass, 1.6e-19)
            }
        })
        .collect();
    let dataset = Dataset::from_raw(&raw, &SpeciesClassifier::default());

    let token = Rc::new(());
    let fail = Rc::new(Cell::new(false));
    let persister = RecordingPersister::default();
    let saved = persister.saved.clone();
    let renderer = CountingRenderer {
        token: token.clone(),
        fail: fail.clone(),
    };
    Harness {
        session: ExplorationSession::new(dataset, renderer, persister, &config),
        token,
        fail,
        saved,
    }
}

fn harness(n: usize) -> Harness {
    harness_with(n, ExplorerConfig::default())
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn save_without_figure_is_rejected_and_stays_idle() {
    let mut h = harness(5);
    let err = h.session.save(None).unwrap_err();
    assert!(matches!(err, Error::NoActiveFigure));
    assert_eq!(h.session.state(), SessionState::MenuIdle);
    assert!(h.saved.borrow().is_empty());
}

#[test]
fn at_most_one_figure_is_alive() {
    let mut h = harness(10);
    assert_eq!(h.live_figures(), 0);

    for kind in PlotKind::SELECTABLE {
        h.session.select(kind).unwrap();
        assert_eq!(h.session.state(), SessionState::PlotDisplayed(kind));
        assert_eq!(h.live_figures(), 1);
        h.session.acknowledge().unwrap();
        assert_eq!(h.live_figures(), 1);
    }

    h.session.quit();
    assert_eq!(h.session.state(), SessionState::Exited);
    assert_eq!(h.live_figures(), 0);
}

#[test]
fn dropping_the_session_releases_the_figure() {
    let h = harness(3);
    let Harness {
        mut session, token, ..
    } = h;
    session.select(PlotKind::Comprehensive).unwrap();
    assert_eq!(Rc::strong_count(&token), 3);
    drop(session);
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn save_requires_acknowledge_then_uses_default_name() {
    let dir = PathBuf::from("figures");
    let config = ExplorerConfig {
        output_dir: dir.clone(),
        ..Default::default()
    };
    let mut h = harness_with(4, config);
    h.session.select(PlotKind::PhaseSpace).unwrap();

    let err = h.session.save(None).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            operation: "save",
            state: SessionState::PlotDisplayed(PlotKind::PhaseSpace)
        }
    ));

    h.session.acknowledge().unwrap();
    let path = h.session.save(None).unwrap();
    assert_eq!(path, dir.join("fusion_phase_space.png"));

    let path = h.session.save(Some("  run7 ")).unwrap();
    assert_eq!(path, dir.join("run7.png"));

    let saved = h.saved.borrow();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].1, PlotKind::PhaseSpace);
}

#[test]
fn acknowledge_at_menu_is_rejected() {
    let mut h = harness(2);
    assert!(matches!(
        h.session.acknowledge(),
        Err(Error::InvalidTransition {
            operation: "acknowledge",
            state: SessionState::MenuIdle
        })
    ));
}

#[test]
fn configure_keeps_bounds_ordered_and_inside_the_dataset() {
    let mut h = harness(11);
    let ceiling = h.session.dataset().max_energy_kev();
    assert!((ceiling - 10.0).abs() < 1e-6);

    for (min, max) in [("-5", "3"), ("7", "2"), ("4", "1000"), ("", ""), ("20", "30")] {
        let b = h.session.configure(min, max).unwrap();
        assert!(0.0 <= b.min_kev, "{min}/{max}: {b:?}");
        assert!(b.min_kev <= b.max_kev, "{min}/{max}: {b:?}");
        assert!(b.max_kev <= ceiling, "{min}/{max}: {b:?}");
    }

    let b = h.session.configure("2.5", "6.5").unwrap();
    assert_eq!(h.session.view().len(), 4); // 3, 4, 5, 6 keV
    assert_eq!(h.session.bounds(), b);
}

#[test]
fn invalid_filter_input_changes_nothing() {
    let mut h = harness(11);
    let before = h.session.configure("2", "8").unwrap();

    assert!(matches!(h.session.configure("abc", "5"), Err(Error::InvalidFilter(_))));
    assert!(matches!(h.session.configure("1", "inf"), Err(Error::InvalidFilter(_))));
    assert_eq!(h.session.bounds(), before);
    assert_eq!(h.session.state(), SessionState::MenuIdle);
}

#[test]
fn plots_use_the_filtered_view() {
    let mut h = harness(11);
    h.session.configure("4.5", "").unwrap();
    h.session.select(PlotKind::EnergyVsRadius).unwrap();
    h.session.acknowledge().unwrap();
    h.session.save(Some("filtered")).unwrap();
    assert_eq!(h.saved.borrow()[0].2, 6);
}

#[test]
fn statistics_follow_the_filter() {
    let mut h = harness(11);
    assert_eq!(h.session.statistics().unwrap().count, 11);
    h.session.configure("9.5", "").unwrap();
    assert_eq!(h.session.statistics().unwrap().count, 1);
}

#[test]
fn distance_analysis_displays_histogram() {
    let mut h = harness(20);
    let histogram = h.session.analyze_distances(&mut |_: u64, _: u64| {}).unwrap();
    assert_eq!(histogram.total(), 190);
    assert_eq!(
        h.session.state(),
        SessionState::PlotDisplayed(PlotKind::DistanceHistogram)
    );
    assert_eq!(h.live_figures(), 1);
    assert!(!h.session.signal().is_armed());
}

#[test]
fn interrupt_at_forty_percent_keeps_previous_figure() {
    let mut config = ExplorerConfig::default();
    config.analysis.block_size = 100;
    let signal = InterruptSignal::new();
    let mut h = harness_with(100, config);
    h.session = h.session.with_signal(signal.clone());

    h.session.select(PlotKind::Comprehensive).unwrap();
    h.session.acknowledge().unwrap();

    let mut seen = Vec::new();
    let err = h
        .session
        .analyze_distances(&mut |done: u64, total: u64| {
            seen.push(done);
            if done * 10 >= total * 4 {
                assert!(signal.trigger());
            }
        })
        .unwrap_err();

    match err {
        Error::Interrupted { processed, total } => {
            assert_eq!(total, 4950);
            assert_eq!(processed, 2000);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(seen.iter().all(|&d| d <= 2000));
    assert_eq!(h.session.state(), SessionState::MenuIdle);
    assert!(h.session.has_figure());
    assert_eq!(h.session.exploration().current_plot(), PlotKind::Comprehensive);
    assert_eq!(h.live_figures(), 1);
    assert!(!signal.is_armed());
    assert!(!signal.is_cancelled());
}

#[test]
fn nothing_is_allowed_after_quit() {
    let mut h = harness(3);
    h.session.quit();
    h.session.quit();
    assert_eq!(h.session.state(), SessionState::Exited);

    assert!(matches!(
        h.session.select(PlotKind::PhaseSpace),
        Err(Error::InvalidTransition {
            state: SessionState::Exited,
            ..
        })
    ));
    assert!(matches!(
        h.session.configure("1", "2"),
        Err(Error::InvalidTransition { .. })
    ));
    assert!(matches!(h.session.save(None), Err(Error::InvalidTransition { .. })));
    assert!(matches!(h.session.statistics(), Err(Error::InvalidTransition { .. })));
}

#[test]
fn render_failure_releases_the_previous_figure() {
    let mut h = harness(6);
    h.session.select(PlotKind::PhaseSpace).unwrap();
    h.session.acknowledge().unwrap();
    assert_eq!(h.live_figures(), 1);

    h.fail.set(true);
    assert!(matches!(h.session.select(PlotKind::Positions3d), Err(Error::Plot(_))));
    assert_eq!(h.session.state(), SessionState::MenuIdle);
    assert_eq!(h.live_figures(), 0);
    assert!(!h.session.has_figure());
    assert!(matches!(h.session.save(None), Err(Error::NoActiveFigure)));

    h.session.select(PlotKind::Positions3d).unwrap();
    assert_eq!(h.live_figures(), 1);
}
