use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::data::filter::DatasetView;
use crate::error::{Error, Result};

/// Default histogram resolution.
pub const DEFAULT_BINS: usize = 100;
/// Default number of pairs between two checkpoints.
pub const DEFAULT_BLOCK_SIZE: u64 = 1 << 20;

// ---------------------------------------------------------------------------
// Interrupt signal
// ---------------------------------------------------------------------------

/// Shared cancellation flag for the pairwise sweep.
///
/// A console signal handler holds a clone. While a sweep is running the
/// signal is *armed* and [`InterruptSignal::trigger`] requests cancellation;
/// when nothing is armed `trigger` returns `false` so the handler can fall
/// back to terminating the process.
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal {
    cancelled: Arc<AtomicBool>,
    armed: Arc<AtomicBool>,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation unconditionally.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Request cancellation if a sweep is armed. Returns whether it was.
    pub fn trigger(&self) -> bool {
        if self.armed.load(Ordering::SeqCst) {
            self.cancel();
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Clear any stale request and mark a sweep as running until the guard drops.
    pub fn arm(&self) -> ArmedGuard<'_> {
        self.cancelled.store(false, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
        ArmedGuard { signal: self }
    }
}

/// Disarms the signal on every exit path of a sweep.
pub struct ArmedGuard<'a> {
    signal: &'a InterruptSignal,
}

impl Drop for ArmedGuard<'_> {
    fn drop(&mut self) {
        self.signal.armed.store(false, Ordering::SeqCst);
        self.signal.cancelled.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Receives throttled progress from the sweep: once per block and once at the end.
pub trait ProgressSink {
    fn update(&mut self, processed: u64, total: u64);

    fn finish(&mut self) {}
}

impl<F: FnMut(u64, u64)> ProgressSink for F {
    fn update(&mut self, processed: u64, total: u64) {
        self(processed, total)
    }
}

/// Logs one line per whole ten percent.
#[derive(Debug, Default)]
pub struct LogProgress {
    last_decile: u64,
}

impl ProgressSink for LogProgress {
    fn update(&mut self, processed: u64, total: u64) {
        if total == 0 {
            return;
        }
        let decile = processed * 10 / total;
        if decile > self.last_decile {
            self.last_decile = decile;
            info!("pairwise distances: {}% ({processed}/{total} pairs)", decile * 10);
        }
    }
}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        BarProgress { bar }
    }
}

impl ProgressSink for BarProgress {
    fn update(&mut self, processed: u64, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(processed);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

// ---------------------------------------------------------------------------
// DistanceHistogram
// ---------------------------------------------------------------------------

/// Fixed-bin histogram of pair distances over `[lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceHistogram {
    lower: f64,
    upper: f64,
    counts: Vec<u64>,
    /// Pairs whose distance was NaN or infinite.
    rejected: u64,
}

impl DistanceHistogram {
    /// `bins` is raised to at least one; a degenerate range widens to `lower + 1`.
    pub fn new(lower: f64, upper: f64, bins: usize) -> Self {
        let upper = if upper > lower { upper } else { lower + 1.0 };
        DistanceHistogram {
            lower,
            upper,
            counts: vec![0; bins.max(1)],
            rejected: 0,
        }
    }

    /// Values outside the range land in the first or last bin.
    #[inline]
    pub fn add(&mut self, distance: f64) {
        if !distance.is_finite() {
            self.rejected += 1;
            return;
        }
        let bins = self.counts.len();
        let t = (distance - self.lower) / (self.upper - self.lower);
        let idx = ((t * bins as f64) as usize).min(bins - 1);
        self.counts[idx] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn range(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    /// `[start, end)` of bin `idx`.
    pub fn bin_edges(&self, idx: usize) -> (f64, f64) {
        let w = self.bin_width();
        (self.lower + idx as f64 * w, self.lower + (idx + 1) as f64 * w)
    }

    /// Samples held in bins.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Centre of the fullest bin, `None` when empty.
    pub fn mode(&self) -> Option<f64> {
        let (idx, &count) = self
            .counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
        if count == 0 {
            return None;
        }
        let (a, b) = self.bin_edges(idx);
        Some(0.5 * (a + b))
    }
}

// ---------------------------------------------------------------------------
// PairwiseDistanceAnalyzer
// ---------------------------------------------------------------------------

/// Streaming all-pairs distance sweep.
///
/// Time is O(n²), memory O(bins): each distance is binned as soon as it is
/// computed. Progress and cancellation are evaluated every `block_size`
/// pairs, never inside the inner loop.
#[derive(Debug, Clone, Copy)]
pub struct PairwiseDistanceAnalyzer {
    bins: usize,
    block_size: u64,
}

impl Default for PairwiseDistanceAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_BINS, DEFAULT_BLOCK_SIZE)
    }
}

impl PairwiseDistanceAnalyzer {
    pub fn new(bins: usize, block_size: u64) -> Self {
        PairwiseDistanceAnalyzer {
            bins: bins.max(1),
            block_size: block_size.max(1),
        }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Number of unordered pairs among `n` points.
    pub fn pair_count(n: usize) -> u64 {
        let n = n as u64;
        n * n.saturating_sub(1) / 2
    }

    /// Histogram every pair distance of the particles in `view`.
    ///
    /// Returns [`Error::Interrupted`] if `signal` is cancelled at a checkpoint;
    /// the partially filled histogram is dropped.
    pub fn analyze(
        &self,
        view: &DatasetView<'_>,
        signal: &InterruptSignal,
        progress: &mut dyn ProgressSink,
    ) -> Result<DistanceHistogram> {
        let particles = view.dataset().particles();
        let indices = view.indices();
        self.sweep(indices.len(), |k| particles[indices[k]].position(), signal, progress)
    }

    pub fn analyze_positions(
        &self,
        positions: &[[f64; 3]],
        signal: &InterruptSignal,
        progress: &mut dyn ProgressSink,
    ) -> Result<DistanceHistogram> {
        self.sweep(positions.len(), |k| positions[k], signal, progress)
    }

    /// Sweep the `n` points produced by `position`, read in place.
    fn sweep<F>(
        &self,
        n: usize,
        position: F,
        signal: &InterruptSignal,
        progress: &mut dyn ProgressSink,
    ) -> Result<DistanceHistogram>
    where
        F: Fn(usize) -> [f64; 3],
    {
        let total = Self::pair_count(n);

        // |a - b| <= |a| + |b| <= 2 max|r|
        let max_radius = (0..n)
            .map(&position)
            .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
            .filter(|r| r.is_finite())
            .fold(0.0, f64::max);
        let mut histogram = DistanceHistogram::new(0.0, 2.0 * max_radius, self.bins);
        debug!(
            "pairwise sweep: {n} points, {total} pairs, range [0, {:.4e}] m",
            2.0 * max_radius
        );

        let mut processed: u64 = 0;
        let mut pending: u64 = 0;
        for i in 0..n {
            let a = position(i);
            let mut j = i + 1;
            while j < n {
                let room = (self.block_size - pending) as usize;
                let end = n.min(j.saturating_add(room));
                for b in (j..end).map(&position) {
                    let dx = a[0] - b[0];
                    let dy = a[1] - b[1];
                    let dz = a[2] - b[2];
                    histogram.add((dx * dx + dy * dy + dz * dz).sqrt());
                }
                pending += (end - j) as u64;
                j = end;

                if pending == self.block_size {
                    processed += pending;
                    pending = 0;
                    progress.update(processed, total);
                    if signal.is_cancelled() {
                        info!("pairwise sweep interrupted at {processed}/{total} pairs");
                        return Err(Error::Interrupted { processed, total });
                    }
                }
            }
        }
        processed += pending;
        progress.update(processed, total);
        progress.finish();

        debug_assert_eq!(processed, total);
        debug_assert_eq!(histogram.total() + histogram.rejected(), total);
        Ok(histogram)
    }
}
