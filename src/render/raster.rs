use std::ops::Range;
use std::path::Path;

use image::{ImageFormat, RgbImage};
use log::{debug, info};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::{Persister, PlotKind, RenderConfig, RenderParams, Renderer};
use crate::analysis::pairwise::DistanceHistogram;
use crate::color::{species_color, Gradient};
use crate::data::filter::DatasetView;
use crate::data::model::{Particle, Species};
use crate::error::{Error, Result};

const CM: f64 = 100.0;
const KM: f64 = 1000.0;
const FONT: &str = "sans-serif";

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Chart2d<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

// ---------------------------------------------------------------------------
// RasterFigure
// ---------------------------------------------------------------------------

/// A rendered figure held in memory until saved or dropped.
#[derive(Debug, Clone)]
pub struct RasterFigure {
    pub kind: PlotKind,
    /// Number of particles (or pairs, for distance histograms) drawn.
    pub samples: u64,
    pub image: RgbImage,
}

// ---------------------------------------------------------------------------
// RasterRenderer
// ---------------------------------------------------------------------------

/// Draws `plotters` charts into an in-memory RGB buffer.
#[derive(Debug, Clone, Default)]
pub struct RasterRenderer {
    config: RenderConfig,
}

impl RasterRenderer {
    pub fn new(config: RenderConfig) -> Self {
        RasterRenderer { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Run `paint` against a fresh background and hand back the pixels.
    fn draw<F>(&self, paint: F) -> Result<RgbImage>
    where
        F: FnOnce(&Area<'_>) -> Result<()>,
    {
        let (w, h) = (self.config.width, self.config.height);
        let mut buf = vec![0u8; w as usize * h as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            let [r, g, b] = self.config.background;
            root.fill(&RGBColor(r, g, b))?;
            paint(&root)?;
            root.present()?;
        }
        RgbImage::from_raw(w, h, buf)
            .ok_or_else(|| Error::Plot(format!("pixel buffer does not match {w}x{h}")))
    }

    fn axis(&self) -> RGBColor {
        let [r, g, b] = self.config.axis_color;
        RGBColor(r, g, b)
    }

    fn marker(&self) -> i32 {
        self.config.marker_radius as i32 + 1
    }

    /// Cartesian chart with caption, mesh and axis labels, sized to its area.
    fn chart<'a, 'b>(
        &self,
        area: &'a Area<'b>,
        caption: &str,
        x: Range<f64>,
        y: Range<f64>,
        (x_desc, y_desc): (&str, &str),
    ) -> Result<Chart2d<'a, 'b>> {
        let (w, h) = area.dim_in_pixel();
        let font = (h / 18).clamp(10, 24);
        let mut chart = ChartBuilder::on(area)
            .caption(caption, (FONT, font))
            .margin(8)
            .x_label_area_size((h / 8).clamp(16, 40))
            .y_label_area_size((w / 7).clamp(24, 60))
            .build_cartesian_2d(x, y)?;
        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .axis_style(self.axis())
            .label_style((FONT, (font * 3 / 4).max(8)))
            .x_labels(6)
            .y_labels(6)
            .draw()?;
        Ok(chart)
    }

    /// Vertical reference lines at the grid radii.
    fn grid_lines(&self, chart: &mut Chart2d<'_, '_>, y: &Range<f64>) -> Result<()> {
        for (i, r) in self.config.grid_radii.iter().enumerate() {
            let x = r * CM;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x, y.start), (x, y.end)],
                    grid_color(i).mix(0.7),
                )))?
                .label(format!("grid r = {:.1} cm", x))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], grid_color(i)));
        }
        Ok(())
    }

    fn legend<'a, 'b: 'a>(&self, chart: &mut Chart2d<'a, 'b>) -> Result<()> {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(self.axis())
            .label_font((FONT, 11))
            .draw()?;
        Ok(())
    }

    fn comprehensive(&self, view: &DatasetView<'_>, root: &Area<'_>) -> Result<()> {
        let (_, h) = root.dim_in_pixel();
        let root = root.titled(
            &format!("Comprehensive Analysis ({} particles)", view.len()),
            (FONT, (h / 30).clamp(12, 32)),
        )?;
        let panels = root.split_evenly((2, 3));
        let particles: Vec<&Particle> = view.iter().collect();
        let present: Vec<Species> = Species::ALL
            .into_iter()
            .filter(|s| particles.iter().any(|p| p.species == *s))
            .collect();
        let max_energy = particles.iter().map(|p| p.energy_kev).fold(0.0, nan_max);
        let max_radius_cm = particles.iter().map(|p| p.radius * CM).fold(0.0, nan_max);
        let energy_range = upper_range(max_energy);
        let bins = 50;

        // Energy distribution by species, log-scaled counts.
        let per_species: Vec<(Species, Vec<u64>)> = present
            .iter()
            .map(|&s| {
                let values = particles.iter().filter(|p| p.species == s).map(|p| p.energy_kev);
                (s, histogram(values, bins, &energy_range))
            })
            .collect();
        let peak = per_species
            .iter()
            .flat_map(|(_, c)| c.iter())
            .map(|&c| log_count(c))
            .fold(1.0, f64::max);
        let mut chart = self.chart(
            &panels[0],
            "Energy Distribution by Species",
            energy_range.clone(),
            0.0..peak * 1.1,
            ("Energy (keV)", "log10(count + 1)"),
        )?;
        for (species, counts) in &per_species {
            let color = species_color(*species);
            chart
                .draw_series(bars(counts, &energy_range, color, log_count))?
                .label(species.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 10, y + 4)], color.filled()));
        }
        if !per_species.is_empty() {
            self.legend(&mut chart)?;
        }

        // Energy vs radial position.
        let radius_range = padded_range(particles.iter().map(|p| p.radius * CM));
        let mut chart = self.chart(
            &panels[1],
            "Energy vs Radial Position",
            radius_range,
            energy_range.clone(),
            ("Radius (cm)", "Energy (keV)"),
        )?;
        for &species in &present {
            let color = species_color(species);
            chart
                .draw_series(
                    particles
                        .iter()
                        .filter(|p| p.species == species)
                        .filter_map(|p| finite((p.radius * CM, p.energy_kev)))
                        .map(|pt| Circle::new(pt, self.marker(), color.mix(0.7).filled())),
                )?
                .label(species.label())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
        }
        self.grid_lines(&mut chart, &energy_range)?;
        self.legend(&mut chart)?;

        // Top-down positions with grid circles.
        let extent = self
            .config
            .grid_radii
            .iter()
            .fold(max_radius_cm, |a, r| a.max(r * CM))
            .max(f64::EPSILON)
            * 1.05;
        let mut chart = self.chart(
            &panels[2],
            "Top-down View (x-y)",
            -extent..extent,
            -extent..extent,
            ("x (cm)", "y (cm)"),
        )?;
        let energy = Gradient::spanning(particles.iter().map(|p| p.energy_kev));
        chart.draw_series(
            particles
                .iter()
                .filter_map(|p| finite((p.raw.x * CM, p.raw.y * CM)).map(|pt| (pt, p.energy_kev)))
                .map(|(pt, e)| Circle::new(pt, self.marker(), energy.color_for(e).filled())),
        )?;
        for (i, r) in self.config.grid_radii.iter().enumerate() {
            chart.draw_series(LineSeries::new(circle_points(r * CM), grid_color(i)))?;
        }

        // Radial velocity distribution.
        let vr_values = || particles.iter().map(|p| p.radial_velocity / KM);
        let vr_range = padded_range(vr_values());
        let counts = histogram(vr_values(), bins, &vr_range);
        let top = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
        let mut chart = self.chart(
            &panels[3],
            "Radial Velocity Distribution",
            vr_range.clone(),
            0.0..top * 1.1,
            ("Radial velocity (km/s)", "Count"),
        )?;
        chart.draw_series(bars(&counts, &vr_range, RGBColor(70, 130, 180), |c| c as f64))?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, 0.0), (0.0, top * 1.1)],
                RED.stroke_width(2),
            )))?
            .label("v_r = 0")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED));
        self.legend(&mut chart)?;

        // Mean energy vs radius.
        let shells = 30;
        let shell_range = upper_range(max_radius_cm);
        let mut sums = vec![(0.0, 0usize); shells];
        for p in &particles {
            if let Some(i) = bin_index(p.radius * CM, shells, &shell_range) {
                sums[i].0 += p.energy_kev;
                sums[i].1 += 1;
            }
        }
        let width = (shell_range.end - shell_range.start) / shells as f64;
        let profile: Vec<(f64, f64)> = sums
            .iter()
            .enumerate()
            .filter(|(_, &(_, n))| n > 0)
            .map(|(i, &(sum, n))| ((i as f64 + 0.5) * width, sum / n as f64))
            .collect();
        let profile_range = padded_range(profile.iter().map(|p| p.1));
        let mut chart = self.chart(
            &panels[4],
            "Average Energy vs Radius",
            shell_range,
            profile_range.clone(),
            ("Radius (cm)", "Mean energy (keV)"),
        )?;
        let green = RGBColor(0, 100, 0);
        chart.draw_series(LineSeries::new(profile.iter().copied(), green.stroke_width(2)))?;
        chart.draw_series(
            profile
                .iter()
                .map(|&pt| Circle::new(pt, self.marker() + 1, green.filled())),
        )?;
        self.grid_lines(&mut chart, &profile_range)?;
        self.legend(&mut chart)?;

        // Species shares.
        let total = particles.len().max(1) as f64;
        let mut chart = self.chart(
            &panels[5],
            "Particle Species Distribution",
            0.0..present.len().max(1) as f64,
            0.0..1.05,
            ("Species", "Fraction"),
        )?;
        for (i, &species) in present.iter().enumerate() {
            let share = particles.iter().filter(|p| p.species == species).count() as f64 / total;
            let color = species_color(species);
            let x = i as f64;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x + 0.15, 0.0), (x + 0.85, share)],
                    color.filled(),
                )))?
                .label(format!("{} ({:.1}%)", species.label(), share * 100.0))
                .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 10, y + 4)], color.filled()));
        }
        if !present.is_empty() {
            self.legend(&mut chart)?;
        }
        Ok(())
    }

    fn phase_space(&self, view: &DatasetView<'_>, root: &Area<'_>) -> Result<()> {
        let panels = root.split_evenly((1, 3));
        let energy = Gradient::spanning(view.iter().map(|p| p.energy_kev));
        for (axis_idx, name) in ["x", "y", "z"].into_iter().enumerate() {
            let position = |p: &Particle| p.position()[axis_idx] * CM;
            let velocity = |p: &Particle| p.velocity()[axis_idx] / KM;
            let x_range = padded_range(view.iter().map(position));
            let (x_desc, y_desc) = (format!("{name} (cm)"), format!("v{name} (km/s)"));
            let mut chart = self.chart(
                &panels[axis_idx],
                &format!("Phase Space: {name} vs v{name}"),
                x_range.clone(),
                padded_range(view.iter().map(velocity)),
                (x_desc.as_str(), y_desc.as_str()),
            )?;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x_range.start, 0.0), (x_range.end, 0.0)],
                BLACK.mix(0.3),
            )))?;
            chart.draw_series(view.iter().filter_map(|p| {
                finite((position(p), velocity(p)))
                    .map(|pt| Circle::new(pt, self.marker(), energy.color_for(p.energy_kev).filled()))
            }))?;
        }
        Ok(())
    }

    fn positions_3d(&self, view: &DatasetView<'_>, root: &Area<'_>) -> Result<()> {
        let extent = view
            .iter()
            .map(|p| p.radius * CM)
            .chain(self.config.grid_radii.iter().map(|r| r * CM))
            .fold(0.0, nan_max)
            .max(f64::EPSILON)
            * 1.05;
        let (_, h) = root.dim_in_pixel();
        // Chart axes are (x, z, y) so the data z axis is vertical.
        let mut chart = ChartBuilder::on(root)
            .caption(
                format!("3D Particle Distribution ({} particles)", view.len()),
                (FONT, (h / 24).clamp(12, 32)),
            )
            .margin(10)
            .build_cartesian_3d(-extent..extent, -extent..extent, -extent..extent)?;
        chart.with_projection(|mut pb| {
            pb.pitch = 0.5;
            pb.yaw = 0.7;
            pb.scale = 0.8;
            pb.into_matrix()
        });
        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.1))
            .max_light_lines(3)
            .draw()?;

        for (i, r) in self.config.grid_radii.iter().enumerate() {
            let ring = circle_points(r * CM).map(|(x, y)| (x, 0.0, y));
            chart.draw_series(LineSeries::new(ring, grid_color(i).mix(0.5)))?;
        }
        for species in Species::ALL {
            let color = species_color(species);
            let points: Vec<(f64, f64, f64)> = view
                .iter()
                .filter(|p| p.species == species)
                .map(|p| (p.raw.x * CM, p.raw.z * CM, p.raw.y * CM))
                .filter(|&(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite())
                .collect();
            if points.is_empty() {
                continue;
            }
            chart
                .draw_series(
                    points
                        .into_iter()
                        .map(|pt| Circle::new(pt, self.marker(), color.mix(0.7).filled())),
                )?
                .label(species.label())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
        }
        if !view.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(self.axis())
                .draw()?;
        }
        Ok(())
    }

    fn energy_vs_radius(
        &self,
        view: &DatasetView<'_>,
        params: &RenderParams,
        root: &Area<'_>,
    ) -> Result<()> {
        let bounds = params.bounds;
        let energy_range = if bounds.max_kev > bounds.min_kev {
            bounds.min_kev..bounds.max_kev
        } else {
            padded_range([bounds.min_kev, bounds.max_kev])
        };
        let mut chart = self.chart(
            root,
            &format!(
                "Energy vs Radius ({:.1} - {:.1} keV, {} particles)",
                bounds.min_kev,
                bounds.max_kev,
                view.len()
            ),
            padded_range(view.iter().map(|p| p.radius * CM)),
            energy_range.clone(),
            ("Radius (cm)", "Energy (keV)"),
        )?;
        let speed = Gradient::spanning(view.iter().map(|p| p.speed));
        chart.draw_series(view.iter().filter_map(|p| {
            finite((p.radius * CM, p.energy_kev))
                .map(|pt| Circle::new(pt, self.marker() + 1, speed.color_for(p.speed).filled()))
        }))?;
        self.grid_lines(&mut chart, &energy_range)?;
        self.legend(&mut chart)?;
        Ok(())
    }

    fn distances(&self, histogram: &DistanceHistogram, root: &Area<'_>) -> Result<()> {
        let (lo, hi) = histogram.range();
        let range = lo..hi;
        let top = histogram.counts().iter().copied().max().unwrap_or(0).max(1) as f64;
        let mut chart = self.chart(
            root,
            &format!("Distance between Particles ({} pairs)", histogram.total()),
            range.clone(),
            0.0..top * 1.1,
            ("Distance (m)", "Count"),
        )?;
        chart.draw_series(bars(histogram.counts(), &range, RGBColor(31, 119, 180), |c| {
            c as f64
        }))?;
        Ok(())
    }
}

impl Renderer for RasterRenderer {
    type Figure = RasterFigure;

    fn render(
        &mut self,
        view: &DatasetView<'_>,
        kind: PlotKind,
        params: &RenderParams,
    ) -> Result<RasterFigure> {
        debug!("rendering {kind} over {} particles", view.len());
        let image = match kind {
            PlotKind::Comprehensive => self.draw(|root| self.comprehensive(view, root))?,
            PlotKind::PhaseSpace => self.draw(|root| self.phase_space(view, root))?,
            PlotKind::Positions3d => self.draw(|root| self.positions_3d(view, root))?,
            PlotKind::EnergyVsRadius => {
                self.draw(|root| self.energy_vs_radius(view, params, root))?
            }
            // The histogram itself comes from `render_distances`.
            PlotKind::DistanceHistogram => self.draw(|root| {
                self.distances(&DistanceHistogram::new(0.0, 1.0, 1), root)
            })?,
        };
        Ok(RasterFigure {
            kind,
            samples: view.len() as u64,
            image,
        })
    }

    fn render_distances(&mut self, histogram: &DistanceHistogram) -> Result<RasterFigure> {
        debug!("rendering distance histogram over {} pairs", histogram.total());
        let image = self.draw(|root| self.distances(histogram, root))?;
        Ok(RasterFigure {
            kind: PlotKind::DistanceHistogram,
            samples: histogram.total(),
            image,
        })
    }
}

// ---------------------------------------------------------------------------
// PNG persister
// ---------------------------------------------------------------------------

/// Writes figures as PNG files, creating parent directories as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngPersister;

impl Persister<RasterFigure> for PngPersister {
    fn persist(&self, figure: &RasterFigure, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        figure.image.save_with_format(path, ImageFormat::Png)?;
        info!("saved {} to {}", figure.kind, path.display());
        Ok(())
    }
}

// -- helpers --

fn nan_max(acc: f64, v: f64) -> f64 {
    if v.is_finite() {
        acc.max(v)
    } else {
        acc
    }
}

fn finite((x, y): (f64, f64)) -> Option<(f64, f64)> {
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

fn grid_color(i: usize) -> RGBColor {
    if i == 0 {
        RGBColor(220, 0, 0)
    } else {
        RGBColor(0, 0, 220)
    }
}

fn log_count(c: u64) -> f64 {
    ((c + 1) as f64).log10()
}

/// `0..max` with headroom; `0..1` when nothing positive was seen.
fn upper_range(max: f64) -> Range<f64> {
    if max > 0.0 {
        0.0..max * 1.05
    } else {
        0.0..1.0
    }
}

/// Finite extent of `values` with 5% padding, never empty.
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else if lo != 0.0 {
        lo.abs() * 0.05
    } else {
        0.5
    };
    (lo - pad)..(hi + pad)
}

fn circle_points(r: f64) -> impl Iterator<Item = (f64, f64)> {
    (0..=96).map(move |i| {
        let t = i as f64 / 96.0 * std::f64::consts::TAU;
        (r * t.cos(), r * t.sin())
    })
}

fn bin_index(value: f64, bins: usize, range: &Range<f64>) -> Option<usize> {
    if !value.is_finite() || value < range.start || value > range.end {
        return None;
    }
    if range.end <= range.start {
        return Some(0);
    }
    let t = (value - range.start) / (range.end - range.start);
    Some(((t * bins as f64) as usize).min(bins - 1))
}

fn histogram<I: IntoIterator<Item = f64>>(values: I, bins: usize, range: &Range<f64>) -> Vec<u64> {
    let mut counts = vec![0; bins];
    for v in values {
        if let Some(i) = bin_index(v, bins, range) {
            counts[i] += 1;
        }
    }
    counts
}

/// One filled rectangle per non-empty bin.
fn bars<'a>(
    counts: &'a [u64],
    range: &Range<f64>,
    color: RGBColor,
    scale: impl Fn(u64) -> f64 + 'a,
) -> impl Iterator<Item = Rectangle<(f64, f64)>> + 'a {
    let start = range.start;
    let width = (range.end - range.start) / counts.len().max(1) as f64;
    counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(move |(i, &c)| {
            let x0 = start + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, scale(c))], color.mix(0.6).filled())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::EnergyBounds;
    use crate::data::model::{Dataset, RawParticle};
    use crate::data::species::SpeciesClassifier;

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 480,
            height: 360,
            ..RenderConfig::default()
        }
    }

    fn dataset() -> Dataset {
        let raw: Vec<RawParticle> = (0..20)
            .map(|i| {
                let f = i as f64;
                RawParticle {
                    x: 0.004 * f.cos(),
                    y: 0.004 * f.sin(),
                    z: 0.001 * f,
                    vx: 1.0e5 * (f * 0.3).sin(),
                    vy: 2.0e4 * f,
                    vz: -3.0e4,
                    mass: if i % 2 == 0 { 3.343583719e-27 } else { 1.67262192369e-27 },
                    charge: 1.6e-19,
                }
            })
            .collect();
        Dataset::from_raw(&raw, &SpeciesClassifier::default())
    }

    /// Pixels that are neither background nor greyscale (axes, text).
    fn coloured_pixels(image: &RgbImage) -> usize {
        image
            .pixels()
            .filter(|p| !(p[0] == p[1] && p[1] == p[2]))
            .count()
    }

    #[test]
    fn every_plot_kind_renders_at_configured_size() {
        let ds = dataset();
        let view = DatasetView::all(&ds);
        let params = RenderParams {
            bounds: EnergyBounds::full(&ds),
        };
        let mut renderer = RasterRenderer::new(small_config());

        for kind in PlotKind::SELECTABLE {
            let fig = renderer.render(&view, kind, &params).unwrap();
            assert_eq!(fig.kind, kind);
            assert_eq!(fig.samples, 20);
            assert_eq!(fig.image.dimensions(), (480, 360));
            assert!(coloured_pixels(&fig.image) > 0, "{kind} drew no data marks");
        }
    }

    #[test]
    fn axes_and_labels_are_drawn() {
        let ds = dataset();
        let view = DatasetView::all(&ds);
        let params = RenderParams {
            bounds: EnergyBounds::full(&ds),
        };
        let fig = RasterRenderer::new(small_config())
            .render(&view, PlotKind::EnergyVsRadius, &params)
            .unwrap();
        // dark axis and text pixels, not only coloured markers
        let dark = fig
            .image
            .pixels()
            .filter(|p| p[0] < 90 && p[0] == p[1] && p[1] == p[2])
            .count();
        assert!(dark > 100, "only {dark} dark pixels");
    }

    #[test]
    fn empty_views_still_render() {
        let ds = Dataset::default();
        let view = DatasetView::all(&ds);
        let params = RenderParams {
            bounds: EnergyBounds::full(&ds),
        };
        let mut renderer = RasterRenderer::new(small_config());
        for kind in PlotKind::SELECTABLE {
            let fig = renderer.render(&view, kind, &params).unwrap();
            assert_eq!(fig.samples, 0);
        }
    }

    #[test]
    fn png_round_trips_through_disk() {
        let mut histogram = DistanceHistogram::new(0.0, 2.0, 8);
        for d in [0.1, 0.5, 0.5, 1.9] {
            histogram.add(d);
        }
        let fig = RasterRenderer::new(small_config())
            .render_distances(&histogram)
            .unwrap();
        assert_eq!(fig.samples, 4);
        assert!(coloured_pixels(&fig.image) > 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("distances.png");
        PngPersister.persist(&fig, &path).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.width(), 480);
    }

    #[test]
    fn histogram_helper_drops_out_of_range_values() {
        let counts = histogram([0.0, 0.5, 1.0, 2.0, f64::NAN], 2, &(0.0..1.0));
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn padded_range_is_never_empty() {
        assert_eq!(padded_range(Vec::<f64>::new()), 0.0..1.0);
        assert_eq!(padded_range([f64::NAN]), 0.0..1.0);
        assert_eq!(padded_range([0.0, 0.0]), -0.5..0.5);
        let r = padded_range([2.0, 4.0, f64::INFINITY]);
        assert!((r.start - 1.9).abs() < 1e-12 && (r.end - 4.1).abs() < 1e-12);
    }
}
