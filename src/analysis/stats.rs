use std::collections::BTreeMap;
use std::fmt;

use crate::data::filter::DatasetView;
use crate::data::model::Species;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// StatValue – one scalar in a statistics snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Count(usize),
    Float(f64),
}

impl fmt::Display for StatValue {
    /// Counts print as integers, floats in `1.2346e+03` notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(n) => write!(f, "{n}"),
            StatValue::Float(v) => f.write_str(&format_scientific(*v)),
        }
    }
}

/// Four decimals of mantissa, signed exponent with at least two digits.
pub fn format_scientific(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let text = format!("{value:.4e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Statistics – snapshot over one filtered view
// ---------------------------------------------------------------------------

/// Count and mean energy of one species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesSummary {
    pub count: usize,
    pub mean_energy_kev: f64,
}

/// Aggregate statistics. Speeds are in m/s and radii in m.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub count: usize,
    pub mean_energy_kev: f64,
    pub max_energy_kev: f64,
    pub min_energy_kev: f64,
    /// Sample standard deviation; zero for a single particle.
    pub std_energy_kev: f64,
    pub mean_speed: f64,
    pub max_speed: f64,
    pub mean_radius: f64,
    pub max_radius: f64,
    pub inward: usize,
    pub outward: usize,
    /// Only species with at least one particle appear.
    pub species: BTreeMap<Species, SpeciesSummary>,
}

impl Statistics {
    /// Recompute every aggregate over `view`.
    pub fn compute(view: &DatasetView<'_>) -> Result<Self> {
        if view.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let n = view.len() as f64;

        let mut sum_energy = 0.0;
        let mut max_energy = f64::NEG_INFINITY;
        let mut min_energy = f64::INFINITY;
        let mut sum_speed = 0.0;
        let mut max_speed = f64::NEG_INFINITY;
        let mut sum_radius = 0.0;
        let mut max_radius = f64::NEG_INFINITY;
        let mut inward = 0;
        let mut species_sums: BTreeMap<Species, (usize, f64)> = BTreeMap::new();

        for p in view.iter() {
            sum_energy += p.energy_kev;
            max_energy = max_energy.max(p.energy_kev);
            min_energy = min_energy.min(p.energy_kev);
            sum_speed += p.speed;
            max_speed = max_speed.max(p.speed);
            sum_radius += p.radius;
            max_radius = max_radius.max(p.radius);
            if p.radial_velocity < 0.0 {
                inward += 1;
            }
            let entry = species_sums.entry(p.species).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += p.energy_kev;
        }

        let mean_energy = sum_energy / n;
        let std_energy = if view.len() > 1 {
            let ss: f64 = view
                .iter()
                .map(|p| (p.energy_kev - mean_energy).powi(2))
                .sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        let species = species_sums
            .into_iter()
            .map(|(s, (count, sum))| {
                (
                    s,
                    SpeciesSummary {
                        count,
                        mean_energy_kev: sum / count as f64,
                    },
                )
            })
            .collect();

        Ok(Statistics {
            count: view.len(),
            mean_energy_kev: mean_energy,
            max_energy_kev: max_energy,
            min_energy_kev: min_energy,
            std_energy_kev: std_energy,
            mean_speed: sum_speed / n,
            max_speed,
            mean_radius: sum_radius / n,
            max_radius,
            inward,
            outward: view.len() - inward,
            species,
        })
    }

    /// Named entries in report order, speeds in km/s and radii in cm.
    pub fn entries(&self) -> Vec<(String, StatValue)> {
        let mut entries = vec![
            ("Total particles".to_string(), StatValue::Count(self.count)),
            ("Mean energy (keV)".to_string(), StatValue::Float(self.mean_energy_kev)),
            ("Max energy (keV)".to_string(), StatValue::Float(self.max_energy_kev)),
            ("Min energy (keV)".to_string(), StatValue::Float(self.min_energy_kev)),
            ("Std energy (keV)".to_string(), StatValue::Float(self.std_energy_kev)),
            ("Mean speed (km/s)".to_string(), StatValue::Float(self.mean_speed / 1000.0)),
            ("Max speed (km/s)".to_string(), StatValue::Float(self.max_speed / 1000.0)),
            ("Mean radius (cm)".to_string(), StatValue::Float(self.mean_radius * 100.0)),
            ("Max radius (cm)".to_string(), StatValue::Float(self.max_radius * 100.0)),
            ("Inward moving".to_string(), StatValue::Count(self.inward)),
            ("Outward moving".to_string(), StatValue::Count(self.outward)),
        ];
        for (species, summary) in &self.species {
            entries.push((
                format!("{} count", species.label()),
                StatValue::Count(summary.count),
            ));
            entries.push((
                format!("{} mean energy (keV)", species.label()),
                StatValue::Float(summary.mean_energy_kev),
            ));
        }
        entries
    }
}
