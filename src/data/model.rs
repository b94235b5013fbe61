use std::fmt;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::enrich::enrich;
use super::loader::load_file;
use super::species::SpeciesClassifier;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Species – classification tag
// ---------------------------------------------------------------------------

/// Particle species recognised by the classifier.
///
/// Variant order is the declaration order of the default rule table and is
/// also the order used for per-species statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Deuterium,
    Tritium,
    Neutron,
    Proton,
    Helium3,
    Helium4,
    Unknown,
}

impl Species {
    pub const ALL: [Species; 7] = [
        Species::Deuterium,
        Species::Tritium,
        Species::Neutron,
        Species::Proton,
        Species::Helium3,
        Species::Helium4,
        Species::Unknown,
    ];

    /// Human-readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Species::Deuterium => "Deuterium",
            Species::Tritium => "Tritium",
            Species::Neutron => "Neutron",
            Species::Proton => "Proton",
            Species::Helium3 => "He-3",
            Species::Helium4 => "He-4",
            Species::Unknown => "Unknown",
        }
    }

    /// Lower-case identifier, stable across releases.
    pub fn slug(self) -> &'static str {
        match self {
            Species::Deuterium => "deuterium",
            Species::Tritium => "tritium",
            Species::Neutron => "neutron",
            Species::Proton => "proton",
            Species::Helium3 => "he3",
            Species::Helium4 => "he4",
            Species::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// ---------------------------------------------------------------------------
// RawParticle – one row of the source table
// ---------------------------------------------------------------------------

/// Kinematic record exactly as read from the input (SI units).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawParticle {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub mass: f64,
    pub charge: f64,
}

impl RawParticle {
    /// Particle at rest at the given position.
    pub fn at_rest(position: [f64; 3], mass: f64, charge: f64) -> Self {
        RawParticle {
            x: position[0],
            y: position[1],
            z: position[2],
            mass,
            charge,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Particle – enriched record
// ---------------------------------------------------------------------------

/// A raw record together with every derived quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub raw: RawParticle,
    /// |v| in m/s.
    pub speed: f64,
    /// |r| in m.
    pub radius: f64,
    pub energy_j: f64,
    pub energy_kev: f64,
    pub energy_mev: f64,
    /// v·r̂ in m/s; negative means moving inward.
    pub radial_velocity: f64,
    pub species: Species,
}

impl Particle {
    pub fn position(&self) -> [f64; 3] {
        [self.raw.x, self.raw.y, self.raw.z]
    }

    pub fn velocity(&self) -> [f64; 3] {
        [self.raw.vx, self.raw.vy, self.raw.vz]
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sample
// ---------------------------------------------------------------------------

/// The enriched particle sample. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    particles: Vec<Particle>,
}

impl Dataset {
    /// Enrich and classify raw rows, preserving their order.
    pub fn from_raw(raw: &[RawParticle], classifier: &SpeciesClassifier) -> Self {
        let particles = raw.iter().map(|r| enrich(r, classifier)).collect();
        Dataset { particles }
    }

    /// Load a file and run the enrichment pipeline over it.
    pub fn load(path: &Path, classifier: &SpeciesClassifier) -> Result<Self> {
        let raw = load_file(path)?;
        let dataset = Self::from_raw(&raw, classifier);
        info!("loaded {} particles from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Largest finite kinetic energy in keV, or `0` when there is none.
    pub fn max_energy_kev(&self) -> f64 {
        self.particles
            .iter()
            .map(|p| p.energy_kev)
            .filter(|e| e.is_finite())
            .fold(0.0, f64::max)
    }

    /// Smallest finite kinetic energy in keV, or `0` when there is none.
    pub fn min_energy_kev(&self) -> f64 {
        let min = self
            .particles
            .iter()
            .map(|p| p.energy_kev)
            .filter(|e| e.is_finite())
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            min
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving(vx: f64) -> RawParticle {
        RawParticle {
            vx,
            mass: 3.343583719e-27,
            charge: 1.6e-19,
            ..Default::default()
        }
    }

    #[test]
    fn energy_range_ignores_non_finite_values() {
        let classifier = SpeciesClassifier::default();
        let mut raw = vec![moving(1.0e6), moving(2.0e6)];
        raw.push(RawParticle {
            vx: f64::NAN,
            ..moving(0.0)
        });
        let ds = Dataset::from_raw(&raw, &classifier);

        assert_eq!(ds.len(), 3);
        assert!(ds.max_energy_kev() > ds.min_energy_kev());
        assert!(ds.max_energy_kev().is_finite());
    }

    #[test]
    fn empty_dataset_has_zero_energy_range() {
        let ds = Dataset::default();
        assert!(ds.is_empty());
        assert_eq!(ds.max_energy_kev(), 0.0);
        assert_eq!(ds.min_energy_kev(), 0.0);
    }

    #[test]
    fn species_order_follows_rule_declaration() {
        assert!(Species::Deuterium < Species::Tritium);
        assert!(Species::Helium4 < Species::Unknown);
        assert_eq!(Species::Helium3.to_string(), "he3");
        assert_eq!(Species::Helium4.label(), "He-4");
    }
}
