use super::model::{Dataset, Particle};

// ---------------------------------------------------------------------------
// Energy filter: inclusive keV window over one dataset
// ---------------------------------------------------------------------------

/// Inclusive kinetic-energy window in keV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBounds {
    pub min_kev: f64,
    pub max_kev: f64,
}

impl EnergyBounds {
    /// Window spanning `[0, dataset max]`, i.e. no filtering.
    pub fn full(dataset: &Dataset) -> Self {
        EnergyBounds {
            min_kev: 0.0,
            max_kev: dataset.max_energy_kev(),
        }
    }

    /// Clamp a requested window into `[0, ceiling]` with `min ≤ max`.
    ///
    /// The minimum is clamped first; the maximum is then raised to at least
    /// the clamped minimum.
    pub fn clamped(min_kev: f64, max_kev: f64, ceiling: f64) -> Self {
        let ceiling = ceiling.max(0.0);
        let min_kev = min_kev.min(ceiling).max(0.0);
        let max_kev = max_kev.min(ceiling).max(min_kev);
        EnergyBounds { min_kev, max_kev }
    }

    /// NaN energies never pass.
    pub fn contains(&self, energy_kev: f64) -> bool {
        self.min_kev <= energy_kev && energy_kev <= self.max_kev
    }
}

/// Read-only selection of rows from one [`Dataset`].
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> DatasetView<'a> {
    /// View over every row.
    pub fn all(dataset: &'a Dataset) -> Self {
        DatasetView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// View over the rows whose energy lies inside `bounds`.
    pub fn filtered(dataset: &'a Dataset, bounds: &EnergyBounds) -> Self {
        DatasetView {
            dataset,
            indices: filtered_indices(dataset, bounds),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate the selected particles in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Particle> + '_ {
        let particles = self.dataset.particles();
        self.indices.iter().map(move |&i| &particles[i])
    }
}

/// Return indices of particles whose energy lies inside `bounds`.
pub fn filtered_indices(dataset: &Dataset, bounds: &EnergyBounds) -> Vec<usize> {
    dataset
        .particles()
        .iter()
        .enumerate()
        .filter(|(_, p)| bounds.contains(p.energy_kev))
        .map(|(i, _)| i)
        .collect()
}
