use super::model::Species;

/// Absolute charge tolerance (C) used by the default rule table.
pub const CHARGE_TOLERANCE: f64 = 1e-20;

const ELEMENTARY: f64 = 1.6e-19;

/// One classification rule: a closed mass interval plus an expected charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesRule {
    pub mass_min: f64,
    pub mass_max: f64,
    pub charge: f64,
    pub charge_tolerance: f64,
    pub species: Species,
}

impl SpeciesRule {
    pub const fn new(mass_min: f64, mass_max: f64, charge: f64, species: Species) -> Self {
        SpeciesRule {
            mass_min,
            mass_max,
            charge,
            charge_tolerance: CHARGE_TOLERANCE,
            species,
        }
    }

    pub fn matches(&self, mass: f64, charge: f64) -> bool {
        self.mass_min <= mass
            && mass <= self.mass_max
            && (charge - self.charge).abs() < self.charge_tolerance
    }
}

/// Default rules in priority order. Tritium and He-3 share a mass window and
/// neutron and proton share another; charge separates them, and where both
/// would match the earlier entry wins.
pub const DEFAULT_RULES: [SpeciesRule; 6] = [
    SpeciesRule::new(3.3e-27, 3.4e-27, ELEMENTARY, Species::Deuterium),
    SpeciesRule::new(5.0e-27, 5.1e-27, ELEMENTARY, Species::Tritium),
    SpeciesRule::new(1.67e-27, 1.68e-27, 0.0, Species::Neutron),
    SpeciesRule::new(1.67e-27, 1.68e-27, ELEMENTARY, Species::Proton),
    SpeciesRule::new(5.0e-27, 5.1e-27, 2.0 * ELEMENTARY, Species::Helium3),
    SpeciesRule::new(6.6e-27, 6.7e-27, 2.0 * ELEMENTARY, Species::Helium4),
];

/// Ordered, first-match-wins species classifier.
#[derive(Debug, Clone)]
pub struct SpeciesClassifier {
    rules: Vec<SpeciesRule>,
}

impl Default for SpeciesClassifier {
    fn default() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }
}

impl SpeciesClassifier {
    /// Build a classifier from rules given in priority order.
    pub fn with_rules(rules: Vec<SpeciesRule>) -> Self {
        SpeciesClassifier { rules }
    }

    pub fn rules(&self) -> &[SpeciesRule] {
        &self.rules
    }

    /// Tag of the first matching rule, or [`Species::Unknown`].
    pub fn classify(&self, mass: f64, charge: f64) -> Species {
        self.rules
            .iter()
            .find(|rule| rule.matches(mass, charge))
            .map(|rule| rule.species)
            .unwrap_or(Species::Unknown)
    }
}
