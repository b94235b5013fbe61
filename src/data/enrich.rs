use super::model::{Particle, RawParticle};
use super::species::SpeciesClassifier;

/// Joules per keV.
pub const KEV_TO_J: f64 = 1.602176634e-16;
/// Joules per MeV.
pub const MEV_TO_J: f64 = 1.602176634e-13;

/// Added to the radius before projecting onto r̂ so a particle at the origin
/// yields a (meaningless but finite) radial velocity instead of NaN.
pub const RADIAL_EPSILON: f64 = 1e-20;

/// Derive speed, radius, energies, radial velocity and species for one row.
///
/// Pure: the result depends only on `raw` and the classifier's rule table.
pub fn enrich(raw: &RawParticle, classifier: &SpeciesClassifier) -> Particle {
    let speed = (raw.vx * raw.vx + raw.vy * raw.vy + raw.vz * raw.vz).sqrt();
    let radius = (raw.x * raw.x + raw.y * raw.y + raw.z * raw.z).sqrt();
    let energy_j = 0.5 * raw.mass * speed * speed;
    let radial_velocity =
        (raw.x * raw.vx + raw.y * raw.vy + raw.z * raw.vz) / (radius + RADIAL_EPSILON);

    Particle {
        raw: *raw,
        speed,
        radius,
        energy_j,
        energy_kev: energy_j / KEV_TO_J,
        energy_mev: energy_j / MEV_TO_J,
        radial_velocity,
        species: classifier.classify(raw.mass, raw.charge),
    }
}
