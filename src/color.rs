use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

use crate::data::model::Species;

// ---------------------------------------------------------------------------
// Colour conversion
// ---------------------------------------------------------------------------

fn hsl_to_rgb(hsl: Hsl) -> RGBColor {
    let rgb: Srgb = hsl.into_color();
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Species colours
// ---------------------------------------------------------------------------

/// Fixed marker colour for a species.
pub fn species_color(species: Species) -> RGBColor {
    match species {
        Species::Deuterium => RGBColor(0x1f, 0x77, 0xb4),
        Species::Tritium => RGBColor(0x2c, 0xa0, 0x2c),
        Species::Neutron => RGBColor(0x7f, 0x7f, 0x7f),
        Species::Proton => RGBColor(0xd6, 0x27, 0x28),
        Species::Helium3 => RGBColor(0xff, 0x7f, 0x0e),
        Species::Helium4 => RGBColor(0x94, 0x67, 0xbd),
        Species::Unknown => RGBColor(0x33, 0x33, 0x33),
    }
}

// ---------------------------------------------------------------------------
// Scalar colour map: value → colour
// ---------------------------------------------------------------------------

/// Maps a scalar range onto a purple → red → yellow hue ramp.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    min: f64,
    max: f64,
}

impl Gradient {
    /// Build a gradient spanning the finite values of `values`.
    pub fn spanning<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min.is_finite() {
            Gradient { min, max }
        } else {
            Gradient { min: 0.0, max: 1.0 }
        }
    }

    /// Non-finite values get the low end of the ramp.
    pub fn color_for(&self, value: f64) -> RGBColor {
        let span = self.max - self.min;
        let t = if span > 0.0 && value.is_finite() {
            ((value - self.min) / span).clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        let hue = (270.0 + t * 150.0) % 360.0;
        hsl_to_rgb(Hsl::new(hue, 0.85, 0.30 + 0.30 * t))
    }
}
