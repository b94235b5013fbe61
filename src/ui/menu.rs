use crate::render::PlotKind;

// ---------------------------------------------------------------------------
// Menu choices
// ---------------------------------------------------------------------------

/// One line of menu input, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Plot(PlotKind),
    Statistics,
    FilterSettings,
    Save,
    Quit,
    Unknown(String),
}

impl MenuChoice {
    /// Case-insensitive; surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Self {
        let choice = input.trim().to_ascii_lowercase();
        match choice.as_str() {
            "1" => MenuChoice::Plot(PlotKind::Comprehensive),
            "2" => MenuChoice::Plot(PlotKind::PhaseSpace),
            "3" => MenuChoice::Plot(PlotKind::Positions3d),
            "4" => MenuChoice::Plot(PlotKind::EnergyVsRadius),
            "5" => MenuChoice::Statistics,
            "6" => MenuChoice::FilterSettings,
            "7" => MenuChoice::Plot(PlotKind::DistanceHistogram),
            "s" => MenuChoice::Save,
            "q" => MenuChoice::Quit,
            _ => MenuChoice::Unknown(choice),
        }
    }
}
