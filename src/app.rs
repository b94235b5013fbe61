use std::io::{BufRead, Write};

use log::debug;

use crate::analysis::pairwise::{BarProgress, PairwiseDistanceAnalyzer};
use crate::error::{Error, Result};
use crate::render::{Persister, PlotKind, Renderer};
use crate::session::{ExplorationSession, SessionState};
use crate::ui::menu::MenuChoice;
use crate::ui::panels;

// ---------------------------------------------------------------------------
// Console front end
// ---------------------------------------------------------------------------

/// Line-oriented menu loop over an [`ExplorationSession`].
///
/// Reads commands from `input` and writes prompts and results to `output`.
/// End of input quits the session.
pub struct ConsoleApp<R: Renderer, P, I, O> {
    session: ExplorationSession<R, P>,
    input: I,
    output: O,
}

impl<R, P, I, O> ConsoleApp<R, P, I, O>
where
    R: Renderer,
    P: Persister<R::Figure>,
    I: BufRead,
    O: Write,
{
    pub fn new(session: ExplorationSession<R, P>, input: I, output: O) -> Self {
        ConsoleApp {
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &ExplorationSession<R, P> {
        &self.session
    }

    pub fn into_parts(self) -> (ExplorationSession<R, P>, O) {
        (self.session, self.output)
    }

    /// Run until the user quits or input ends.
    ///
    /// Every command failure, including a failed save, is printed and the
    /// loop continues. Only failures to read or write the console itself are
    /// returned.
    pub fn run(&mut self) -> Result<()> {
        while self.session.state() != SessionState::Exited {
            panels::menu(&mut self.output, &self.session.summary(), &self.session.bounds())?;
            let Some(line) = self.prompt("Select option: ")? else {
                writeln!(self.output)?;
                self.session.quit();
                break;
            };

            let choice = MenuChoice::parse(&line);
            debug!("menu choice: {choice:?}");
            if let Err(e) = self.dispatch(choice) {
                writeln!(self.output, "Error: {e}")?;
            }
        }
        writeln!(self.output, "Goodbye!")?;
        self.output.flush()?;
        Ok(())
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::Plot(PlotKind::DistanceHistogram) => self.distances(),
            MenuChoice::Plot(kind) => {
                writeln!(self.output, "\nGenerating {kind}...")?;
                self.session.select(kind)?;
                writeln!(
                    self.output,
                    "{kind} ready ({} particles). Use [s] to save it.",
                    self.session.view().len()
                )?;
                self.pause()
            }
            MenuChoice::Statistics => {
                let stats = self.session.statistics()?;
                panels::statistics(&mut self.output, &stats)?;
                Ok(())
            }
            MenuChoice::FilterSettings => self.filter_settings(),
            MenuChoice::Save => {
                if !self.session.has_figure() {
                    return Err(Error::NoActiveFigure);
                }
                let Some(name) =
                    self.prompt("Filename (without extension, blank for default): ")?
                else {
                    writeln!(self.output, "\nSave cancelled.")?;
                    return Ok(());
                };
                let path = self.session.save(Some(&name))?;
                writeln!(self.output, "Saved: {}", path.display())?;
                Ok(())
            }
            MenuChoice::Quit => {
                self.session.quit();
                Ok(())
            }
            MenuChoice::Unknown(input) => Err(Error::UnknownCommand(input)),
        }
    }

    fn filter_settings(&mut self) -> Result<()> {
        let summary = self.session.summary();
        let bounds = self.session.bounds();
        writeln!(
            self.output,
            "\nEnergy range: {:.2} - {:.2} keV",
            summary.min_energy_kev, summary.max_energy_kev
        )?;
        writeln!(
            self.output,
            "Current filter: {:.2} - {:.2} keV",
            bounds.min_kev, bounds.max_kev
        )?;
        let min = self.prompt("Min energy (keV), blank to keep: ")?.unwrap_or_default();
        let max = self.prompt("Max energy (keV), blank to keep: ")?.unwrap_or_default();
        let bounds = self.session.configure(&min, &max)?;
        writeln!(
            self.output,
            "Filter set: {:.2} - {:.2} keV ({} particles)",
            bounds.min_kev,
            bounds.max_kev,
            self.session.view().len()
        )?;
        Ok(())
    }

    fn distances(&mut self) -> Result<()> {
        let pairs = PairwiseDistanceAnalyzer::pair_count(self.session.view().len());
        writeln!(
            self.output,
            "\nComputing {pairs} pair distances (Ctrl-C to abort)..."
        )?;
        let mut bar = BarProgress::new(pairs);
        let histogram = self.session.analyze_distances(&mut bar)?;
        drop(bar);
        panels::distances(&mut self.output, &histogram)?;
        self.pause()
    }

    /// Wait for Enter, then return to the menu.
    fn pause(&mut self) -> Result<()> {
        self.prompt("Press Enter to continue...")?;
        self.session.acknowledge()
    }

    /// `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
