use std::io::{self, Write};

use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Gauge};
use ratatui::{DefaultTerminal, TerminalOptions, Viewport};
use sg_core::traits::ProgressSink;

/// Temps restant sur une seule ligne de stderr, réécrite chaque seconde.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, seconds_remaining: u32) -> anyhow::Result<()> {
        let mut err = io::stderr().lock();
        write!(err, "\rTemps restant : {seconds_remaining:>3} s ")?;
        if seconds_remaining == 1 {
            writeln!(err)?;
        }
        err.flush()?;
        Ok(())
    }
}

/// Barre de progression ratatui dans un viewport inline de 3 lignes.
///
/// Le terminal est restauré au `Drop`.
pub struct GaugeProgress {
    terminal: DefaultTerminal,
    total: u32,
}

impl GaugeProgress {
    /// Prépare la barre pour un enregistrement de `total` secondes.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be initialised.
    pub fn new(total: u32) -> anyhow::Result<Self> {
        let terminal = ratatui::try_init_with_options(TerminalOptions {
            viewport: Viewport::Inline(3),
        })?;
        // Le mode raw avale Ctrl-C ; le viewport inline n'en a plus besoin.
        ratatui::crossterm::terminal::disable_raw_mode()?;
        Ok(Self {
            terminal,
            total: total.max(1),
        })
    }
}

impl ProgressSink for GaugeProgress {
    fn report(&mut self, seconds_remaining: u32) -> anyhow::Result<()> {
        let elapsed = self.total.saturating_sub(seconds_remaining);
        let ratio = (f64::from(elapsed) / f64::from(self.total)).clamp(0.0, 1.0);
        self.terminal.draw(|frame| {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Enregistrement "),
                )
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(ratio)
                .label(format!("Temps restant : {seconds_remaining} s"));
            frame.render_widget(gauge, frame.area());
        })?;
        Ok(())
    }
}

impl Drop for GaugeProgress {
    fn drop(&mut self) {
        ratatui::restore();
    }
}
