//! Crawl progress reporting
//!
//! Dots are repos, commas are users, `X` is a failure. Aggregate lines are
//! emitted from round summaries, never from inside workers.

use crate::crawler::{CrawlMode, RoundTally};
use crate::state::NodeKind;
use std::io::Write;

pub const FAILURE_SYMBOL: char = 'X';

pub fn success_symbol(kind: NodeKind) -> char {
    match kind {
        NodeKind::Repo => '.',
        NodeKind::User => ',',
    }
}

/// Writes one progress symbol to stdout without a newline
pub fn emit_symbol(symbol: char) {
    write_progress(&symbol.to_string());
}

/// Ends the current row of progress symbols
pub fn end_symbol_line() {
    write_progress("\n");
}

// Progress output is best effort; a closed stdout must not stop the crawl
fn write_progress(text: &str) {
    let _ = write_progress_to(&mut std::io::stdout().lock(), text);
}

fn write_progress_to(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Running totals per mode with a fixed logging cadence
#[derive(Debug, Clone)]
pub struct ProgressLog {
    frequency: u64,
    stars: RoundTally,
    gazers: RoundTally,
}

impl ProgressLog {
    pub fn new(frequency: u64) -> Self {
        Self {
            frequency: frequency.max(1),
            stars: RoundTally::default(),
            gazers: RoundTally::default(),
        }
    }

    /// Adds a round's tally; logs when the processed total crosses a multiple
    /// of the frequency
    ///
    /// Returns true if a line was logged.
    pub fn record(&mut self, mode: CrawlMode, tally: &RoundTally) -> bool {
        let frequency = self.frequency;
        let totals = self.totals_mut(mode);
        let before = totals.processed() / frequency;
        totals.absorb(tally);
        let after = totals.processed() / frequency;

        if after > before {
            let totals = *totals;
            tracing::info!(
                "{}: {} success, {} fail, {} discovered, {} costars",
                mode,
                totals.succeeded,
                totals.failed,
                totals.discovered,
                totals.costars
            );
            true
        } else {
            false
        }
    }

    pub fn totals(&self, mode: CrawlMode) -> RoundTally {
        match mode {
            CrawlMode::Stars => self.stars,
            CrawlMode::Gazers => self.gazers,
        }
    }

    fn totals_mut(&mut self, mode: CrawlMode) -> &mut RoundTally {
        match mode {
            CrawlMode::Stars => &mut self.stars,
            CrawlMode::Gazers => &mut self.gazers,
        }
    }
}
