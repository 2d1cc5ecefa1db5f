//! Terminal progress display for replication runs
//!
//! Bars and log lines share stderr. Log output goes through
//! [`ProgressTerminal`], which hides any visible bar while a line is written
//! so the two never overdraw each other.

use crate::io::configuration::{PROGRESS_BAR_WIDTH, PROGRESS_SCALE};
use crate::replication::executor::ProgressSink;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::LazyLock;
use tracing_subscriber::fmt::MakeWriter;

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{percent:>3}}% {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Shared stderr surface for progress bars and log lines
#[derive(Debug, Clone, Default)]
pub struct ProgressTerminal {
    bars: MultiProgress,
}

impl ProgressTerminal {
    /// Create a terminal with no bars
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visible bar drawn below any log output
    pub fn bar(&self) -> ProgressManager {
        let bar = self.bars.add(ProgressBar::new(PROGRESS_SCALE));
        bar.set_style(PROGRESS_STYLE.clone());
        ProgressManager { bar }
    }
}

/// Writer handed out per log event
pub struct TerminalWriter<'a> {
    bars: &'a MultiProgress,
}

impl Write for TerminalWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bars.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.bars.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for ProgressTerminal {
    type Writer = TerminalWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        TerminalWriter { bars: &self.bars }
    }
}

/// Bar position for `percent`, clamped to the bar's range
pub fn bar_position(percent: f64) -> u64 {
    (percent.clamp(0.0, 100.0) / 100.0 * PROGRESS_SCALE as f64).round() as u64
}

/// Percent-complete bar driven by executor progress reports
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a bar that never draws
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Move the bar to `percent` and show `message`
    pub fn update(&self, percent: f64, message: &str) {
        self.bar.set_position(bar_position(percent));
        self.bar.set_message(message.to_string());
    }

    /// Remove the bar from the terminal
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressManager {
    fn report(&mut self, percent: f64, message: &str) {
        self.update(percent, message);
    }
}
