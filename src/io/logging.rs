//! Structured log output for the command-line tool

use crate::io::configuration::{DEFAULT_LOG_FILTER, QUIET_LOG_FILTER, VERBOSE_LOG_FILTER};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Log level requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Run milestones plus warnings
    #[default]
    Normal,
    /// Per-replica detail
    Verbose,
}

impl Verbosity {
    /// Pick a verbosity from the `--quiet` and `--verbose` flags
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset
    pub const fn default_filter(self) -> &'static str {
        match self {
            Self::Quiet => QUIET_LOG_FILTER,
            Self::Normal => DEFAULT_LOG_FILTER,
            Self::Verbose => VERBOSE_LOG_FILTER,
        }
    }
}

/// Build the filter: `RUST_LOG` when set, otherwise the verbosity default
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()))
}

/// Install the global subscriber writing through `writer`
///
/// The binary passes its [`ProgressTerminal`](crate::io::progress::ProgressTerminal)
/// so log lines and the progress bar share stderr cleanly. Returns `false` if
/// a subscriber was already installed.
pub fn init<W>(verbosity: Verbosity, writer: W) -> bool
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(writer)
        .with_target(false)
        .try_init()
        .is_ok()
}
