//! CLI entry point for label-driven dataset replication

use clap::Parser;
use labeldup::io::cli::{Cli, Runner};
use labeldup::io::logging::{self, Verbosity};
use labeldup::io::progress::ProgressTerminal;

fn main() -> labeldup::Result<()> {
    let cli = Cli::parse();
    let terminal = ProgressTerminal::new();
    logging::init(Verbosity::from_flags(cli.quiet, cli.verbose), terminal.clone());
    Runner::new(cli, terminal).run()
}
