//! Command-line interface: catalog listing, preview and replication runs

use crate::corpus::catalog::LabelCatalog;
use crate::corpus::scanner::CorpusScanner;
use crate::io::configuration::DEFAULT_MULTIPLIER;
use crate::io::error::{ReplicationError, Result};
use crate::io::progress::{ProgressManager, ProgressTerminal};
use crate::io::worker::ReplicationWorker;
use crate::replication::executor::ReplicationJob;
use crate::replication::multiplier::{CopyMultiplierMap, LabelSelection};
use crate::replication::preview::preview;
use crate::replication::sequence::StartSequence;
use crate::replication::settings::ReplicationSettings;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "labeldup")]
#[command(
    author,
    version,
    about = "Replicate image and annotation pairs by label to rebalance a dataset"
)]
/// Command-line arguments for the replication tool
pub struct Cli {
    /// Only log warnings and errors, and hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log every replica written
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered by the tool
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every label in a corpus with its instance count
    Labels {
        /// Directory tree of annotation and image pairs
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current and projected label totals without writing anything
    Preview {
        /// Directory tree of annotation and image pairs
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Labels and multipliers
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replicate matched pairs into a target directory
    Copy {
        /// Directory tree of annotation and image pairs
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Directory receiving the replicas, created if absent
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Labels and multipliers
        #[command(flatten)]
        selection: SelectionArgs,

        /// First number of the reported sequence, or `auto` to continue after
        /// the highest `<name>_<n>.json` already in TARGET
        #[arg(short, long, default_value = "auto")]
        start_seq: StartSequence,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Label selection and multiplier arguments shared by `preview` and `copy`
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Label to replicate; repeat or separate with commas
    #[arg(short, long = "label", value_name = "LABEL", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Copies per matched file when no override applies
    #[arg(short, long, default_value_t = DEFAULT_MULTIPLIER)]
    pub copies: usize,

    /// Per-label copy count, as LABEL=N; repeatable
    #[arg(short, long = "multiplier", value_name = "LABEL=N", value_parser = parse_override)]
    pub multipliers: Vec<(String, usize)>,

    /// Decode each companion image before counting or copying it
    #[arg(long)]
    pub verify_images: bool,
}

impl SelectionArgs {
    /// Validate the selection without touching the filesystem
    ///
    /// # Errors
    ///
    /// Returns a config error for an empty selection or a multiplier below 1
    pub fn validate(&self) -> Result<(LabelSelection, CopyMultiplierMap)> {
        let selection = LabelSelection::new(self.labels.iter().map(|l| l.trim().to_string()))?;
        let mut multipliers = CopyMultiplierMap::with_default(self.copies)?;
        for (label, copies) in &self.multipliers {
            multipliers.set(label, *copies)?;
        }
        Ok((selection, multipliers))
    }
}

fn parse_override(s: &str) -> std::result::Result<(String, usize), String> {
    let (label, copies) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected LABEL=N, got '{s}'"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("missing label in '{s}'"));
    }
    let copies = copies
        .trim()
        .parse::<usize>()
        .map_err(|error| format!("invalid copy count in '{s}': {error}"))?;
    Ok((label.to_string(), copies))
}

/// Runs the parsed command
pub struct Runner {
    cli: Cli,
    terminal: ProgressTerminal,
}

impl Runner {
    /// Create a runner drawing progress on `terminal`
    pub const fn new(cli: Cli, terminal: ProgressTerminal) -> Self {
        Self { cli, terminal }
    }

    /// Execute the selected command
    ///
    /// # Errors
    ///
    /// Returns config errors before any I/O, and errors that prevent a run
    /// from starting; per-file failures are only logged
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Command::Labels { root, json } => Self::list_labels(root, *json),
            Command::Preview {
                root,
                selection,
                json,
            } => Self::preview(root, selection, *json),
            Command::Copy {
                root,
                target,
                selection,
                start_seq,
                json,
            } => self.copy(root, target, selection, *start_seq, *json),
        }
    }

    fn list_labels(root: &Path, json: bool) -> Result<()> {
        let scanner = CorpusScanner::new(root)?;
        let catalog = LabelCatalog::from_scanner(&scanner);
        emit(&catalog, json)
    }

    fn preview(root: &Path, args: &SelectionArgs, json: bool) -> Result<()> {
        let (scanner, settings) = configure(root, args)?;
        let report = preview(&scanner, &settings);
        emit(&report, json)
    }

    fn copy(
        &self,
        root: &Path,
        target: &Path,
        args: &SelectionArgs,
        start: StartSequence,
        json: bool,
    ) -> Result<()> {
        let (scanner, settings) = configure(root, args)?;

        info!(
            root = %root.display(),
            target = %target.display(),
            labels = %settings.selection.iter().collect::<Vec<_>>().join(", "),
            default_multiplier = settings.multipliers.default_multiplier().get(),
            start_sequence = %start,
            "copy requested"
        );
        for (label, copies) in settings.multipliers.overrides() {
            if settings.selection.contains(label) {
                info!(label, copies = copies.get(), "multiplier override");
            }
        }

        let job = ReplicationJob {
            target_dir: target.to_path_buf(),
            settings,
            start,
        };
        let worker = ReplicationWorker::spawn(scanner, job)?;

        let token = worker.cancel_token();
        if let Err(error) = ctrlc::set_handler(move || token.cancel()) {
            warn!(error = %error, "Ctrl-C will not cancel this run");
        }

        let mut progress = if self.cli.quiet {
            ProgressManager::hidden()
        } else {
            self.terminal.bar()
        };
        let result = worker.wait(&mut progress);
        progress.clear();

        emit(&result?, json)
    }
}

/// Scan `root`, check the selection against its catalog and build settings
///
/// # Errors
///
/// Returns config errors (checked before scanning) and
/// [`ReplicationError::UnknownLabel`] for labels absent from the corpus
pub fn configure(
    root: &Path,
    args: &SelectionArgs,
) -> Result<(CorpusScanner, ReplicationSettings)> {
    let (selection, multipliers) = args.validate()?;
    let scanner = CorpusScanner::new(root)?;

    let mut catalog = LabelCatalog::from_scanner(&scanner);
    catalog.select(selection.iter())?;
    catalog.replace_multipliers(multipliers);

    let settings =
        ReplicationSettings::from_catalog(&catalog)?.with_image_verification(args.verify_images);
    Ok((scanner, settings))
}

// Allow print for the command's primary output
#[allow(clippy::print_stdout)]
fn emit<T>(report: &T, json: bool) -> Result<()>
where
    T: Serialize + std::fmt::Display,
{
    if json {
        let rendered = serde_json::to_string_pretty(report)
            .map_err(|source| ReplicationError::Report { source })?;
        println!("{rendered}");
    } else {
        println!("{report}");
    }
    Ok(())
}
