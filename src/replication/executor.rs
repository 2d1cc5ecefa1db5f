//! The write pass: replicates matched image and annotation pairs into a target directory
//!
//! Files are processed one at a time in scan order. Every file ends in a
//! [`FileOutcome`]; failures are logged and counted, never propagated past
//! the file they occurred in.

use crate::corpus::scanner::{AnnotationRecord, CorpusScanner};
use crate::io::annotation::AnnotationDocument;
use crate::io::configuration::{ANNOTATION_EXTENSION, REPLICA_SEPARATOR};
use crate::io::error::{ErrorCategory, ReplicationError, Result, WithPath};
use crate::replication::sequence::{SequenceCounter, StartSequence, allocate};
use crate::replication::settings::ReplicationSettings;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Shared flag requesting a cooperative stop
///
/// Checked once before each file, so a file that has started is always
/// replicated completely.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Receiver of per-file progress
pub trait ProgressSink {
    /// Called once per file with the percentage of files done and a status line
    fn report(&mut self, percent: f64, message: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(f64, &str),
{
    fn report(&mut self, percent: f64, message: &str) {
        self(percent, message);
    }
}

/// Progress sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: f64, _message: &str) {}
}

/// Where and how a replication run writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationJob {
    /// Directory receiving the replicas, created if absent
    pub target_dir: PathBuf,
    /// Selection, multipliers and companion checks
    pub settings: ReplicationSettings,
    /// Start of the reporting sequence
    pub start: StartSequence,
}

/// Result of replicating a single annotation file
#[derive(Debug)]
pub enum FileOutcome {
    /// No selected label in the file
    Excluded,
    /// Every replica was written
    Replicated {
        /// Pairs written
        copies: usize,
    },
    /// Nothing was written: annotation unreadable or companion image missing
    Skipped(ReplicationError),
    /// Replication started but stopped on an I/O or decode failure
    Failed {
        /// Pairs written before the failure
        copies: usize,
        /// What went wrong
        error: ReplicationError,
    },
}

impl FileOutcome {
    /// Pairs this file contributed to the target directory
    pub const fn copies(&self) -> usize {
        match self {
            Self::Replicated { copies } | Self::Failed { copies, .. } => *copies,
            Self::Excluded | Self::Skipped(_) => 0,
        }
    }

    /// Check whether the file resolved to a nonzero multiplier
    pub const fn is_matched(&self) -> bool {
        match self {
            Self::Replicated { .. } | Self::Failed { .. } => true,
            Self::Skipped(error) => matches!(error.category(), ErrorCategory::MissingCompanion),
            Self::Excluded => false,
        }
    }
}

/// Totals for one replication run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyResult {
    /// Directory the replicas were written to
    pub target_dir: PathBuf,
    /// Annotation files found by the scan
    pub files_scanned: usize,
    /// Files handled before the run ended, whatever their outcome
    pub files_processed: usize,
    /// Processed files with a nonzero multiplier
    pub files_matched: usize,
    /// Processed files skipped without writing anything
    pub files_skipped: usize,
    /// Processed files whose replication failed part way
    pub files_failed: usize,
    /// Image and annotation pairs written
    pub pairs_copied: usize,
    /// Pairs written over later in the run by a file with the same base name
    pub pairs_overwritten: usize,
    /// First sequence number of the run
    pub start_sequence: u64,
    /// Last sequence number issued
    pub final_sequence: u64,
    /// Whether the run stopped early on request
    pub cancelled: bool,
}

impl fmt::Display for CopyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            writeln!(
                f,
                "Cancelled after {} of {} files",
                self.files_processed, self.files_scanned
            )?;
        }
        writeln!(
            f,
            "Copied {} pairs from {} matched files ({} processed, {} skipped, {} failed)",
            self.pairs_copied,
            self.files_matched,
            self.files_processed,
            self.files_skipped,
            self.files_failed
        )?;
        if self.pairs_overwritten > 0 {
            writeln!(
                f,
                "Overwritten by files sharing a base name: {} pairs",
                self.pairs_overwritten
            )?;
        }
        writeln!(f, "Final sequence: {}", self.final_sequence)?;
        write!(f, "Target directory: {}", self.target_dir.display())
    }
}

/// Replicate every matched annotation under `scanner`'s root into `job.target_dir`
///
/// # Errors
///
/// Returns an error only when the run cannot start: the target directory
/// cannot be created or, with an automatic start sequence, listed. Per-file
/// problems are logged and counted in the returned [`CopyResult`].
pub fn execute(
    scanner: &CorpusScanner,
    job: &ReplicationJob,
    cancel: &CancelToken,
    progress: &mut impl ProgressSink,
) -> Result<CopyResult> {
    std::fs::create_dir_all(&job.target_dir)
        .with_path(&job.target_dir, "create target directory")?;

    let start_sequence = allocate(&job.target_dir, job.start)?;
    let mut counter = SequenceCounter::new(start_sequence);

    let paths: Vec<PathBuf> = scanner.annotation_paths().collect();
    let mut replicas_by_base: HashMap<String, usize> = HashMap::new();
    let total = paths.len();

    info!(
        root = %scanner.root().display(),
        target = %job.target_dir.display(),
        files = total,
        start_sequence,
        "starting replication"
    );

    let mut result = CopyResult {
        target_dir: job.target_dir.clone(),
        files_scanned: total,
        files_processed: 0,
        files_matched: 0,
        files_skipped: 0,
        files_failed: 0,
        pairs_copied: 0,
        pairs_overwritten: 0,
        start_sequence,
        final_sequence: counter.final_value(),
        cancelled: false,
    };

    for path in &paths {
        if cancel.is_cancelled() {
            info!(
                processed = result.files_processed,
                remaining = total - result.files_processed,
                "replication cancelled"
            );
            result.cancelled = true;
            break;
        }

        let outcome = replicate_file(path, job, &mut counter);
        result.files_processed += 1;
        result.pairs_copied += outcome.copies();
        result.pairs_overwritten += track_overwrites(&mut replicas_by_base, path, outcome.copies());
        if outcome.is_matched() {
            result.files_matched += 1;
        }

        let name = path.file_name().unwrap_or_default().to_string_lossy();
        let status = match &outcome {
            FileOutcome::Excluded => format!("Processed {}/{total} files", result.files_processed),
            FileOutcome::Replicated { copies } => {
                info!(path = %path.display(), copies, "replicated annotation");
                format!("Copied {name} ({copies} copies)")
            }
            FileOutcome::Skipped(error) => {
                result.files_skipped += 1;
                warn!(path = %path.display(), error = %error, "skipping annotation");
                format!("Skipped {name}")
            }
            FileOutcome::Failed { copies, error } => {
                result.files_failed += 1;
                warn!(
                    path = %path.display(),
                    copies,
                    error = %error,
                    "replication failed"
                );
                format!("Failed {name}")
            }
        };

        progress.report(
            result.files_processed as f64 / total as f64 * 100.0,
            &status,
        );
    }

    result.final_sequence = counter.final_value();

    info!(
        processed = result.files_processed,
        matched = result.files_matched,
        pairs = result.pairs_copied,
        overwritten = result.pairs_overwritten,
        skipped = result.files_skipped,
        failed = result.files_failed,
        final_sequence = result.final_sequence,
        "replication finished"
    );

    Ok(result)
}

/// Record `copies` replicas of `annotation`'s base name, returning how many of
/// them replaced replicas written earlier in the run
fn track_overwrites(
    replicas_by_base: &mut HashMap<String, usize>,
    annotation: &Path,
    copies: usize,
) -> usize {
    if copies == 0 {
        return 0;
    }
    let base_name = annotation
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let written = replicas_by_base.entry(base_name).or_insert(0);
    let overwritten = copies.min(*written);
    if overwritten > 0 {
        warn!(
            path = %annotation.display(),
            overwritten,
            "replicas overwrite those of an earlier file with the same base name"
        );
    }
    *written = (*written).max(copies);
    overwritten
}

/// Replicate one annotation and its companion image
pub fn replicate_file(
    annotation: &Path,
    job: &ReplicationJob,
    counter: &mut SequenceCounter,
) -> FileOutcome {
    let document = match AnnotationDocument::read(annotation) {
        Ok(document) => document,
        Err(error) => return FileOutcome::Skipped(error),
    };
    let record = AnnotationRecord::from_document(&document);

    let plan = job.settings.plan(&record);
    if plan.is_excluded() {
        return FileOutcome::Excluded;
    }

    let image = match job.settings.companion(annotation) {
        Ok(image) => image,
        Err(error) if error.category() == ErrorCategory::MissingCompanion => {
            return FileOutcome::Skipped(error);
        }
        Err(error) => return FileOutcome::Failed { copies: 0, error },
    };

    let mut copies = 0;
    for index in 0..plan.multiplier {
        if let Err(error) = write_replica(
            &document,
            record.base_name(),
            &image,
            index,
            &job.target_dir,
        ) {
            return FileOutcome::Failed { copies, error };
        }
        counter.issue();
        copies += 1;
    }

    FileOutcome::Replicated { copies }
}

/// Base name of replica `index` of `base_name`
pub fn replica_stem(base_name: &str, index: usize) -> String {
    format!("{base_name}{REPLICA_SEPARATOR}{index}")
}

fn write_replica(
    document: &AnnotationDocument,
    base_name: &str,
    image: &Path,
    index: usize,
    target_dir: &Path,
) -> Result<()> {
    let stem = replica_stem(base_name, index);
    let image_name = match image.extension() {
        Some(extension) => format!("{stem}.{}", extension.to_string_lossy()),
        None => stem.clone(),
    };

    let image_destination = target_dir.join(&image_name);
    std::fs::copy(image, &image_destination).with_path(image, "copy image")?;

    let annotation_destination = target_dir.join(format!("{stem}.{ANNOTATION_EXTENSION}"));
    document.write_replica(&annotation_destination, &image_name)?;

    debug!(
        image = %image_destination.display(),
        annotation = %annotation_destination.display(),
        "wrote replica"
    );

    Ok(())
}
