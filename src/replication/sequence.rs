//! Run-scoped reporting sequence
//!
//! The sequence is reported to the operator as the run's final number. Output
//! files are named by their per-file replica index instead, so the two
//! numbering schemes never interact.

use crate::io::configuration::{AUTO_SEQUENCE_KEYWORD, FIRST_SEQUENCE};
use crate::io::error::{ReplicationError, Result, WithPath};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

static NUMBERED_ANNOTATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^.+_(\d+)\.json$").ok());

/// Requested start of the reporting sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StartSequence {
    /// Continue after the highest `<prefix>_<digits>.json` in the target directory
    #[default]
    Auto,
    /// Start at the given number
    Explicit(NonZeroU64),
}

impl FromStr for StartSequence {
    type Err = ReplicationError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(AUTO_SEQUENCE_KEYWORD) {
            return Ok(Self::Auto);
        }
        trimmed
            .parse::<NonZeroU64>()
            .map(Self::Explicit)
            .map_err(|_parse_error| ReplicationError::InvalidStartSequence {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for StartSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "{AUTO_SEQUENCE_KEYWORD}"),
            Self::Explicit(start) => write!(f, "{start}"),
        }
    }
}

/// Determine the first sequence number of a run
///
/// An explicit start is returned unchanged. `Auto` looks at the immediate
/// files of `target_dir` and returns one past the highest numbered
/// annotation, or 1 when there is none or the directory does not exist.
///
/// # Errors
///
/// Returns an error if `target_dir` exists but cannot be listed
pub fn allocate(target_dir: &Path, start: StartSequence) -> Result<u64> {
    match start {
        StartSequence::Explicit(start) => Ok(start.get()),
        StartSequence::Auto => {
            if !target_dir.is_dir() {
                return Ok(FIRST_SEQUENCE);
            }
            let highest = highest_sequence(target_dir)?;
            Ok(highest.map_or(FIRST_SEQUENCE, |highest| highest.saturating_add(1)))
        }
    }
}

fn highest_sequence(target_dir: &Path) -> Result<Option<u64>> {
    let Some(pattern) = NUMBERED_ANNOTATION.as_ref() else {
        return Ok(None);
    };

    let mut highest = None;
    for entry in std::fs::read_dir(target_dir).with_path(target_dir, "list target directory")? {
        let entry = entry.with_path(target_dir, "list target directory")?;
        if !entry.file_type().is_ok_and(|kind| kind.is_file()) {
            continue;
        }
        let name = entry.file_name();
        let Some(sequence) = name
            .to_str()
            .and_then(|name| pattern.captures(name))
            .and_then(|captures| captures.get(1))
            .and_then(|digits| digits.as_str().parse::<u64>().ok())
        else {
            continue;
        };
        highest = highest.max(Some(sequence));
    }

    Ok(highest)
}

/// Monotonic counter issuing one number per produced pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter {
    start: u64,
    issued: u64,
}

impl SequenceCounter {
    /// Create a counter whose first issued number is `start`
    pub const fn new(start: u64) -> Self {
        Self { start, issued: 0 }
    }

    /// Issue the next number
    pub const fn issue(&mut self) -> u64 {
        let next = self.start.saturating_add(self.issued);
        self.issued += 1;
        next
    }

    /// First number of the run
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Last issued number, or `start - 1` when nothing was issued
    pub const fn final_value(&self) -> u64 {
        (self.start.saturating_add(self.issued)).saturating_sub(1)
    }
}
