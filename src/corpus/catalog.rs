//! Corpus-wide label totals plus the operator's selection and overrides

use crate::corpus::scanner::{AnnotationRecord, CorpusScanner};
use crate::io::error::{ReplicationError, Result};
use crate::replication::multiplier::{CopyMultiplierMap, LabelSelection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Label instance totals across a whole corpus
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelCatalog {
    totals: BTreeMap<String, usize>,
    files_scanned: usize,
    files_unreadable: usize,
    #[serde(skip)]
    selection: Option<LabelSelection>,
    #[serde(skip)]
    multipliers: CopyMultiplierMap,
}

impl LabelCatalog {
    /// Aggregate totals from a complete record sequence
    pub fn build(records: impl IntoIterator<Item = AnnotationRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            catalog.add(&record);
        }
        catalog
    }

    /// Scan `scanner`'s corpus and aggregate totals, counting unreadable files
    ///
    /// Unreadable files are only logged at debug level; the passes that act on
    /// the corpus report them.
    pub fn from_scanner(scanner: &CorpusScanner) -> Self {
        let mut catalog = Self::default();
        for record in scanner.records() {
            match record {
                Ok(record) => catalog.add(&record),
                Err(error) => {
                    debug!(error = %error, "annotation not counted");
                    catalog.files_scanned += 1;
                    catalog.files_unreadable += 1;
                }
            }
        }
        catalog
    }

    fn add(&mut self, record: &AnnotationRecord) {
        self.files_scanned += 1;
        for (label, count) in record.label_counts() {
            *self.totals.entry(label.clone()).or_insert(0) += count;
        }
    }

    /// Total instances per label, sorted by label
    pub const fn totals(&self) -> &BTreeMap<String, usize> {
        &self.totals
    }

    /// Total instances of `label`, 0 if unknown
    pub fn total_for(&self, label: &str) -> usize {
        self.totals.get(label).copied().unwrap_or(0)
    }

    /// Check whether `label` occurs anywhere in the corpus
    pub fn contains(&self, label: &str) -> bool {
        self.totals.contains_key(label)
    }

    /// Sum of all label instances
    pub fn total_instances(&self) -> usize {
        self.totals.values().sum()
    }

    /// Annotation files visited, readable or not
    pub const fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Annotation files that failed to parse
    pub const fn files_unreadable(&self) -> usize {
        self.files_unreadable
    }

    /// Set the active selection
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::EmptySelection`] for an empty list and
    /// [`ReplicationError::UnknownLabel`] for a label absent from the corpus
    pub fn select<I, S>(&mut self, labels: I) -> Result<&LabelSelection>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selection = LabelSelection::new(labels)?;
        if let Some(unknown) = selection.iter().find(|label| !self.contains(label)) {
            return Err(ReplicationError::UnknownLabel {
                label: unknown.to_string(),
            });
        }
        Ok(self.selection.insert(selection))
    }

    /// Active selection, if one has been made
    pub const fn selection(&self) -> Option<&LabelSelection> {
        self.selection.as_ref()
    }

    /// Replace the default multiplier and every override at once
    pub fn replace_multipliers(&mut self, multipliers: CopyMultiplierMap) {
        self.multipliers = multipliers;
    }

    /// Override the multiplier for `label`
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::InvalidMultiplier`] if `copies < 1`
    pub fn set_multiplier(&mut self, label: &str, copies: usize) -> Result<()> {
        self.multipliers.set(label, copies)
    }

    /// Drop the override for `label`
    pub fn clear_multiplier(&mut self, label: &str) {
        self.multipliers.clear(label);
    }

    /// Current default and overrides
    pub const fn multipliers(&self) -> &CopyMultiplierMap {
        &self.multipliers
    }
}

impl fmt::Display for LabelCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.totals.keys().map(String::len).max().unwrap_or(0);
        for (label, count) in &self.totals {
            writeln!(f, "{label:<width$}  ({count})")?;
        }
        write!(
            f,
            "{} labels, {} instances in {} files ({} unreadable)",
            self.totals.len(),
            self.total_instances(),
            self.files_scanned,
            self.files_unreadable
        )
    }
}
