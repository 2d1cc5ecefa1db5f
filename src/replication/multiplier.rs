//! Label selection, per-label multiplier overrides and the multiplier resolver
//!
//! [`resolve`] is the only place a replication count is computed. Preview and
//! execution both reach it through [`ReplicationPlan::for_record`].

use crate::corpus::scanner::AnnotationRecord;
use crate::io::configuration::DEFAULT_MULTIPLIER;
use crate::io::error::{ReplicationError, Result, invalid_multiplier};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;

/// Labels chosen for replication, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSelection {
    labels: BTreeSet<String>,
}

impl LabelSelection {
    /// Build a selection from label strings, ignoring duplicates
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::EmptySelection`] if no labels are given
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(ReplicationError::EmptySelection);
        }
        Ok(Self { labels })
    }

    /// Check whether `label` is selected
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Selected labels in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Number of selected labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check whether nothing is selected (never true once constructed)
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-label copy counts with a shared default
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyMultiplierMap {
    default: NonZeroUsize,
    overrides: BTreeMap<String, NonZeroUsize>,
}

impl Default for CopyMultiplierMap {
    fn default() -> Self {
        Self {
            default: NonZeroUsize::new(DEFAULT_MULTIPLIER).unwrap_or(NonZeroUsize::MIN),
            overrides: BTreeMap::new(),
        }
    }
}

impl CopyMultiplierMap {
    /// Create a map with no overrides
    pub const fn new(default: NonZeroUsize) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Create a map from a raw default value
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::InvalidMultiplier`] if `default < 1`
    pub fn with_default(default: usize) -> Result<Self> {
        NonZeroUsize::new(default)
            .map(Self::new)
            .ok_or_else(|| invalid_multiplier(None, &default))
    }

    /// Override the copy count for `label`
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::InvalidMultiplier`] if `copies < 1`
    pub fn set(&mut self, label: &str, copies: usize) -> Result<()> {
        let copies =
            NonZeroUsize::new(copies).ok_or_else(|| invalid_multiplier(Some(label), &copies))?;
        self.overrides.insert(label.to_string(), copies);
        Ok(())
    }

    /// Remove the override for `label`, returning it to the default
    pub fn clear(&mut self, label: &str) -> Option<NonZeroUsize> {
        self.overrides.remove(label)
    }

    /// Shared default multiplier
    pub const fn default_multiplier(&self) -> NonZeroUsize {
        self.default
    }

    /// Explicit override for `label`, if any
    pub fn override_for(&self, label: &str) -> Option<NonZeroUsize> {
        self.overrides.get(label).copied()
    }

    /// Copy count for `label`: its override, falling back to the default
    pub fn multiplier_for(&self, label: &str) -> NonZeroUsize {
        self.override_for(label).unwrap_or(self.default)
    }

    /// All overrides in label order
    pub fn overrides(&self) -> impl Iterator<Item = (&str, NonZeroUsize)> {
        self.overrides
            .iter()
            .map(|(label, copies)| (label.as_str(), *copies))
    }
}

/// Replication count for a file carrying `file_labels`
///
/// Returns 0 when no file label is selected. Otherwise the largest
/// [`CopyMultiplierMap::multiplier_for`] among the selected file labels, so
/// which label achieves the maximum does not matter.
pub fn resolve<'a>(
    file_labels: impl IntoIterator<Item = &'a str>,
    selection: &LabelSelection,
    multipliers: &CopyMultiplierMap,
) -> usize {
    file_labels
        .into_iter()
        .filter(|label| selection.contains(label))
        .map(|label| multipliers.multiplier_for(label).get())
        .max()
        .unwrap_or(0)
}

/// Resolved replication decision for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationPlan {
    /// Number of replicas to produce, 0 when the file is excluded
    pub multiplier: usize,
    /// File labels that are part of the selection
    pub matched_labels: BTreeSet<String>,
}

impl ReplicationPlan {
    /// Plan replication of `record` under the given selection and multipliers
    pub fn for_record(
        record: &AnnotationRecord,
        selection: &LabelSelection,
        multipliers: &CopyMultiplierMap,
    ) -> Self {
        let matched_labels = record
            .labels()
            .filter(|label| selection.contains(label))
            .map(str::to_string)
            .collect();

        Self {
            multiplier: resolve(record.labels(), selection, multipliers),
            matched_labels,
        }
    }

    /// Check whether the file produces any replicas
    pub const fn is_excluded(&self) -> bool {
        self.multiplier == 0
    }
}
