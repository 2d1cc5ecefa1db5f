//! Read-only projection of per-label totals after replication
//!
//! The preview walks the corpus with the same record parsing, multiplier
//! resolution and companion lookup as the executor, so its projected counts
//! match what a real run writes. The output directory is flat, so replicas of
//! files sharing a base name overwrite each other in scan order; only the
//! surviving replicas are projected.

use crate::corpus::scanner::CorpusScanner;
use crate::replication::settings::ReplicationSettings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Current and projected totals for one selected label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelProjection {
    /// Label name
    pub label: String,
    /// Instances across the whole corpus
    pub current: usize,
    /// The label's own multiplier (override or default)
    pub multiplier: usize,
    /// Instances present in the output after replication
    pub projected: usize,
}

impl LabelProjection {
    /// Growth from current to projected in percent, `None` when current is 0
    pub fn growth_percent(&self) -> Option<f64> {
        growth_percent(self.current, self.projected)
    }
}

fn growth_percent(current: usize, projected: usize) -> Option<f64> {
    (current > 0).then(|| (projected as f64 - current as f64) / current as f64 * 100.0)
}

fn format_growth(growth: Option<f64>) -> String {
    growth.map_or_else(|| "N/A".to_string(), |percent| format!("{percent:.1}%"))
}

/// Outcome of a preview pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewReport {
    /// One projection per selected label, sorted by label
    pub projections: Vec<LabelProjection>,
    /// Annotation files visited
    pub files_scanned: usize,
    /// Files with a nonzero multiplier
    pub files_matched: usize,
    /// Files that failed to parse
    pub files_unreadable: usize,
    /// Matched files the executor would skip for lack of a usable companion image
    pub files_without_companion: usize,
    /// Replicas written over by a later file with the same base name
    pub replicas_overwritten: usize,
    /// Shared default multiplier
    pub default_multiplier: usize,
}

impl PreviewReport {
    /// Projection for `label`, if it is selected
    pub fn projection(&self, label: &str) -> Option<&LabelProjection> {
        self.projections
            .iter()
            .find(|projection| projection.label == label)
    }

    /// Sum of current counts over selected labels
    pub fn total_current(&self) -> usize {
        self.projections
            .iter()
            .fold(0, |total, p| total.saturating_add(p.current))
    }

    /// Sum of projected counts over selected labels
    pub fn total_projected(&self) -> usize {
        self.projections
            .iter()
            .fold(0, |total, p| total.saturating_add(p.projected))
    }

    /// Overall growth in percent, `None` when nothing is currently present
    pub fn total_growth_percent(&self) -> Option<f64> {
        growth_percent(self.total_current(), self.total_projected())
    }
}

impl fmt::Display for PreviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .projections
            .iter()
            .map(|p| p.label.len())
            .chain(std::iter::once("total".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:<width$}  {:>10}  {:>6}  {:>10}  {:>8}",
            "label", "current", "copies", "projected", "growth"
        )?;
        for p in &self.projections {
            writeln!(
                f,
                "{:<width$}  {:>10}  {:>6}  {:>10}  {:>8}",
                p.label,
                p.current,
                p.multiplier,
                p.projected,
                format_growth(p.growth_percent())
            )?;
        }
        writeln!(
            f,
            "{:<width$}  {:>10}  {:>6}  {:>10}  {:>8}",
            "total",
            self.total_current(),
            "",
            self.total_projected(),
            format_growth(self.total_growth_percent())
        )?;
        writeln!(f)?;
        writeln!(f, "files scanned:              {}", self.files_scanned)?;
        writeln!(f, "files with selected labels: {}", self.files_matched)?;
        if self.files_without_companion > 0 {
            writeln!(
                f,
                "skipped (no usable image):  {}",
                self.files_without_companion
            )?;
        }
        if self.replicas_overwritten > 0 {
            writeln!(
                f,
                "replicas overwritten:       {}",
                self.replicas_overwritten
            )?;
        }
        if self.files_unreadable > 0 {
            writeln!(f, "unreadable annotations:     {}", self.files_unreadable)?;
        }
        writeln!(f, "default multiplier:         {}", self.default_multiplier)?;
        write!(
            f,
            "selected instances:         {} -> {}",
            self.total_current(),
            self.total_projected()
        )
    }
}

/// Replicas one file would write, with its selected-label instance counts
struct ReplicaWriter {
    multiplier: usize,
    instances: Vec<usize>,
}

/// Project per-label totals without writing anything
pub fn preview(scanner: &CorpusScanner, settings: &ReplicationSettings) -> PreviewReport {
    let labels: Vec<&str> = settings.selection.iter().collect();
    let mut current = vec![0_usize; labels.len()];
    let mut writers: BTreeMap<String, Vec<ReplicaWriter>> = BTreeMap::new();
    let mut report = PreviewReport {
        projections: Vec::new(),
        files_scanned: 0,
        files_matched: 0,
        files_unreadable: 0,
        files_without_companion: 0,
        replicas_overwritten: 0,
        default_multiplier: settings.multipliers.default_multiplier().get(),
    };

    for record in scanner.records() {
        report.files_scanned += 1;
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                warn!(error = %error, "skipping annotation");
                report.files_unreadable += 1;
                continue;
            }
        };

        let instances: Vec<usize> = labels
            .iter()
            .map(|label| record.instances_of(label))
            .collect();
        for (total, count) in current.iter_mut().zip(&instances) {
            *total = total.saturating_add(*count);
        }

        let plan = settings.plan(&record);
        if plan.is_excluded() {
            continue;
        }
        report.files_matched += 1;

        if let Err(error) = settings.companion(record.path()) {
            warn!(error = %error, "replication would skip annotation");
            report.files_without_companion += 1;
            continue;
        }

        debug!(
            path = %record.path().display(),
            multiplier = plan.multiplier,
            "projected replication"
        );
        writers
            .entry(record.base_name().to_string())
            .or_default()
            .push(ReplicaWriter {
                multiplier: plan.multiplier,
                instances,
            });
    }

    let mut projected = vec![0_usize; labels.len()];
    for group in writers.values() {
        // Index i of a base name ends up holding the last file whose multiplier exceeds i
        let mut covered = 0;
        for writer in group.iter().rev() {
            let surviving = writer.multiplier.saturating_sub(covered);
            let overwritten = writer.multiplier - surviving;
            report.replicas_overwritten = report.replicas_overwritten.saturating_add(overwritten);
            for (total, count) in projected.iter_mut().zip(&writer.instances) {
                *total = total.saturating_add(count.saturating_mul(surviving));
            }
            covered = covered.max(writer.multiplier);
        }
    }

    report.projections = labels
        .iter()
        .zip(current.into_iter().zip(projected))
        .map(|(label, (current, projected))| LabelProjection {
            label: (*label).to_string(),
            current,
            multiplier: settings.multipliers.multiplier_for(label).get(),
            projected,
        })
        .collect();

    report
}
