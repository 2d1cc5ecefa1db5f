//! Parameters shared by the preview and execution passes

use crate::corpus::catalog::LabelCatalog;
use crate::corpus::scanner::AnnotationRecord;
use crate::io::error::{ReplicationError, Result};
use crate::io::image::resolve_companion;
use crate::replication::multiplier::{CopyMultiplierMap, LabelSelection, ReplicationPlan};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Selection, multipliers and companion checks applied identically by both passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicationSettings {
    /// Labels whose files are replicated
    pub selection: LabelSelection,
    /// Default multiplier and per-label overrides
    pub multipliers: CopyMultiplierMap,
    /// Decode every companion image before counting or copying it
    pub verify_images: bool,
}

impl ReplicationSettings {
    /// Create settings without image verification
    pub const fn new(selection: LabelSelection, multipliers: CopyMultiplierMap) -> Self {
        Self {
            selection,
            multipliers,
            verify_images: false,
        }
    }

    /// Take the selection and multipliers configured on `catalog`
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::EmptySelection`] if nothing was selected
    pub fn from_catalog(catalog: &LabelCatalog) -> Result<Self> {
        let selection = catalog
            .selection()
            .cloned()
            .ok_or(ReplicationError::EmptySelection)?;
        Ok(Self::new(selection, catalog.multipliers().clone()))
    }

    /// Enable or disable companion image verification
    #[must_use]
    pub const fn with_image_verification(mut self, verify: bool) -> Self {
        self.verify_images = verify;
        self
    }

    /// Resolve how many replicas `record` gets
    pub fn plan(&self, record: &AnnotationRecord) -> ReplicationPlan {
        ReplicationPlan::for_record(record, &self.selection, &self.multipliers)
    }

    /// Find the companion image the executor would copy for `annotation`
    ///
    /// # Errors
    ///
    /// Returns a missing-companion error, or a copy-category error when
    /// verification is enabled and the image does not decode
    pub fn companion(&self, annotation: &Path) -> Result<PathBuf> {
        resolve_companion(annotation, self.verify_images)
    }
}
