//! Recursive discovery of annotation files and per-file label records

use crate::io::annotation::AnnotationDocument;
use crate::io::configuration::ANNOTATION_EXTENSION;
use crate::io::error::{ReplicationError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Labels found in one annotation file
///
/// Derived fresh on every scan and never cached between passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    path: PathBuf,
    base_name: String,
    label_counts: BTreeMap<String, usize>,
}

impl AnnotationRecord {
    /// Read the annotation at `path` and extract its labels
    ///
    /// # Errors
    ///
    /// Returns a parse-category error if the file is unreadable or malformed
    pub fn load(path: &Path) -> Result<Self> {
        AnnotationDocument::read(path).map(|document| Self::from_document(&document))
    }

    /// Build a record from an already parsed document
    pub fn from_document(document: &AnnotationDocument) -> Self {
        let path = document.path().to_path_buf();
        let base_name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();

        Self {
            path,
            base_name,
            label_counts: document.label_counts(),
        }
    }

    /// Path of the annotation file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without extension
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Instance count for every distinct label in the file
    pub const fn label_counts(&self) -> &BTreeMap<String, usize> {
        &self.label_counts
    }

    /// Distinct labels in the file, in sorted order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.label_counts.keys().map(String::as_str)
    }

    /// Number of shapes carrying `label`
    pub fn instances_of(&self, label: &str) -> usize {
        self.label_counts.get(label).copied().unwrap_or(0)
    }
}

/// Walks a corpus root looking for annotation files
#[derive(Debug, Clone)]
pub struct CorpusScanner {
    root: PathBuf,
}

impl CorpusScanner {
    /// Create a scanner for `root`
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::MissingRoot`] if `root` is not an existing directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ReplicationError::MissingRoot { path: root });
        }
        Ok(Self { root })
    }

    /// Corpus root being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree for annotation files
    ///
    /// Order is deterministic (entries sorted by file name at every level).
    /// Each call starts a new walk.
    pub fn annotation_paths(&self) -> AnnotationPaths {
        AnnotationPaths {
            walker: WalkDir::new(&self.root)
                .sort_by_file_name()
                .into_iter(),
        }
    }

    /// Parse every discovered annotation, yielding failures alongside records
    pub fn records(&self) -> impl Iterator<Item = Result<AnnotationRecord>> + use<> {
        self.annotation_paths()
            .map(|path| AnnotationRecord::load(&path))
    }

    /// Parse every discovered annotation, logging and skipping failures
    pub fn scan(&self) -> impl Iterator<Item = AnnotationRecord> + use<> {
        self.records().filter_map(|record| {
            record
                .map_err(|error| warn!(error = %error, "skipping annotation"))
                .ok()
        })
    }
}

/// Lazy sequence of annotation file paths under a corpus root
pub struct AnnotationPaths {
    walker: walkdir::IntoIter,
}

impl Iterator for AnnotationPaths {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) if entry.file_type().is_file() && is_annotation(entry.path()) => {
                    return Some(entry.into_path());
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(error = %error, "skipping unreadable corpus entry");
                }
            }
        }
    }
}

/// Check whether `path` carries the annotation extension
pub fn is_annotation(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(ANNOTATION_EXTENSION))
}
