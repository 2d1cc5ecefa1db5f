//! Corpus discovery and label statistics

/// Corpus-wide label totals, selection and overrides
pub mod catalog;
/// Recursive annotation discovery
pub mod scanner;

pub use catalog::LabelCatalog;
pub use scanner::{AnnotationRecord, CorpusScanner};
