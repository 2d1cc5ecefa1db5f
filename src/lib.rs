//! Label-driven replication of image and annotation pairs
//!
//! A corpus is a directory tree of annotation files (JSON with a `shapes`
//! list and an `imagePath`) each paired with an image of the same base name.
//! The crate counts label instances across the corpus, resolves how many
//! copies every file needs from a label selection and per-label multipliers,
//! previews the resulting label totals, and writes the renamed copies with
//! their `imagePath` rewritten.

#![forbid(unsafe_code)]

/// Corpus scanning and label statistics
pub mod corpus;
/// Input/output operations, command-line surface and error handling
pub mod io;
/// Multiplier resolution, preview and the write pass
pub mod replication;

pub use io::error::{ReplicationError, Result};
