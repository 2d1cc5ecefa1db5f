/// Annotation documents: label extraction and `imagePath` rewriting
pub mod annotation;
/// Command-line interface
pub mod cli;
/// Constants and defaults
pub mod configuration;
/// Error types
pub mod error;
/// Companion image lookup and verification
pub mod image;
/// Log subscriber setup
pub mod logging;
/// Terminal progress display
pub mod progress;
/// Background replication worker
pub mod worker;
