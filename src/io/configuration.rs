//! Replication constants and runtime configuration defaults

// Companion image lookup, tried in this order against the annotation's base name
/// Image extensions accepted as companions of an annotation file
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Extension of annotation files discovered by the scanner (matched case-insensitively)
pub const ANNOTATION_EXTENSION: &str = "json";

// Annotation document fields consumed or rewritten
/// Top-level list of shape objects
pub const SHAPES_FIELD: &str = "shapes";
/// Per-shape label string
pub const LABEL_FIELD: &str = "label";
/// Top-level image path rewritten on every replica
pub const IMAGE_PATH_FIELD: &str = "imagePath";

/// Separator between the original base name and the replica index
pub const REPLICA_SEPARATOR: &str = "_";

// Default values for configurable parameters
/// Copies made per matched file when no override applies
pub const DEFAULT_MULTIPLIER: usize = 1;

/// Keyword selecting automatic start sequence detection
pub const AUTO_SEQUENCE_KEYWORD: &str = "auto";

/// Sequence used when automatic detection finds no numbered annotations
pub const FIRST_SEQUENCE: u64 = 1;

// Logging
/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Filter used with `--quiet`
pub const QUIET_LOG_FILTER: &str = "warn";
/// Filter used with `--verbose`
pub const VERBOSE_LOG_FILTER: &str = "debug";

// Progress display
/// Width of the progress bar in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
/// Resolution of the percent-complete bar
pub const PROGRESS_SCALE: u64 = 1000;

/// Name given to the background replication thread
pub const WORKER_THREAD_NAME: &str = "replication-worker";
