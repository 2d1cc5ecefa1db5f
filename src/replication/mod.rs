//! Multiplier resolution, preview and the replication write pass

/// The write pass
pub mod executor;
/// Label selection, overrides and the multiplier resolver
pub mod multiplier;
/// Read-only projection of label totals
pub mod preview;
/// Reporting sequence allocation
pub mod sequence;
/// Parameters shared by preview and execution
pub mod settings;

pub use executor::{CancelToken, CopyResult, FileOutcome, ProgressSink, ReplicationJob, execute};
pub use multiplier::{CopyMultiplierMap, LabelSelection, ReplicationPlan, resolve};
pub use preview::{LabelProjection, PreviewReport, preview};
pub use sequence::{SequenceCounter, StartSequence, allocate};
pub use settings::ReplicationSettings;
