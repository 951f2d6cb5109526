//! Structured diagnostics for pipeline runs.
//!
//! Provides deterministic, sortable diagnostic types for skip reasons,
//! unresolved references and per-file errors, plus the end-of-run summary.

pub mod pipeline_diagnostics;
pub mod summary;

pub use pipeline_diagnostics::{DiagnosticStage, PipelineDiagnostic, SkipReason};
pub use summary::{RunSummary, TierCounts};
