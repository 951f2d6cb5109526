//! Progress reporting and cooperative cancellation

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::PipelinePhase;

/// One progress report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineProgress {
    pub phase: PipelinePhase,
    /// Overall completion, 0 to 100, monotone over a run
    pub percent: u8,
    /// Completion within the current phase, 0 to 100
    pub phase_percent: u8,
    pub processed: usize,
    pub total: usize,
}

impl PipelineProgress {
    /// Map `processed / total` of `phase` onto the phase's global range
    pub fn new(phase: PipelinePhase, processed: usize, total: usize) -> Self {
        let (start, end) = phase.percent_range();
        let phase_percent = if total == 0 {
            100
        } else {
            (processed.min(total) * 100 / total) as u8
        };
        let span = (end - start) as usize;
        let percent = start + (span * phase_percent as usize / 100) as u8;
        Self {
            phase,
            percent,
            phase_percent,
            processed,
            total,
        }
    }
}

/// Receives progress reports; called on the pipeline's thread between files
pub type ProgressCallback = dyn Fn(&PipelineProgress) + Send + Sync;

/// Shared flag a caller sets to stop a run at the next file boundary
///
/// Clones share the same flag, so one clone can be handed to a signal
/// handler while the pipeline holds another.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the same handle can drive another run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl From<Arc<AtomicBool>> for CancellationFlag {
    fn from(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }
}
