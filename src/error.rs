//! Fatal pipeline errors
//!
//! Anything here ends the run. Per-file problems are not errors; they are
//! recorded as [`PipelineDiagnostic`](crate::diagnostics::PipelineDiagnostic)s
//! and the run continues.

use crate::extract::ExtractError;
use crate::graph::GraphError;
use crate::sink::SinkError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input could not be read as a whole
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    /// The cancellation flag was observed at a per-file checkpoint
    #[error("ingestion cancelled")]
    Cancelled,

    /// A phase tried to create an inconsistent graph
    #[error("graph invariant violated: {0}")]
    Graph(#[from] GraphError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_converts() {
        let err: PipelineError = GraphError::DanglingEndpoint {
            relation: "r".to_string(),
            missing: "File:x".to_string(),
        }
        .into();
        assert!(err.to_string().contains("File:x"));
        assert!(!err.is_cancelled());
        assert!(PipelineError::Cancelled.is_cancelled());
    }
}
