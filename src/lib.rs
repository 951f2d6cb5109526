//! Meridian: a deterministic code-graph ingestion pipeline
//!
//! Meridian reads a source tree (directory, zip archive or in-memory file
//! set), and produces a typed graph of folders, files, definitions and the
//! CONTAINS / DEFINES / IMPORTS / CALLS relations between them.
//!
//! Phases run strictly in order:
//!
//! 1. **Extract**: enumerate and read files, apply ignore rules
//! 2. **Structure**: folder/file tree rooted at `Folder:`
//! 3. **Parse**: tree-sitter parse, definitions into the symbol table
//! 4. **Imports**: resolve import specifiers to files, build import maps
//! 5. **Calls**: resolve call sites via import map, local scope, then global
//!
//! Parsed trees live in a bounded LRU cache for the duration of a run and
//! are re-parsed on demand after eviction.
//!
//! # Position Conventions
//!
//! - **Line positions**: 1-indexed (line 1 is the first line)
//! - **Byte offsets**: 0-indexed from file start
//!
//! # Feature Flags
//!
//! - **`sqlite-sink`** (default): SQLite bulk-load sink via rusqlite (bundled)

pub mod common;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod graph;
pub mod ingest;
pub mod pipeline;
pub mod sink;
pub mod validation;
pub mod version;

pub use config::PipelineConfig;
pub use diagnostics::{DiagnosticStage, PipelineDiagnostic, RunSummary, SkipReason, TierCounts};
pub use error::PipelineError;
pub use extract::{ExtractError, ExtractedFiles, Extractor, FileContent, IngestSource};
pub use graph::{
    AstCache, CacheStats, CallResolver, CodeGraph, CodeNode, CodeRelation, GraphError, ImportMap,
    ImportResolver, NodeLabel, RelationType, ResolutionTier, StructureBuilder, SymbolTable,
};
pub use ingest::{
    detect_language, CallFact, ImportFact, Language, ParseCapability, ParseError, SymbolFact,
    SymbolKind, SyntaxTree, TreeSitterParser,
};
pub use pipeline::{
    CancellationFlag, IngestPipeline, PipelineOutput, PipelinePhase, PipelineProgress, RunContext,
};
pub use sink::{ExportFormat, GraphSink, JsonExporter, MemorySink, QueryRow, QueryValue, SinkError};
#[cfg(feature = "sqlite-sink")]
pub use sink::SqliteSink;
pub use validation::{normalize_path, PathValidationError};
