//! Run-scoped state
//!
//! Everything a run mutates lives in one [`RunContext`] built for that run
//! and dropped after it. Two runs never share a symbol table or a cache.

use std::collections::HashMap;

use super::PipelinePhase;
use crate::config::PipelineConfig;
use crate::diagnostics::{PipelineDiagnostic, RunSummary};
use crate::graph::{AstCache, CodeGraph, ImportMap, SymbolTable};
use crate::ingest::{Language, SyntaxTree};

/// Files handled by one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCounter {
    pub phase: PipelinePhase,
    pub processed: usize,
    pub total: usize,
}

/// Current phase and per-phase counters of a run
#[derive(Debug, Clone)]
pub struct RunState {
    phase: PipelinePhase,
    counters: Vec<PhaseCounter>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: PipelinePhase::Extract,
            counters: Vec::new(),
        }
    }
}

impl RunState {
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Move to `next` if the transition is legal
    ///
    /// Phases only move forward one step at a time; `Aborted` is reachable
    /// from anything except `Done`. Returns false and leaves the state
    /// unchanged otherwise.
    pub fn transition(&mut self, next: PipelinePhase) -> bool {
        let legal = match next {
            PipelinePhase::Aborted => !self.phase.is_terminal(),
            _ => self.phase.next() == Some(next),
        };
        if legal {
            tracing::debug!("phase {} -> {}", self.phase, next);
            self.phase = next;
        }
        legal
    }

    /// Record the final counts of a phase
    pub fn record(&mut self, phase: PipelinePhase, processed: usize, total: usize) {
        self.counters.push(PhaseCounter {
            phase,
            processed,
            total,
        });
    }

    pub fn counters(&self) -> &[PhaseCounter] {
        &self.counters
    }
}

/// A file that parsed and takes part in the import and call phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub path: String,
    pub language: Language,
}

/// Mutable state of one pipeline run
#[derive(Debug)]
pub struct RunContext {
    pub config: PipelineConfig,
    pub state: RunState,
    pub graph: CodeGraph,
    pub symbols: SymbolTable,
    pub ast_cache: AstCache<SyntaxTree>,
    /// Import map per importing file, filled during the import phase
    pub import_maps: HashMap<String, ImportMap>,
    /// Parsed files in processing order
    pub parsed: Vec<ParsedFile>,
    pub diagnostics: Vec<PipelineDiagnostic>,
    pub summary: RunSummary,
}

impl RunContext {
    pub fn new(config: PipelineConfig) -> Self {
        let ast_cache = AstCache::new(config.ast_cache_capacity);
        Self {
            config,
            state: RunState::default(),
            graph: CodeGraph::new(),
            symbols: SymbolTable::new(),
            ast_cache,
            import_maps: HashMap::new(),
            parsed: Vec::new(),
            diagnostics: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        self.state.phase()
    }

    /// Successful end of a run: release every cached tree
    pub(crate) fn finish(&mut self) {
        let released = self.ast_cache.release_all();
        self.state.transition(PipelinePhase::Done);
        self.close_summary();
        tracing::debug!("released {} cached trees at completion", released);
    }

    /// Failed or cancelled run: release every cached tree
    pub(crate) fn abort(&mut self) {
        let released = self.ast_cache.release_all();
        self.state.transition(PipelinePhase::Aborted);
        self.close_summary();
        tracing::debug!("released {} cached trees on abort", released);
    }

    fn close_summary(&mut self) {
        self.summary.nodes = self.graph.node_count();
        self.summary.edges = self.graph.relation_count();
        self.summary.cache = self.ast_cache.stats();
    }

    /// Consume the context into the run's result
    pub fn into_output(mut self) -> PipelineOutput {
        self.diagnostics.sort();
        PipelineOutput {
            graph: self.graph,
            summary: self.summary,
            diagnostics: self.diagnostics,
        }
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct PipelineOutput {
    pub graph: CodeGraph,
    pub summary: RunSummary,
    /// Skips, unresolved imports and per-file errors, sorted by path
    pub diagnostics: Vec<PipelineDiagnostic>,
}
