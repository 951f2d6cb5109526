//! End-of-run summary
//!
//! Enough to judge how complete the graph is without looking at internals.

use serde::Serialize;
use std::fmt;

use crate::graph::{CacheStats, ResolutionTier};

/// Resolved calls broken down by resolution tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub import_map: usize,
    pub local: usize,
    pub global: usize,
}

impl TierCounts {
    pub fn record(&mut self, tier: ResolutionTier) {
        match tier {
            ResolutionTier::ImportMap => self.import_map += 1,
            ResolutionTier::Local => self.local += 1,
            ResolutionTier::Global => self.global += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.import_map + self.local + self.global
    }
}

/// Counters collected over one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Files that entered the graph
    pub files_total: usize,
    /// Files parsed and run through every phase
    pub files_processed: usize,
    /// Files with a File node but no parse (unsupported, binary, too large, parse failure)
    pub files_skipped: usize,
    /// Files dropped during extraction by ignore rules
    pub files_ignored: usize,
    pub definitions: usize,
    /// Import statements resolved to a file; one file may take several
    pub imports_resolved: usize,
    /// Import statements that matched no file
    pub imports_unresolved: usize,
    pub calls_resolved: TierCounts,
    pub calls_unresolved: usize,
    pub nodes: usize,
    pub edges: usize,
    pub cache: CacheStats,
}

impl RunSummary {
    /// Share of call sites that produced an edge (0.0 to 1.0)
    pub fn call_resolution_rate(&self) -> f64 {
        let total = self.calls_resolved.total() + self.calls_unresolved;
        if total == 0 {
            0.0
        } else {
            self.calls_resolved.total() as f64 / total as f64
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "files: {} total, {} processed, {} skipped, {} ignored",
            self.files_total, self.files_processed, self.files_skipped, self.files_ignored
        )?;
        writeln!(f, "definitions: {}", self.definitions)?;
        writeln!(
            f,
            "imports: {} resolved, {} unresolved",
            self.imports_resolved, self.imports_unresolved
        )?;
        writeln!(
            f,
            "calls: {} resolved (import {}, local {}, global {}), {} unresolved",
            self.calls_resolved.total(),
            self.calls_resolved.import_map,
            self.calls_resolved.local,
            self.calls_resolved.global,
            self.calls_unresolved
        )?;
        writeln!(f, "graph: {} nodes, {} edges", self.nodes, self.edges)?;
        write!(
            f,
            "ast cache: {} hits, {} misses, {} evictions, {} released",
            self.cache.hits, self.cache.misses, self.cache.evictions, self.cache.released
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_counts() {
        let mut tiers = TierCounts::default();
        tiers.record(ResolutionTier::ImportMap);
        tiers.record(ResolutionTier::Global);
        tiers.record(ResolutionTier::Global);
        assert_eq!(tiers.total(), 3);
        assert_eq!(tiers.global, 2);
    }

    #[test]
    fn test_call_resolution_rate() {
        let mut summary = RunSummary::default();
        assert_eq!(summary.call_resolution_rate(), 0.0);

        summary.calls_resolved.local = 3;
        summary.calls_unresolved = 1;
        assert!((summary.call_resolution_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_mentions_unresolved_counts() {
        let summary = RunSummary {
            imports_unresolved: 2,
            calls_unresolved: 5,
            ..Default::default()
        };
        let text = summary.to_string();
        assert!(text.contains("imports: 0 resolved, 2 unresolved"));
        assert!(text.contains("5 unresolved"));
    }
}
