//! Structured skip reasons, warnings and per-file errors for a pipeline run.
//!
//! - Deterministic ordering via sort_key()
//! - Human-readable stderr output
//! - JSON serialization for exporters

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Reason why a file was left out of parsing.
///
/// Ignored files never reach the graph; files skipped for content reasons
/// still get a File node but no definitions, imports or calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Internal hard-coded ignore rules (.git/, node_modules/, etc.)
    IgnoredInternal,
    /// Matched by gitignore-style rules (.gitignore, .ignore)
    IgnoredByGitignore,
    /// Excluded by an --exclude glob, or not matched by any --include glob
    ExcludedByGlob,
    /// No grammar for this extension
    UnsupportedLanguage,
    /// Content is not valid UTF-8
    BinaryContent,
    /// Larger than the configured size limit
    TooLarge,
    /// The parser could not produce a tree
    ParseFailed,
}

impl SkipReason {
    /// Stable sort key for deterministic ordering.
    ///
    /// Lower values = higher priority in reporting.
    pub fn sort_key(&self) -> u8 {
        match self {
            SkipReason::IgnoredInternal => 0,
            SkipReason::IgnoredByGitignore => 1,
            SkipReason::ExcludedByGlob => 2,
            SkipReason::UnsupportedLanguage => 3,
            SkipReason::BinaryContent => 4,
            SkipReason::TooLarge => 5,
            SkipReason::ParseFailed => 6,
        }
    }

    /// Human-readable description for stderr output.
    pub fn description(&self) -> &'static str {
        match self {
            SkipReason::IgnoredInternal => "internal ignore rule",
            SkipReason::IgnoredByGitignore => "matched by gitignore",
            SkipReason::ExcludedByGlob => "excluded by pattern",
            SkipReason::UnsupportedLanguage => "language not supported",
            SkipReason::BinaryContent => "binary content",
            SkipReason::TooLarge => "file too large",
            SkipReason::ParseFailed => "parse failed",
        }
    }

    /// True for reasons decided while enumerating input (file never enters the graph)
    pub fn is_ignore(&self) -> bool {
        matches!(
            self,
            SkipReason::IgnoredInternal | SkipReason::IgnoredByGitignore | SkipReason::ExcludedByGlob
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl PartialOrd for SkipReason {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SkipReason {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Pipeline phase a diagnostic was raised in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DiagnosticStage {
    Extract,
    Structure,
    Parse,
    Imports,
    Calls,
}

impl DiagnosticStage {
    /// Stable sort key for deterministic ordering.
    pub fn sort_key(&self) -> u8 {
        match self {
            DiagnosticStage::Extract => 0,
            DiagnosticStage::Structure => 1,
            DiagnosticStage::Parse => 2,
            DiagnosticStage::Imports => 3,
            DiagnosticStage::Calls => 4,
        }
    }

    /// Human-readable description for stderr output.
    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticStage::Extract => "extracting input",
            DiagnosticStage::Structure => "building structure",
            DiagnosticStage::Parse => "parsing source",
            DiagnosticStage::Imports => "resolving imports",
            DiagnosticStage::Calls => "resolving calls",
        }
    }
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl PartialOrd for DiagnosticStage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DiagnosticStage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// A non-fatal event from a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineDiagnostic {
    /// File was left out of parsing
    Skipped {
        /// Path relative to root
        path: String,
        reason: SkipReason,
    },
    /// A reference whose target could not be found; no edge was created
    Unresolved {
        path: String,
        stage: DiagnosticStage,
        /// Import specifier or callee name
        name: String,
        line: usize,
    },
    /// Error while processing one file; the file's remaining work was skipped
    Error {
        path: String,
        stage: DiagnosticStage,
        message: String,
    },
}

impl PipelineDiagnostic {
    /// Get the file path for this diagnostic.
    pub fn path(&self) -> &str {
        match self {
            PipelineDiagnostic::Skipped { path, .. } => path,
            PipelineDiagnostic::Unresolved { path, .. } => path,
            PipelineDiagnostic::Error { path, .. } => path,
        }
    }

    /// Stable sort key for deterministic ordering.
    ///
    /// Primary: path string (lexicographic)
    /// Secondary: variant type (Error, then Skipped, then Unresolved)
    /// Tertiary: stage/reason sort key
    pub fn sort_key(&self) -> (&str, u8, u8) {
        match self {
            PipelineDiagnostic::Error { path, stage, .. } => (path, 0, stage.sort_key()),
            PipelineDiagnostic::Skipped { path, reason } => (path, 1, reason.sort_key()),
            PipelineDiagnostic::Unresolved { path, stage, .. } => (path, 2, stage.sort_key()),
        }
    }

    pub fn skipped(path: impl Into<String>, reason: SkipReason) -> Self {
        PipelineDiagnostic::Skipped {
            path: path.into(),
            reason,
        }
    }

    pub fn unresolved(
        path: impl Into<String>,
        stage: DiagnosticStage,
        name: impl Into<String>,
        line: usize,
    ) -> Self {
        PipelineDiagnostic::Unresolved {
            path: path.into(),
            stage,
            name: name.into(),
            line,
        }
    }

    pub fn error(path: impl Into<String>, stage: DiagnosticStage, message: impl Into<String>) -> Self {
        PipelineDiagnostic::Error {
            path: path.into(),
            stage,
            message: message.into(),
        }
    }

    /// Format for human-readable stderr output.
    ///
    /// Examples:
    /// - "SKIP assets/logo.png: language not supported"
    /// - "UNRESOLVED src/b.ts:3: resolving imports: ./missing"
    /// - "ERROR src/bad.py: parsing source: parser produced no tree"
    pub fn format_stderr(&self) -> String {
        match self {
            PipelineDiagnostic::Skipped { path, reason } => {
                format!("SKIP {}: {}", path, reason)
            }
            PipelineDiagnostic::Unresolved {
                path,
                stage,
                name,
                line,
            } => format!("UNRESOLVED {}:{}: {}: {}", path, line, stage, name),
            PipelineDiagnostic::Error {
                path,
                stage,
                message,
            } => format!("ERROR {}: {}: {}", path, stage, message),
        }
    }
}

impl fmt::Display for PipelineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_stderr())
    }
}

impl PartialOrd for PipelineDiagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PipelineDiagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
