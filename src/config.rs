//! Run configuration
//!
//! Loaded from a JSON file; any key left out keeps its default.
//!
//! ```json
//! {
//!   "ast_cache_capacity": 100,
//!   "exclude": ["**/*.test.ts"],
//!   "max_file_bytes": 1048576
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::graph::DEFAULT_AST_CACHE_CAPACITY;

/// Extensions tried, in order, when resolving an import specifier
pub const DEFAULT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".py"];

/// Configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File the config was read from (for display)
    #[serde(skip)]
    pub source: Option<PathBuf>,

    /// Maximum number of parsed trees alive at once
    pub ast_cache_capacity: usize,

    /// Ordered candidate suffixes for import resolution
    pub extensions: Vec<String>,

    /// Glob patterns for files to include. If empty, include everything.
    pub include: Vec<String>,

    pub exclude: Vec<String>,

    /// Strip a single top-level directory shared by every archive entry
    pub strip_archive_root: bool,

    /// Files above this size keep no content and are not parsed
    pub max_file_bytes: Option<u64>,

    /// Report progress every N files
    pub progress_batch: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: None,
            ast_cache_capacity: DEFAULT_AST_CACHE_CAPACITY,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            include: Vec::new(),
            exclude: Vec::new(),
            strip_archive_root: true,
            max_file_bytes: None,
            progress_batch: 1,
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        config.source = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.ast_cache_capacity == 0 {
            return Err(PipelineError::Config(
                "ast_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.progress_batch == 0 {
            return Err(PipelineError::Config(
                "progress_batch must be at least 1".to_string(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
            return Err(PipelineError::Config(format!(
                "extension '{}' must start with '.'",
                ext
            )));
        }
        for pattern in self.include.iter().chain(&self.exclude) {
            globset::Glob::new(pattern)
                .map_err(|e| PipelineError::Config(format!("invalid glob '{}': {}", pattern, e)))?;
        }
        Ok(())
    }
}
