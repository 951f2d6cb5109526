//! Path filtering for gitignore-style rules and include/exclude globs.
//!
//! Precedence, first match wins:
//! 1. Hard internal ignores (.git/, node_modules/, database files, etc.)
//! 2. Gitignore-style rules (.gitignore, .ignore)
//! 3. Include patterns (if any provided)
//! 4. Exclude patterns
//!
//! The filter works on normalized root-relative paths, so the same rules
//! apply to directory trees and archive entries. Pure function: same inputs
//! always produce the same output.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

use super::ExtractError;
use crate::diagnostics::SkipReason;

/// Internal directories that are always ignored (hard-coded).
const INTERNAL_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    "__MACOSX",
];

/// File suffixes that are always ignored (hard-coded).
const INTERNAL_IGNORE_EXTS: &[&str] = &[
    ".db",
    ".db-journal",
    ".db-wal",
    ".db-shm",
    ".sqlite",
    ".sqlite3",
    ".pyc",
];

/// Filter state for one extraction.
pub struct FileFilter {
    gitignore: Option<Gitignore>,
    /// Include patterns (empty = include all)
    include_patterns: Vec<globset::GlobMatcher>,
    exclude_patterns: Vec<globset::GlobMatcher>,
}

impl FileFilter {
    /// Filter without gitignore rules
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self, ExtractError> {
        Ok(Self {
            gitignore: None,
            include_patterns: compile_globs(include_patterns)?,
            exclude_patterns: compile_globs(exclude_patterns)?,
        })
    }

    /// Filter for a directory tree, loading `.gitignore` and `.ignore` from `root`
    pub fn for_directory(
        root: &Path,
        include_patterns: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self, ExtractError> {
        let mut filter = Self::new(include_patterns, exclude_patterns)?;
        let mut builder = GitignoreBuilder::new(root);

        for name in [".gitignore", ".ignore"] {
            let path = root.join(name);
            if path.exists() {
                // A malformed ignore file should not abort ingestion
                if let Some(err) = builder.add(&path) {
                    tracing::warn!("failed to load {}: {}", path.display(), err);
                }
            }
        }

        filter.gitignore = Some(
            builder
                .build()
                .map_err(|e| ExtractError::Ignore(e.to_string()))?,
        );
        Ok(filter)
    }

    /// Filter for an archive, using the text of its root `.gitignore` if any
    pub fn for_archive(
        gitignore_text: Option<&str>,
        include_patterns: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self, ExtractError> {
        let mut filter = Self::new(include_patterns, exclude_patterns)?;
        if let Some(text) = gitignore_text {
            let mut builder = GitignoreBuilder::new("");
            for line in text.lines() {
                if let Err(err) = builder.add_line(None, line) {
                    tracing::warn!("ignoring bad .gitignore line {:?}: {}", line, err);
                }
            }
            filter.gitignore = Some(
                builder
                    .build()
                    .map_err(|e| ExtractError::Ignore(e.to_string()))?,
            );
        }
        Ok(filter)
    }

    /// True if a directory should not be descended into
    pub fn skip_dir(&self, rel_dir: &str) -> bool {
        let name = rel_dir.rsplit('/').next().unwrap_or(rel_dir);
        if INTERNAL_IGNORE_DIRS.contains(&name) {
            return true;
        }
        self.gitignore
            .as_ref()
            .map(|g| g.matched(rel_dir, true).is_ignore())
            .unwrap_or(false)
    }

    /// Check if a normalized file path should be skipped, returning the reason if so.
    pub fn should_skip(&self, rel_path: &str) -> Option<SkipReason> {
        if is_internal_ignore(rel_path) {
            return Some(SkipReason::IgnoredInternal);
        }

        if let Some(gitignore) = &self.gitignore {
            if gitignore.matched(rel_path, false).is_ignore() {
                return Some(SkipReason::IgnoredByGitignore);
            }

            // Directory patterns like "build/" match files under build/
            let mut ancestor = rel_path;
            while let Some(idx) = ancestor.rfind('/') {
                ancestor = &ancestor[..idx];
                if gitignore.matched(ancestor, true).is_ignore() {
                    return Some(SkipReason::IgnoredByGitignore);
                }
            }
        }

        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|m| m.is_match(rel_path))
        {
            return Some(SkipReason::ExcludedByGlob);
        }

        if self.exclude_patterns.iter().any(|m| m.is_match(rel_path)) {
            return Some(SkipReason::ExcludedByGlob);
        }

        None
    }
}

fn is_internal_ignore(rel_path: &str) -> bool {
    let lower = rel_path.to_ascii_lowercase();
    if INTERNAL_IGNORE_EXTS.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }
    rel_path
        .split('/')
        .any(|segment| INTERNAL_IGNORE_DIRS.contains(&segment))
}

fn compile_globs(patterns: &[String]) -> Result<Vec<globset::GlobMatcher>, ExtractError> {
    patterns
        .iter()
        .map(|pattern| {
            globset::Glob::new(pattern)
                .map(|g| g.compile_matcher())
                .map_err(|e| ExtractError::InvalidGlob {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_internal_ignores() {
        let filter = FileFilter::new(&[], &[]).unwrap();
        assert_eq!(
            filter.should_skip(".git/config"),
            Some(SkipReason::IgnoredInternal)
        );
        assert_eq!(
            filter.should_skip("web/node_modules/react/index.js"),
            Some(SkipReason::IgnoredInternal)
        );
        assert_eq!(
            filter.should_skip("data/cache.sqlite"),
            Some(SkipReason::IgnoredInternal)
        );
        assert_eq!(filter.should_skip("src/a.ts"), None);
        assert!(filter.skip_dir("pkg/__pycache__"));
    }

    #[test]
    fn test_gitignore_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "build/\n*.log\n").unwrap();

        let filter = FileFilter::for_directory(root, &[], &[]).unwrap();

        assert_eq!(
            filter.should_skip("build/out.js"),
            Some(SkipReason::IgnoredByGitignore)
        );
        assert_eq!(
            filter.should_skip("debug.log"),
            Some(SkipReason::IgnoredByGitignore)
        );
        assert_eq!(filter.should_skip("src/main.py"), None);
        assert!(filter.skip_dir("build"));
    }

    #[test]
    fn test_gitignore_from_archive_text() {
        let filter = FileFilter::for_archive(Some("dist/\n"), &[], &[]).unwrap();
        assert_eq!(
            filter.should_skip("dist/bundle.js"),
            Some(SkipReason::IgnoredByGitignore)
        );
        assert_eq!(filter.should_skip("src/index.js"), None);
    }

    #[test]
    fn test_include_and_exclude_globs() {
        let filter = FileFilter::new(
            &["src/**".to_string()],
            &["**/*.test.ts".to_string()],
        )
        .unwrap();

        assert_eq!(filter.should_skip("src/a.ts"), None);
        assert_eq!(
            filter.should_skip("scripts/build.ts"),
            Some(SkipReason::ExcludedByGlob)
        );
        assert_eq!(
            filter.should_skip("src/a.test.ts"),
            Some(SkipReason::ExcludedByGlob)
        );
    }

    #[test]
    fn test_internal_ignore_precedes_globs() {
        let filter = FileFilter::new(&[], &["**/*.js".to_string()]).unwrap();
        assert_eq!(
            filter.should_skip("node_modules/x.js"),
            Some(SkipReason::IgnoredInternal)
        );
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let err = FileFilter::new(&["src/[".to_string()], &[]).err().unwrap();
        assert!(matches!(err, ExtractError::InvalidGlob { .. }));
    }
}
