//! Input extraction: turn a directory, archive or in-memory file set into
//! an ordered path list plus contents.
//!
//! Paths come out normalized (root-relative, forward slashes) and sorted
//! lexicographically. That order is the processing order of every later
//! phase, so it is part of the output contract.

pub mod archive;
pub mod filter;

pub use filter::FileFilter;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::diagnostics::{PipelineDiagnostic, SkipReason};
use crate::validation::{normalize_path, relative_to_root};

/// Errors that make the input unreadable as a whole
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("invalid ignore rules: {0}")]
    Ignore(String),

    #[error("walking {path}: {message}")]
    Walk { path: String, message: String },
}

/// Where a run reads its files from
#[derive(Debug, Clone)]
pub enum IngestSource {
    /// A directory tree on disk
    Directory(PathBuf),
    /// Zip archive bytes
    Archive(Vec<u8>),
    /// A zip archive on disk
    ArchivePath(PathBuf),
    /// Files already in memory as (path, bytes)
    Files(Vec<(String, Vec<u8>)>),
}

/// Content of one extracted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
    /// Over the size limit; content was not kept
    Omitted { size: u64 },
}

impl FileContent {
    /// Classify raw bytes: valid UTF-8 without NUL bytes is text
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.contains(&0) {
            return FileContent::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => FileContent::Text(text),
            Err(e) => FileContent::Binary(e.into_bytes()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            FileContent::Text(text) => text.len() as u64,
            FileContent::Binary(bytes) => bytes.len() as u64,
            FileContent::Omitted { size } => *size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extractor output
#[derive(Debug, Default)]
pub struct ExtractedFiles {
    files: BTreeMap<String, FileContent>,
    /// Files left out by ignore rules
    pub ignored: Vec<PipelineDiagnostic>,
}

impl ExtractedFiles {
    /// Paths in processing order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn get(&self, path: &str) -> Option<&FileContent> {
        self.files.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileContent)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(&mut self, path: String, content: FileContent) {
        self.files.insert(path, content);
    }
}

/// Reads an `IngestSource` under a filter and size limit
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    include: Vec<String>,
    exclude: Vec<String>,
    strip_archive_root: bool,
    max_file_bytes: Option<u64>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            include: config.include.clone(),
            exclude: config.exclude.clone(),
            strip_archive_root: config.strip_archive_root,
            max_file_bytes: config.max_file_bytes,
        }
    }

    pub fn extract(&self, source: &IngestSource) -> Result<ExtractedFiles, ExtractError> {
        match source {
            IngestSource::Directory(root) => self.extract_directory(root),
            IngestSource::Archive(bytes) => {
                let entries = archive::read_zip_bytes(bytes, self.max_file_bytes)?;
                self.collect_entries(entries)
            }
            IngestSource::ArchivePath(path) => {
                let file = std::fs::File::open(path).map_err(|source| ExtractError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                let entries = archive::read_zip(std::io::BufReader::new(file), self.max_file_bytes)?;
                self.collect_entries(entries)
            }
            IngestSource::Files(files) => self.extract_files(files),
        }
    }

    fn extract_directory(&self, root: &Path) -> Result<ExtractedFiles, ExtractError> {
        if !root.is_dir() {
            return Err(ExtractError::NotADirectory(root.display().to_string()));
        }
        let filter = FileFilter::for_directory(root, &self.include, &self.exclude)?;
        let mut out = ExtractedFiles::default();

        let walker = walkdir::WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                match relative_to_root(entry.path(), root) {
                    Ok(rel) => !filter.skip_dir(&rel),
                    Err(_) => false,
                }
            });

        for entry in walker {
            let entry = entry.map_err(|e| ExtractError::Walk {
                path: root.display().to_string(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = match relative_to_root(entry.path(), root) {
                Ok(rel) => rel,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if let Some(reason) = filter.should_skip(&rel) {
                out.ignored.push(PipelineDiagnostic::skipped(rel, reason));
                continue;
            }

            let content = match self.max_file_bytes {
                Some(limit) => {
                    let size = entry
                        .metadata()
                        .map(|m| m.len())
                        .map_err(|e| ExtractError::Walk {
                            path: rel.clone(),
                            message: e.to_string(),
                        })?;
                    if size > limit {
                        Some(FileContent::Omitted { size })
                    } else {
                        None
                    }
                }
                None => None,
            };

            let content = match content {
                Some(content) => content,
                None => {
                    let bytes = std::fs::read(entry.path()).map_err(|source| ExtractError::Io {
                        path: rel.clone(),
                        source,
                    })?;
                    FileContent::from_bytes(bytes)
                }
            };

            tracing::trace!("extracted {}", rel);
            out.insert(rel, content);
        }

        Ok(out)
    }

    fn collect_entries(&self, entries: Vec<archive::ArchiveEntry>) -> Result<ExtractedFiles, ExtractError> {
        let prefix = if self.strip_archive_root {
            let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
            archive::common_root(&paths)
        } else {
            None
        };

        let gitignore_name = match &prefix {
            Some(p) => format!("{}/.gitignore", p),
            None => ".gitignore".to_string(),
        };
        let gitignore_text = entries
            .iter()
            .find(|e| e.path == gitignore_name)
            .and_then(|e| e.bytes.as_deref())
            .and_then(|b| std::str::from_utf8(b).ok());
        let filter = FileFilter::for_archive(gitignore_text, &self.include, &self.exclude)?;

        let mut out = ExtractedFiles::default();
        for entry in entries {
            let path = match &prefix {
                Some(p) => match entry.path.strip_prefix(p.as_str()) {
                    Some(rest) => rest.trim_start_matches('/').to_string(),
                    None => entry.path.clone(),
                },
                None => entry.path.clone(),
            };

            if let Some(reason) = filter.should_skip(&path) {
                out.ignored.push(PipelineDiagnostic::skipped(path, reason));
                continue;
            }

            let content = match entry.bytes {
                Some(bytes) => FileContent::from_bytes(bytes),
                None => FileContent::Omitted { size: entry.size },
            };
            out.insert(path, content);
        }

        Ok(out)
    }

    fn extract_files(&self, files: &[(String, Vec<u8>)]) -> Result<ExtractedFiles, ExtractError> {
        let filter = FileFilter::new(&self.include, &self.exclude)?;
        let mut out = ExtractedFiles::default();

        for (raw_path, bytes) in files {
            let path = match normalize_path(raw_path) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("dropping input file {}: {}", raw_path, e);
                    continue;
                }
            };
            if let Some(reason) = filter.should_skip(&path) {
                out.ignored.push(PipelineDiagnostic::skipped(path, reason));
                continue;
            }

            let content = match self.max_file_bytes {
                Some(limit) if bytes.len() as u64 > limit => FileContent::Omitted {
                    size: bytes.len() as u64,
                },
                _ => FileContent::from_bytes(bytes.clone()),
            };
            out.insert(path, content);
        }

        Ok(out)
    }
}

impl ExtractedFiles {
    /// Skip diagnostics for every ignored file, sorted
    pub fn ignored_sorted(&self) -> Vec<PipelineDiagnostic> {
        let mut ignored = self.ignored.clone();
        ignored.sort();
        ignored
    }

    /// Count of files left out with `reason`
    pub fn ignored_count(&self, reason: &SkipReason) -> usize {
        self.ignored
            .iter()
            .filter(|d| matches!(d, PipelineDiagnostic::Skipped { reason: r, .. } if r == reason))
            .count()
    }
}
