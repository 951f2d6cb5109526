//! Node and relation types for the code graph
//!
//! Ids are derived from paths and declaration positions only, so the same input
//! always yields the same ids.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingest::SymbolKind;

/// Label of a graph node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    Folder,
    File,
    Function,
    Class,
    Interface,
    Method,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Folder => "Folder",
            NodeLabel::File => "File",
            NodeLabel::Function => "Function",
            NodeLabel::Class => "Class",
            NodeLabel::Interface => "Interface",
            NodeLabel::Method => "Method",
        }
    }

    /// Parse a label name (case-sensitive, as produced by `as_str`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Folder" => Some(NodeLabel::Folder),
            "File" => Some(NodeLabel::File),
            "Function" => Some(NodeLabel::Function),
            "Class" => Some(NodeLabel::Class),
            "Interface" => Some(NodeLabel::Interface),
            "Method" => Some(NodeLabel::Method),
            _ => None,
        }
    }

    /// True for labels created by the parse phase
    pub fn is_definition(&self) -> bool {
        !matches!(self, NodeLabel::Folder | NodeLabel::File)
    }
}

impl From<SymbolKind> for NodeLabel {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Function => NodeLabel::Function,
            SymbolKind::Class => NodeLabel::Class,
            SymbolKind::Interface => NodeLabel::Interface,
            SymbolKind::Method => NodeLabel::Method,
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a directed relation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Contains,
    Defines,
    Imports,
    Calls,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Contains => "CONTAINS",
            RelationType::Defines => "DEFINES",
            RelationType::Imports => "IMPORTS",
            RelationType::Calls => "CALLS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONTAINS" => Some(RelationType::Contains),
            "DEFINES" => Some(RelationType::Defines),
            "IMPORTS" => Some(RelationType::Imports),
            "CALLS" => Some(RelationType::Calls),
            _ => None,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex in the code graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeNode {
    pub id: String,
    pub label: NodeLabel,
    pub name: String,
    pub file_path: String,
    /// 1-indexed, 0 for folders
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    /// Filled in later by an external embedding indexer, never by ingestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl CodeNode {
    pub fn folder(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            id: folder_id(path),
            label: NodeLabel::Folder,
            name,
            file_path: path.to_string(),
            start_line: 0,
            end_line: 0,
            content: String::new(),
            embedding: None,
        }
    }

    pub fn file(path: &str, content: String) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let end_line = if content.is_empty() {
            0
        } else {
            content.lines().count().max(1)
        };
        Self {
            id: file_id(path),
            label: NodeLabel::File,
            name,
            file_path: path.to_string(),
            start_line: if content.is_empty() { 0 } else { 1 },
            end_line,
            content,
            embedding: None,
        }
    }

    pub fn definition(
        label: NodeLabel,
        path: &str,
        name: &str,
        start_line: usize,
        end_line: usize,
        content: String,
    ) -> Self {
        Self {
            id: definition_id(label, path, name, start_line),
            label,
            name: name.to_string(),
            file_path: path.to_string(),
            start_line,
            end_line,
            content,
            embedding: None,
        }
    }
}

/// A directed, typed edge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CodeRelation {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: RelationType,
}

impl CodeRelation {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: RelationType) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }

    /// Stable identity used for edge-set deduplication
    pub fn id(&self) -> String {
        format!("{}-{}->{}", self.from, self.kind.as_str(), self.to)
    }
}

/// Id of the folder node for `path` (the root folder has the empty path)
pub fn folder_id(path: &str) -> String {
    format!("Folder:{}", path)
}

pub fn file_id(path: &str) -> String {
    format!("File:{}", path)
}

pub fn definition_id(label: NodeLabel, path: &str, name: &str, start_line: usize) -> String {
    format!("{}:{}:{}:{}", label.as_str(), path, name, start_line)
}
