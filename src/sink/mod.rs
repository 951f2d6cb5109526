//! Graph sinks: where a finished node/edge batch goes
//!
//! A sink takes the whole batch at once and answers queries with typed rows.
//! The pipeline never depends on a concrete sink.

pub mod json;
#[cfg(feature = "sqlite-sink")]
pub mod sqlite;

pub use json::{ExportFormat, JsonExporter};
#[cfg(feature = "sqlite-sink")]
pub use sqlite::SqliteSink;

use serde::Serialize;
use std::fmt;

use crate::graph::{CodeNode, CodeRelation, NodeLabel, RelationType};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink cannot run this query
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "sqlite-sink")]
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A single column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl QueryValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            QueryValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => f.write_str("NULL"),
            QueryValue::Integer(i) => write!(f, "{}", i),
            QueryValue::Real(r) => write!(f, "{}", r),
            QueryValue::Text(s) => f.write_str(s),
        }
    }
}

/// One result row, columns in query order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRow {
    columns: Vec<(String, QueryValue)>,
}

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: QueryValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: QueryValue) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&QueryValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Receives the finished graph and answers queries over it
pub trait GraphSink {
    /// Load a complete node and relation batch
    fn bulk_load(&mut self, nodes: &[CodeNode], relations: &[CodeRelation]) -> Result<(), SinkError>;

    fn execute_query(&self, query: &str) -> Result<Vec<QueryRow>, SinkError>;
}

/// In-memory sink
///
/// Understands two query forms:
///
/// - `MATCH (n:Label)` / `COUNT (n:Label)` over nodes (`(n)` for all nodes)
/// - `MATCH ()-[:TYPE]->()` / `COUNT ()-[:TYPE]->()` over relations
///   (`()-[]->()` for all relations)
#[derive(Debug, Default)]
pub struct MemorySink {
    nodes: Vec<CodeNode>,
    relations: Vec<CodeRelation>,
    batches: usize,
}

enum Pattern {
    Nodes(Option<NodeLabel>),
    Relations(Option<RelationType>),
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[CodeNode] {
        &self.nodes
    }

    pub fn relations(&self) -> &[CodeRelation] {
        &self.relations
    }

    /// Number of `bulk_load` calls received
    pub fn batches(&self) -> usize {
        self.batches
    }

    fn parse_pattern(query: &str, pattern: &str) -> Result<Pattern, SinkError> {
        let unsupported = || SinkError::UnsupportedQuery(query.to_string());
        let pattern = pattern.trim();

        if let Some(inner) = pattern
            .strip_prefix("()-[")
            .and_then(|rest| rest.strip_suffix("]->()"))
        {
            let kind = match inner.trim().trim_start_matches(|c: char| c.is_alphanumeric() || c == '_') {
                "" => None,
                typed => {
                    let name = typed.strip_prefix(':').ok_or_else(unsupported)?;
                    Some(RelationType::parse(name.trim()).ok_or_else(unsupported)?)
                }
            };
            return Ok(Pattern::Relations(kind));
        }

        let inner = pattern
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(unsupported)?;
        match inner.split_once(':') {
            None => Ok(Pattern::Nodes(None)),
            Some((_, label)) => Ok(Pattern::Nodes(Some(
                NodeLabel::parse(label.trim()).ok_or_else(unsupported)?,
            ))),
        }
    }
}

impl GraphSink for MemorySink {
    fn bulk_load(&mut self, nodes: &[CodeNode], relations: &[CodeRelation]) -> Result<(), SinkError> {
        self.nodes.extend_from_slice(nodes);
        self.relations.extend_from_slice(relations);
        self.batches += 1;
        Ok(())
    }

    fn execute_query(&self, query: &str) -> Result<Vec<QueryRow>, SinkError> {
        let (verb, pattern) = query
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| SinkError::UnsupportedQuery(query.to_string()))?;
        let pattern = Self::parse_pattern(query, pattern)?;

        let rows: Vec<QueryRow> = match pattern {
            Pattern::Nodes(label) => self
                .nodes
                .iter()
                .filter(|n| label.map_or(true, |l| n.label == l))
                .map(|n| {
                    QueryRow::new()
                        .with("id", QueryValue::Text(n.id.clone()))
                        .with("label", QueryValue::Text(n.label.as_str().to_string()))
                        .with("name", QueryValue::Text(n.name.clone()))
                        .with("file_path", QueryValue::Text(n.file_path.clone()))
                        .with("start_line", QueryValue::Integer(n.start_line as i64))
                })
                .collect(),
            Pattern::Relations(kind) => self
                .relations
                .iter()
                .filter(|r| kind.map_or(true, |k| r.kind == k))
                .map(|r| {
                    QueryRow::new()
                        .with("from", QueryValue::Text(r.from.clone()))
                        .with("type", QueryValue::Text(r.kind.as_str().to_string()))
                        .with("to", QueryValue::Text(r.to.clone()))
                })
                .collect(),
        };

        match verb.to_ascii_uppercase().as_str() {
            "MATCH" => Ok(rows),
            "COUNT" => Ok(vec![
                QueryRow::new().with("count", QueryValue::Integer(rows.len() as i64))
            ]),
            _ => Err(SinkError::UnsupportedQuery(query.to_string())),
        }
    }
}
