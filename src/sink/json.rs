//! JSON and JSONL export
//!
//! JSON writes one document `{nodes, relations, summary}`. JSONL writes one
//! record per line, each tagged with `"record"`: nodes first, then relations,
//! then the summary. Both are byte-identical for identical graphs.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{GraphSink, QueryRow, SinkError};
use crate::diagnostics::RunSummary;
use crate::graph::{CodeNode, CodeRelation};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Single JSON document
    Json,
    /// JSON Lines format (one JSON record per line)
    JsonL,
}

impl ExportFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "jsonl" => Some(ExportFormat::JsonL),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct GraphDocument<'a> {
    nodes: &'a [CodeNode],
    relations: &'a [CodeRelation],
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a RunSummary>,
}

#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum JsonlRecord<'a> {
    Node(&'a CodeNode),
    Relation(&'a CodeRelation),
    Summary(&'a RunSummary),
}

/// Writes the graph to a file on `bulk_load`
#[derive(Debug, Clone)]
pub struct JsonExporter {
    path: PathBuf,
    format: ExportFormat,
    summary: Option<RunSummary>,
}

impl JsonExporter {
    pub fn new(path: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            path: path.into(),
            format,
            summary: None,
        }
    }

    /// Include a run summary in the output
    pub fn with_summary(mut self, summary: RunSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize to any writer
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        nodes: &[CodeNode],
        relations: &[CodeRelation],
    ) -> Result<(), SinkError> {
        match self.format {
            ExportFormat::Json => {
                let doc = GraphDocument {
                    nodes,
                    relations,
                    summary: self.summary.as_ref(),
                };
                serde_json::to_writer_pretty(&mut *writer, &doc)?;
                writer.write_all(b"\n").map_err(|e| self.io_error(e))?;
            }
            ExportFormat::JsonL => {
                let records = nodes
                    .iter()
                    .map(JsonlRecord::Node)
                    .chain(relations.iter().map(JsonlRecord::Relation))
                    .chain(self.summary.iter().map(JsonlRecord::Summary));
                for record in records {
                    serde_json::to_writer(&mut *writer, &record)?;
                    writer.write_all(b"\n").map_err(|e| self.io_error(e))?;
                }
            }
        }
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl GraphSink for JsonExporter {
    fn bulk_load(&mut self, nodes: &[CodeNode], relations: &[CodeRelation]) -> Result<(), SinkError> {
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, nodes, relations)?;
        writer.flush().map_err(|e| self.io_error(e))?;
        tracing::info!(
            "wrote {} nodes, {} relations to {}",
            nodes.len(),
            relations.len(),
            self.path.display()
        );
        Ok(())
    }

    fn execute_query(&self, query: &str) -> Result<Vec<QueryRow>, SinkError> {
        Err(SinkError::UnsupportedQuery(format!(
            "{} (JSON export is write-only)",
            query
        )))
    }
}
