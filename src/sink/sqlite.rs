//! SQLite bulk-load sink
//!
//! Schema:
//! - `nodes(id PRIMARY KEY, label, name, file_path, start_line, end_line, content)`
//! - `edges(from_id, type, to_id)`, unique per triple
//!
//! A batch is written inside one transaction, so a failed load leaves the
//! database as it was.

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::path::Path;

use super::{GraphSink, QueryRow, QueryValue, SinkError};
use crate::graph::{CodeNode, CodeRelation};

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, SinkError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                content TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS edges (
                from_id TEXT NOT NULL,
                type TEXT NOT NULL,
                to_id TEXT NOT NULL,
                PRIMARY KEY (from_id, type, to_id)
            );
            CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label);
            CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id);",
        )?;
        Ok(Self { conn })
    }

    /// Remove all nodes and edges
    pub fn clear(&mut self) -> Result<(), SinkError> {
        self.conn.execute_batch("DELETE FROM edges; DELETE FROM nodes;")?;
        Ok(())
    }
}

impl GraphSink for SqliteSink {
    fn bulk_load(&mut self, nodes: &[CodeNode], relations: &[CodeRelation]) -> Result<(), SinkError> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_node = tx.prepare(
                "INSERT OR REPLACE INTO nodes (id, label, name, file_path, start_line, end_line, content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for node in nodes {
                insert_node.execute(params![
                    node.id,
                    node.label.as_str(),
                    node.name,
                    node.file_path,
                    node.start_line as i64,
                    node.end_line as i64,
                    node.content,
                ])?;
            }

            let mut insert_edge = tx.prepare(
                "INSERT OR IGNORE INTO edges (from_id, type, to_id) VALUES (?1, ?2, ?3)",
            )?;
            for relation in relations {
                insert_edge.execute(params![relation.from, relation.kind.as_str(), relation.to])?;
            }
        }
        tx.commit()?;

        tracing::info!(
            "loaded {} nodes, {} relations into sqlite",
            nodes.len(),
            relations.len()
        );
        Ok(())
    }

    fn execute_query(&self, query: &str) -> Result<Vec<QueryRow>, SinkError> {
        let mut stmt = self.conn.prepare(query)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = QueryRow::new();
            for (i, column) in columns.iter().enumerate() {
                let value = match row.get_ref(i)? {
                    ValueRef::Null => QueryValue::Null,
                    ValueRef::Integer(v) => QueryValue::Integer(v),
                    ValueRef::Real(v) => QueryValue::Real(v),
                    ValueRef::Text(bytes) => QueryValue::Text(String::from_utf8_lossy(bytes).into_owned()),
                    ValueRef::Blob(bytes) => QueryValue::Text(hex::encode(bytes)),
                };
                record.push(column.as_str(), value);
            }
            out.push(record);
        }
        Ok(out)
    }
}
