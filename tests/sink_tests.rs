//! Graph sinks fed from real pipeline output
//!
//! Covers bulk loading into the in-memory sink and SQLite, and the JSON /
//! JSONL writers producing identical bytes for identical inputs.

use meridian::{
    ExportFormat, GraphSink, IngestPipeline, IngestSource, JsonExporter, MemorySink,
    PipelineConfig, PipelineOutput, QueryValue,
};
use std::fs;
use tempfile::TempDir;

fn sample_output() -> PipelineOutput {
    let source = IngestSource::Files(vec![
        (
            "src/a.ts".to_string(),
            b"export function foo() {}\nexport class Box { open() {} }\n".to_vec(),
        ),
        (
            "src/b.ts".to_string(),
            b"import { foo } from './a';\nfoo();\n".to_vec(),
        ),
        ("tools/run.py".to_string(), b"def main():\n    main()\n".to_vec()),
    ]);
    IngestPipeline::new(PipelineConfig::default())
        .run(&source)
        .unwrap()
}

fn count(sink: &dyn GraphSink, query: &str) -> i64 {
    let rows = sink.execute_query(query).unwrap();
    rows[0].get("count").and_then(QueryValue::as_integer).unwrap()
}

#[test]
fn test_memory_sink_counts_match_graph() {
    let output = sample_output();
    let (nodes, relations) = output.graph.into_parts();

    let mut sink = MemorySink::new();
    sink.bulk_load(&nodes, &relations).unwrap();

    assert_eq!(count(&sink, "COUNT (n)"), nodes.len() as i64);
    assert_eq!(count(&sink, "COUNT ()-[r]->()"), relations.len() as i64);
    assert_eq!(count(&sink, "COUNT (n:File)"), 3);
    assert_eq!(count(&sink, "COUNT (n:Folder)"), 3);
    assert_eq!(count(&sink, "COUNT ()-[:IMPORTS]->()"), 1);

    let calls = sink.execute_query("MATCH ()-[:CALLS]->()").unwrap();
    let targets: Vec<&str> = calls
        .iter()
        .filter_map(|row| row.get("to").and_then(QueryValue::as_text))
        .collect();
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().any(|t| t.contains("src/a.ts:foo")));
    assert!(targets.iter().any(|t| t.contains("tools/run.py:main")));
}

#[test]
fn test_memory_sink_rejects_unknown_queries() {
    let sink = MemorySink::new();
    assert!(sink.execute_query("DELETE (n)").is_err());
    assert!(sink.execute_query("MATCH (n:Widget)").is_err());
}

#[cfg(feature = "sqlite-sink")]
#[test]
fn test_sqlite_sink_reload_replaces_previous_graph() {
    use meridian::SqliteSink;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("graph.db");
    let output = sample_output();
    let (nodes, relations) = output.graph.into_parts();

    {
        let mut sink = SqliteSink::open(&db_path).unwrap();
        sink.bulk_load(&nodes, &relations).unwrap();
    }

    // A second full load over the same file, as the ingest command does
    let mut sink = SqliteSink::open(&db_path).unwrap();
    sink.clear().unwrap();
    sink.bulk_load(&nodes, &relations).unwrap();

    let rows = sink
        .execute_query("SELECT COUNT(*) AS n FROM nodes")
        .unwrap();
    assert_eq!(
        rows[0].get("n").and_then(QueryValue::as_integer),
        Some(nodes.len() as i64)
    );

    let rows = sink
        .execute_query("SELECT from_id, to_id FROM edges WHERE type = 'IMPORTS'")
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("from_id").and_then(QueryValue::as_text),
        Some("File:src/b.ts")
    );
    assert_eq!(
        rows[0].get("to_id").and_then(QueryValue::as_text),
        Some("File:src/a.ts")
    );
}

#[test]
fn test_jsonl_export_is_byte_identical_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let first_path = temp_dir.path().join("first.jsonl");
    let second_path = temp_dir.path().join("second.jsonl");

    for path in [&first_path, &second_path] {
        let output = sample_output();
        let summary = output.summary.clone();
        let (nodes, relations) = output.graph.into_parts();
        JsonExporter::new(path, ExportFormat::JsonL)
            .with_summary(summary)
            .bulk_load(&nodes, &relations)
            .unwrap();
    }

    let first = fs::read(&first_path).unwrap();
    let second = fs::read(&second_path).unwrap();
    assert_eq!(first, second);

    let text = String::from_utf8(first).unwrap();
    let last = text.lines().last().unwrap();
    let record: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(record["record"], "summary");
    assert_eq!(record["files_total"], 3);
}

#[test]
fn test_json_document_shape() {
    let output = sample_output();
    let (nodes, relations) = output.graph.into_parts();

    let mut buf = Vec::new();
    JsonExporter::new("unused.json", ExportFormat::Json)
        .write_to(&mut buf, &nodes, &relations)
        .unwrap();

    let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(doc["nodes"].as_array().unwrap().len(), nodes.len());
    assert_eq!(doc["relations"].as_array().unwrap().len(), relations.len());
    assert!(doc.get("summary").is_none());
    assert_eq!(doc["relations"][0]["type"], "CONTAINS");
}
