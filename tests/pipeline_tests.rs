//! End-to-end pipeline tests over in-memory and on-disk inputs
//!
//! Covers the graph shape of a small TypeScript project, call resolution
//! priority (import map, local scope, global fallback), unresolved calls,
//! structural invariants and rerun determinism.

use meridian::graph::model::definition_id;
use meridian::{
    IngestPipeline, IngestSource, NodeLabel, PipelineConfig, PipelineOutput, RelationType,
    RunContext,
};
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

fn run_files(entries: &[(&str, &str)]) -> PipelineOutput {
    let source = IngestSource::Files(
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec()))
            .collect(),
    );
    IngestPipeline::new(PipelineConfig::default())
        .run(&source)
        .unwrap()
}

#[test]
fn test_two_file_typescript_project() {
    let output = run_files(&[
        ("a.ts", "export function foo() {}\n"),
        ("b.ts", "import { foo } from './a';\nfoo();\n"),
    ]);
    let graph = &output.graph;
    let foo = definition_id(NodeLabel::Function, "a.ts", "foo", 1);

    let ids: HashSet<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
    let expected: HashSet<&str> = ["Folder:", "File:a.ts", "File:b.ts", foo.as_str()]
        .into_iter()
        .collect();
    assert_eq!(ids, expected);

    assert!(graph.has_relation("Folder:", "File:a.ts", RelationType::Contains));
    assert!(graph.has_relation("Folder:", "File:b.ts", RelationType::Contains));
    assert!(graph.has_relation("File:a.ts", &foo, RelationType::Defines));
    assert!(graph.has_relation("File:b.ts", "File:a.ts", RelationType::Imports));
    assert!(graph.has_relation("File:b.ts", &foo, RelationType::Calls));
    assert_eq!(graph.relation_count(), 5);

    let summary = &output.summary;
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.definitions, 1);
    assert_eq!(summary.imports_resolved, 1);
    assert_eq!(summary.calls_resolved.import_map, 1);
    assert_eq!(summary.calls_unresolved, 0);
    assert_eq!(summary.nodes, 4);
    assert_eq!(summary.edges, 5);
}

#[test]
fn test_unresolved_call_is_counted_without_edge() {
    let output = run_files(&[
        ("a.ts", "export function foo() {}\n"),
        ("b.ts", "import { foo } from './a';\nfoo();\nbar();\n"),
    ]);

    assert_eq!(output.summary.calls_unresolved, 1);
    assert_eq!(output.graph.relations_of_kind(RelationType::Calls).count(), 1);
    assert!(output
        .graph
        .relations()
        .iter()
        .all(|r| !r.to.contains(":bar:")));
}

#[test]
fn test_import_map_wins_over_local_definition() {
    let output = run_files(&[
        ("a.ts", "export function helper() {}\n"),
        (
            "b.ts",
            "import { helper } from './a';\nfunction helper() {}\nhelper();\n",
        ),
    ]);
    let imported = definition_id(NodeLabel::Function, "a.ts", "helper", 1);
    let local = definition_id(NodeLabel::Function, "b.ts", "helper", 2);

    assert!(output
        .graph
        .has_relation("File:b.ts", &imported, RelationType::Calls));
    assert!(!output
        .graph
        .has_relation("File:b.ts", &local, RelationType::Calls));
    assert_eq!(output.summary.calls_resolved.import_map, 1);
}

#[test]
fn test_aliased_and_namespace_imports_resolve_to_target() {
    let output = run_files(&[
        ("lib/math.ts", "export function add() {}\nexport function sub() {}\n"),
        (
            "main.ts",
            "import { add as plus } from './lib/math';\nimport * as m from './lib/math';\nplus();\nm.sub();\n",
        ),
    ]);
    let add = definition_id(NodeLabel::Function, "lib/math.ts", "add", 1);
    let sub = definition_id(NodeLabel::Function, "lib/math.ts", "sub", 2);

    assert!(output.graph.has_relation("File:main.ts", &add, RelationType::Calls));
    assert!(output.graph.has_relation("File:main.ts", &sub, RelationType::Calls));
    assert_eq!(output.summary.calls_resolved.import_map, 2);
    assert_eq!(output.summary.imports_resolved, 2);
    // Two specifiers, one target file: one edge
    assert_eq!(
        output.graph.relations_of_kind(RelationType::Imports).count(),
        1
    );
}

#[test]
fn test_local_scope_before_global() {
    let output = run_files(&[
        ("a.py", "def run():\n    pass\n"),
        ("b.py", "def run():\n    pass\n\nrun()\n"),
    ]);
    let local = definition_id(NodeLabel::Function, "b.py", "run", 1);

    assert!(output.graph.has_relation("File:b.py", &local, RelationType::Calls));
    assert_eq!(output.summary.calls_resolved.local, 1);
    assert_eq!(output.summary.calls_resolved.global, 0);
}

#[test]
fn test_global_fallback_takes_earliest_file() {
    let output = run_files(&[
        ("main.py", "util()\n"),
        ("lib/y.py", "def util():\n    pass\n"),
        ("lib/x.py", "def util():\n    pass\n"),
    ]);
    let earliest = definition_id(NodeLabel::Function, "lib/x.py", "util", 1);
    let later = definition_id(NodeLabel::Function, "lib/y.py", "util", 1);

    assert!(output
        .graph
        .has_relation("File:main.py", &earliest, RelationType::Calls));
    assert!(!output
        .graph
        .has_relation("File:main.py", &later, RelationType::Calls));
    assert_eq!(output.summary.calls_resolved.global, 1);
}

#[test]
fn test_python_from_import_resolves_module_and_call() {
    let output = run_files(&[
        ("pkg/__init__.py", ""),
        ("pkg/util.py", "def helper():\n    return 1\n"),
        ("main.py", "from pkg.util import helper\n\nhelper()\n"),
    ]);
    let helper = definition_id(NodeLabel::Function, "pkg/util.py", "helper", 1);

    assert!(output
        .graph
        .has_relation("File:main.py", "File:pkg/util.py", RelationType::Imports));
    assert!(output
        .graph
        .has_relation("File:main.py", &helper, RelationType::Calls));
    assert_eq!(output.summary.calls_resolved.import_map, 1);
}

#[test]
fn test_unresolved_imports_are_reported() {
    let output = run_files(&[(
        "app.js",
        "import React from 'react';\nimport { x } from './missing';\n",
    )]);

    assert_eq!(output.summary.imports_unresolved, 2);
    let unresolved: Vec<String> = output
        .diagnostics
        .iter()
        .filter(|d| matches!(d, meridian::PipelineDiagnostic::Unresolved { .. }))
        .map(|d| d.format_stderr())
        .collect();
    assert_eq!(
        unresolved,
        vec![
            "UNRESOLVED app.js:1: resolving imports: react",
            "UNRESOLVED app.js:2: resolving imports: ./missing",
        ]
    );
}

#[test]
fn test_structure_is_single_rooted_tree() {
    let output = run_files(&[
        ("src/a/b/c.ts", ""),
        ("src/a/d.py", ""),
        ("README.md", "hello"),
    ]);
    let graph = &output.graph;

    let contains: Vec<_> = graph.relations_of_kind(RelationType::Contains).collect();
    let structural = graph
        .nodes()
        .iter()
        .filter(|n| matches!(n.label, NodeLabel::Folder | NodeLabel::File))
        .count();

    // Every folder/file except the root has exactly one parent
    assert_eq!(contains.len(), structural - 1);
    let mut children = HashSet::new();
    for rel in &contains {
        assert!(children.insert(rel.to.as_str()), "{} has two parents", rel.to);
    }
    assert!(!children.contains("Folder:"));
    for id in ["Folder:src", "Folder:src/a", "Folder:src/a/b", "File:README.md"] {
        assert!(children.contains(id), "{} not contained", id);
    }
}

#[test]
fn test_every_edge_endpoint_exists() {
    let output = run_files(&[
        ("a.ts", "export class A { run() { helper(); } }\nexport function helper() {}\n"),
        ("b.ts", "import { A } from './a';\nnew A().run();\n"),
    ]);
    for rel in output.graph.relations() {
        assert!(output.graph.contains_node(&rel.from), "missing {}", rel.from);
        assert!(output.graph.contains_node(&rel.to), "missing {}", rel.to);
    }
}

#[test]
fn test_rerun_over_directory_is_identical() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src/util")).unwrap();
    fs::write(root.join("src/util/index.ts"), "export function fmt() {}\n").unwrap();
    fs::write(
        root.join("src/main.ts"),
        "import { fmt } from './util';\nfmt();\n",
    )
    .unwrap();
    fs::write(root.join("scripts.py"), "def go():\n    go()\n").unwrap();

    let source = IngestSource::Directory(root.to_path_buf());
    let first = IngestPipeline::new(PipelineConfig::default())
        .run(&source)
        .unwrap();
    let second = IngestPipeline::new(PipelineConfig::default())
        .run(&source)
        .unwrap();

    assert_eq!(first.graph.fingerprint(), second.graph.fingerprint());
    assert_eq!(first.graph.nodes(), second.graph.nodes());
    assert_eq!(first.graph.relations(), second.graph.relations());
    assert_eq!(first.summary, second.summary);
    assert!(first
        .graph
        .has_relation("File:src/main.ts", "File:src/util/index.ts", RelationType::Imports));
}

#[test]
fn test_mixed_language_imports_stay_in_family() {
    let output = run_files(&[
        ("utils.py", "def helper():\n    return 1\n"),
        ("utils.ts", "export function helper() {}\n"),
        ("main.py", "import utils\n\nutils.helper()\n"),
        ("lib.py", "def foo():\n    pass\n"),
        ("b.ts", "import { foo } from './lib';\nfoo();\n"),
    ]);
    let graph = &output.graph;
    let py_helper = definition_id(NodeLabel::Function, "utils.py", "helper", 1);
    let ts_helper = definition_id(NodeLabel::Function, "utils.ts", "helper", 1);

    assert!(graph.has_relation("File:main.py", "File:utils.py", RelationType::Imports));
    assert!(!graph.has_relation("File:main.py", "File:utils.ts", RelationType::Imports));
    assert!(graph.has_relation("File:main.py", &py_helper, RelationType::Calls));
    assert!(!graph.has_relation("File:main.py", &ts_helper, RelationType::Calls));

    // './lib' only exists as a Python module
    assert!(!graph.has_relation("File:b.ts", "File:lib.py", RelationType::Imports));
    assert_eq!(output.summary.imports_unresolved, 1);
}

#[test]
fn test_symbol_ids_all_name_graph_nodes() {
    let source = IngestSource::Files(vec![
        (
            "a.ts".to_string(),
            b"export function dup() {}\nexport function dup() {}\nexport class K { m() {} }\n"
                .to_vec(),
        ),
        (
            "b.py".to_string(),
            b"def f():\n    pass\n\ndef f():\n    pass\n\nclass C:\n    def g(self):\n        pass\n"
                .to_vec(),
        ),
        ("c.js".to_string(), b"function h() {}\nh();\n".to_vec()),
    ]);
    let mut ctx = RunContext::new(PipelineConfig::default());
    IngestPipeline::new(PipelineConfig::default())
        .run_with_context(&mut ctx, &source)
        .unwrap();

    let ids: Vec<&str> = ctx.symbols.node_ids().collect();
    assert!(ids.len() >= 8, "{:?}", ids);
    for id in &ids {
        assert!(ctx.graph.contains_node(id), "dangling symbol id {}", id);
    }
    for (file, name) in [("a.ts", "dup"), ("b.py", "f"), ("c.js", "h")] {
        let id = ctx.symbols.lookup_local(file, name).unwrap();
        assert!(ctx.graph.contains_node(id));
    }
}
