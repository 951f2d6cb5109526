//! JavaScript fact extraction using tree-sitter-javascript.
//!
//! The walkers here cover the ECMAScript constructs shared with TypeScript;
//! `typescript.rs` reuses them with TypeScript-only node kinds switched on.

use crate::ingest::imports::unquote;
use crate::ingest::{
    field_text, node_text, symbol_fact, CallFact, ImportFact, ImportKind, ImportedName,
    LanguageExtractor, SymbolFact, SymbolKind,
};

/// Node kinds of function values that make a binding a Function definition
const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function",
    "function_expression",
    "generator_function",
];

/// Extractor for `.js`, `.jsx`, `.mjs`, `.cjs`
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaScriptExtractor;

impl LanguageExtractor for JavaScriptExtractor {
    fn definitions(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<SymbolFact> {
        let mut facts = Vec::new();
        walk_definitions(&tree.root_node(), source, false, false, &mut facts);
        facts
    }

    fn imports(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<ImportFact> {
        let mut facts = Vec::new();
        walk_imports(&tree.root_node(), source, &mut facts);
        facts
    }

    fn calls(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<CallFact> {
        let mut calls = Vec::new();
        walk_calls(&tree.root_node(), source, &mut calls);
        calls
    }
}

/// Collect definitions in source order
///
/// `in_class` is true while directly inside a class body, where
/// `method_definition` and function-valued fields are methods.
pub(crate) fn walk_definitions(
    node: &tree_sitter::Node,
    source: &[u8],
    in_class: bool,
    typescript: bool,
    facts: &mut Vec<SymbolFact>,
) {
    let mut child_in_class = in_class;

    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            push_named(node, source, SymbolKind::Function, facts);
            child_in_class = false;
        }
        "class_declaration" | "class" => {
            push_named(node, source, SymbolKind::Class, facts);
            child_in_class = true;
        }
        "abstract_class_declaration" if typescript => {
            push_named(node, source, SymbolKind::Class, facts);
            child_in_class = true;
        }
        "interface_declaration" if typescript => {
            push_named(node, source, SymbolKind::Interface, facts);
        }
        "method_definition" => {
            if in_class {
                push_named(node, source, SymbolKind::Method, facts);
            }
            child_in_class = false;
        }
        "field_definition" | "public_field_definition" => {
            if in_class && has_function_value(node) {
                let name = field_text(node, "name", source)
                    .or_else(|| field_text(node, "property", source));
                if let Some(name) = name {
                    facts.push(symbol_fact(node, SymbolKind::Method, name));
                }
            }
            child_in_class = false;
        }
        "variable_declarator" => {
            let is_plain_binding = node
                .child_by_field_name("name")
                .map(|n| n.kind() == "identifier")
                .unwrap_or(false);
            if is_plain_binding && has_function_value(node) {
                push_named(node, source, SymbolKind::Function, facts);
            }
            child_in_class = false;
        }
        "arrow_function" | "function" | "function_expression" | "generator_function" => {
            child_in_class = false;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_definitions(&child, source, child_in_class, typescript, facts);
    }
}

fn has_function_value(node: &tree_sitter::Node) -> bool {
    node.child_by_field_name("value")
        .map(|v| FUNCTION_VALUES.contains(&v.kind()))
        .unwrap_or(false)
}

fn push_named(
    node: &tree_sitter::Node,
    source: &[u8],
    kind: SymbolKind,
    facts: &mut Vec<SymbolFact>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    // `[Symbol.iterator]() {}` has no usable name
    if name_node.kind() == "computed_property_name" {
        return;
    }
    if let Some(name) = node_text(&name_node, source) {
        facts.push(symbol_fact(node, kind, name.to_string()));
    }
}

/// Collect import, re-export and require facts in source order
pub(crate) fn walk_imports(node: &tree_sitter::Node, source: &[u8], facts: &mut Vec<ImportFact>) {
    match node.kind() {
        "import_statement" => {
            if let Some(fact) = extract_es_import(node, source) {
                facts.push(fact);
            }
            return;
        }
        "export_statement" => {
            if let Some(specifier) = source_specifier(node, source) {
                let mut fact = ImportFact::new(specifier, ImportKind::ReExport, line_of(node));
                fact.is_glob = has_child_kind(node, "*");
                facts.push(fact);
                return;
            }
        }
        "call_expression" => {
            if let Some(fact) = extract_require(node, source) {
                facts.push(fact);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(&child, source, facts);
    }
}

fn extract_es_import(node: &tree_sitter::Node, source: &[u8]) -> Option<ImportFact> {
    let line = line_of(node);

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();

    // TypeScript: import fs = require("fs")
    if let Some(clause) = children.iter().find(|c| c.kind() == "import_require_clause") {
        let specifier = source_specifier(clause, source).or_else(|| {
            let mut c = clause.walk();
            let found = clause
                .children(&mut c)
                .find(|n| n.kind() == "string")
                .and_then(|n| node_text(&n, source))
                .map(|t| unquote(t).to_string());
            found
        })?;
        let mut fact = ImportFact::new(specifier, ImportKind::Require, line);
        let mut c = clause.walk();
        let local = clause
            .children(&mut c)
            .find(|n| n.kind() == "identifier")
            .and_then(|n| node_text(&n, source));
        if let Some(local) = local {
            fact.names.push(ImportedName::namespace(local));
        }
        return Some(fact);
    }

    let specifier = source_specifier(node, source)?;
    let mut fact = ImportFact::new(specifier, ImportKind::EsImport, line);

    if let Some(clause) = children.iter().find(|c| c.kind() == "import_clause") {
        let mut c = clause.walk();
        for part in clause.children(&mut c) {
            match part.kind() {
                "identifier" => {
                    // Default import: looked up under the local name in the target
                    if let Some(local) = node_text(&part, source) {
                        fact.names.push(ImportedName::named(local, local));
                    }
                }
                "namespace_import" => {
                    let mut nc = part.walk();
                    let local = part
                        .children(&mut nc)
                        .find(|n| n.kind() == "identifier")
                        .and_then(|n| node_text(&n, source));
                    if let Some(local) = local {
                        fact.names.push(ImportedName::namespace(local));
                    }
                }
                "named_imports" => {
                    let mut sc = part.walk();
                    for spec in part.children(&mut sc) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(imported) = field_text(&spec, "name", source) else {
                            continue;
                        };
                        let local =
                            field_text(&spec, "alias", source).unwrap_or_else(|| imported.clone());
                        fact.names.push(ImportedName::named(imported, local));
                    }
                }
                _ => {}
            }
        }
    }

    Some(fact)
}

/// `require("x")`, bound through a declarator when there is one
fn extract_require(node: &tree_sitter::Node, source: &[u8]) -> Option<ImportFact> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" || node_text(&function, source)? != "require" {
        return None;
    }
    let first_arg = node.child_by_field_name("arguments")?.named_child(0)?;
    if first_arg.kind() != "string" {
        return None;
    }
    let specifier = unquote(node_text(&first_arg, source)?).to_string();
    let mut fact = ImportFact::new(specifier, ImportKind::Require, line_of(node));

    let Some(declarator) = node.parent().filter(|p| p.kind() == "variable_declarator") else {
        return Some(fact);
    };
    let Some(pattern) = declarator.child_by_field_name("name") else {
        return Some(fact);
    };

    match pattern.kind() {
        "identifier" => {
            if let Some(local) = node_text(&pattern, source) {
                fact.names.push(ImportedName::namespace(local));
            }
        }
        "object_pattern" => {
            let mut cursor = pattern.walk();
            for prop in pattern.named_children(&mut cursor) {
                match prop.kind() {
                    "shorthand_property_identifier_pattern" => {
                        if let Some(name) = node_text(&prop, source) {
                            fact.names.push(ImportedName::named(name, name));
                        }
                    }
                    "pair_pattern" => {
                        let key = field_text(&prop, "key", source);
                        let value = prop
                            .child_by_field_name("value")
                            .filter(|v| v.kind() == "identifier")
                            .and_then(|v| node_text(&v, source));
                        if let (Some(key), Some(value)) = (key, value) {
                            fact.names.push(ImportedName::named(key, value));
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }

    Some(fact)
}

fn source_specifier(node: &tree_sitter::Node, source: &[u8]) -> Option<String> {
    let literal = node.child_by_field_name("source")?;
    node_text(&literal, source).map(|t| unquote(t).to_string())
}

fn has_child_kind(node: &tree_sitter::Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

fn line_of(node: &tree_sitter::Node) -> usize {
    node.start_position().row + 1
}

/// Collect call sites in source order
pub(crate) fn walk_calls(node: &tree_sitter::Node, source: &[u8], calls: &mut Vec<CallFact>) {
    match node.kind() {
        "call_expression" => {
            if let Some(call) = node
                .child_by_field_name("function")
                .and_then(|f| callee_of(&f, node, source))
            {
                if !(call.receiver.is_none() && call.callee == "require") {
                    calls.push(call);
                }
            }
        }
        "new_expression" => {
            if let Some(call) = node
                .child_by_field_name("constructor")
                .and_then(|f| callee_of(&f, node, source))
            {
                calls.push(call);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(&child, source, calls);
    }
}

fn callee_of(
    function: &tree_sitter::Node,
    call: &tree_sitter::Node,
    source: &[u8],
) -> Option<CallFact> {
    let line = line_of(call);
    match function.kind() {
        "identifier" => Some(CallFact {
            callee: node_text(function, source)?.to_string(),
            receiver: None,
            line,
        }),
        "member_expression" => {
            let property = function.child_by_field_name("property")?;
            let receiver = function
                .child_by_field_name("object")
                .and_then(|o| node_text(&o, source))
                .map(str::to_string);
            Some(CallFact {
                callee: node_text(&property, source)?.to_string(),
                receiver,
                line,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::pool::with_parser;
    use crate::ingest::Language;

    fn parse(source: &str) -> tree_sitter::Tree {
        with_parser(Language::JavaScript, |p| p.parse(source, None))
            .unwrap()
            .unwrap()
    }

    fn definitions(source: &str) -> Vec<(SymbolKind, String)> {
        let tree = parse(source);
        JavaScriptExtractor
            .definitions(&tree, source.as_bytes())
            .into_iter()
            .map(|f| (f.kind, f.name))
            .collect()
    }

    #[test]
    fn test_extract_functions_and_bound_function_values() {
        let defs = definitions(
            "function a() {}\nfunction* gen() {}\nconst b = () => 1;\nlet c = function () {};\nconst d = 5;\n",
        );
        assert_eq!(
            defs,
            vec![
                (SymbolKind::Function, "a".to_string()),
                (SymbolKind::Function, "gen".to_string()),
                (SymbolKind::Function, "b".to_string()),
                (SymbolKind::Function, "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_class_and_methods() {
        let defs = definitions(
            "class Greeter {\n  constructor() {}\n  greet() { return {inner() {}}; }\n  static make() {}\n}\n",
        );
        assert_eq!(
            defs,
            vec![
                (SymbolKind::Class, "Greeter".to_string()),
                (SymbolKind::Method, "constructor".to_string()),
                (SymbolKind::Method, "greet".to_string()),
                (SymbolKind::Method, "make".to_string()),
            ],
            "object literal methods are not class methods"
        );
    }

    #[test]
    fn test_line_positions() {
        let source = "\n\nfunction later() {\n  return 1;\n}\n";
        let tree = parse(source);
        let defs = JavaScriptExtractor.definitions(&tree, source.as_bytes());
        assert_eq!(defs[0].start_line, 3);
        assert_eq!(defs[0].end_line, 5);
        assert!(defs[0].byte_end <= source.len());
    }

    #[test]
    fn test_extract_es_imports() {
        let source = "import def from './a';\nimport * as ns from './b';\nimport { x, y as z } from '../c';\nimport './side';\n";
        let tree = parse(source);
        let imports = JavaScriptExtractor.imports(&tree, source.as_bytes());

        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].specifier, "./a");
        assert_eq!(imports[0].names, vec![ImportedName::named("def", "def")]);
        assert_eq!(imports[1].names, vec![ImportedName::namespace("ns")]);
        assert_eq!(
            imports[2].names,
            vec![ImportedName::named("x", "x"), ImportedName::named("y", "z")]
        );
        assert_eq!(imports[3].specifier, "./side");
        assert!(imports[3].names.is_empty());
        assert_eq!(imports[3].line, 4);
    }

    #[test]
    fn test_extract_require_and_reexport() {
        let source = "const lib = require('./lib');\nconst { a, b: c } = require(\"./pair\");\nrequire('./plain');\nexport * from './all';\n";
        let tree = parse(source);
        let imports = JavaScriptExtractor.imports(&tree, source.as_bytes());

        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].kind, ImportKind::Require);
        assert_eq!(imports[0].names, vec![ImportedName::namespace("lib")]);
        assert_eq!(
            imports[1].names,
            vec![ImportedName::named("a", "a"), ImportedName::named("b", "c")]
        );
        assert!(imports[2].names.is_empty());
        assert_eq!(imports[3].kind, ImportKind::ReExport);
        assert!(imports[3].is_glob);
    }

    #[test]
    fn test_extract_calls_with_receivers() {
        let source = "foo();\nobj.bar(1);\nnew Widget();\nrequire('./x');\nthis.run();\n";
        let tree = parse(source);
        let calls = JavaScriptExtractor.calls(&tree, source.as_bytes());

        let summary: Vec<_> = calls
            .iter()
            .map(|c| (c.callee.as_str(), c.receiver.as_deref(), c.line))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("foo", None, 1),
                ("bar", Some("obj"), 2),
                ("Widget", None, 3),
                ("run", Some("this"), 5),
            ]
        );
    }
}
