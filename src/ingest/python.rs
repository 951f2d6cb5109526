//! Python fact extraction using tree-sitter-python.
//!
//! Functions defined directly in a class body are methods; anything nested
//! inside a function body is a plain function again.

use crate::ingest::{
    field_text, node_text, symbol_fact, CallFact, ImportFact, ImportKind, ImportedName,
    LanguageExtractor, SymbolFact, SymbolKind,
};

/// Extractor for `.py` files
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn definitions(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<SymbolFact> {
        let mut facts = Vec::new();
        walk_definitions(&tree.root_node(), source, false, &mut facts);
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

fn walk_definitions(
    node: &tree_sitter::Node,
    source: &[u8],
    in_class: bool,
    facts: &mut Vec<SymbolFact>,
) {
    let mut child_in_class = in_class;

    match node.kind() {
        "class_definition" => {
            if let Some(name) = field_text(node, "name", source) {
                facts.push(symbol_fact(node, SymbolKind::Class, name));
            }
            child_in_class = true;
        }
        "function_definition" => {
            if let Some(name) = field_text(node, "name", source) {
                let kind = if in_class {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                facts.push(symbol_fact(node, kind, name));
            }
            child_in_class = false;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_definitions(&child, source, child_in_class, facts);
    }
}

fn walk_imports(node: &tree_sitter::Node, source: &[u8], facts: &mut Vec<ImportFact>) {
    match node.kind() {
        "import_statement" => {
            extract_import(node, source, facts);
            return;
        }
        "import_from_statement" => {
            if let Some(fact) = extract_from_import(node, source) {
                facts.push(fact);
            }
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(&child, source, facts);
    }
}

/// `import a.b, c as d` yields one fact per module
fn extract_import(node: &tree_sitter::Node, source: &[u8], facts: &mut Vec<ImportFact>) {
    let line = node.start_position().row + 1;
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let (module, local) = match name.kind() {
            "aliased_import" => {
                let Some(module) = field_text(&name, "name", source) else {
                    continue;
                };
                let alias = field_text(&name, "alias", source).unwrap_or_else(|| module.clone());
                (module, alias)
            }
            _ => {
                let Some(module) = node_text(&name, source) else {
                    continue;
                };
                (module.to_string(), module.to_string())
            }
        };
        facts.push(
            ImportFact::new(module, ImportKind::PythonImport, line)
                .with_names(vec![ImportedName::namespace(local)]),
        );
    }
}

/// `from pkg.mod import a, b as c` / `from . import x` / `from m import *`
fn extract_from_import(node: &tree_sitter::Node, source: &[u8]) -> Option<ImportFact> {
    let module = node.child_by_field_name("module_name")?;
    let specifier: String = node_text(&module, source)?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut fact = ImportFact::new(specifier, ImportKind::PythonFrom, node.start_position().row + 1);

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "aliased_import" => {
                let Some(imported) = field_text(&name, "name", source) else {
                    continue;
                };
                let local = field_text(&name, "alias", source).unwrap_or_else(|| imported.clone());
                fact.names.push(ImportedName::named(imported, local));
            }
            _ => {
                if let Some(imported) = node_text(&name, source) {
                    fact.names.push(ImportedName::named(imported, imported));
                }
            }
        }
    }

    let mut cursor = node.walk();
    fact.is_glob = node
        .children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import");

    Some(fact)
}

fn walk_calls(node: &tree_sitter::Node, source: &[u8], calls: &mut Vec<CallFact>) {
    if node.kind() == "call" {
        if let Some(call) = extract_call(node, source) {
            calls.push(call);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(&child, source, calls);
    }
}

fn extract_call(node: &tree_sitter::Node, source: &[u8]) -> Option<CallFact> {
    let function = node.child_by_field_name("function")?;
    let line = node.start_position().row + 1;
    match function.kind() {
        "identifier" => Some(CallFact {
            callee: node_text(&function, source)?.to_string(),
            receiver: None,
            line,
        }),
        "attribute" => Some(CallFact {
            callee: field_text(&function, "attribute", source)?,
            receiver: field_text(&function, "object", source),
            line,
        }),
        _ => None,
    }
}
