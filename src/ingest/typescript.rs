//! TypeScript fact extraction using tree-sitter-typescript.
//!
//! Shares the ECMAScript walkers with JavaScript and adds interfaces and
//! abstract classes. `.tsx` files go through the same extractor; only the
//! grammar differs.

use crate::ingest::javascript::{walk_calls, walk_definitions, walk_imports};
use crate::ingest::{CallFact, ImportFact, LanguageExtractor, SymbolFact};

/// Extractor for `.ts` and `.tsx`
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptExtractor;

impl LanguageExtractor for TypeScriptExtractor {
    fn definitions(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<SymbolFact> {
        let mut facts = Vec::new();
        walk_definitions(&tree.root_node(), source, false, true, &mut facts);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::pool::with_parser;
    use crate::ingest::{ImportKind, ImportedName, Language, SymbolKind};

    fn parse(language: Language, source: &str) -> tree_sitter::Tree {
        with_parser(language, |p| p.parse(source, None))
            .unwrap()
            .unwrap()
    }

    fn definitions(source: &str) -> Vec<(SymbolKind, String)> {
        let tree = parse(Language::TypeScript, source);
        TypeScriptExtractor
            .definitions(&tree, source.as_bytes())
            .into_iter()
            .map(|f| (f.kind, f.name))
            .collect()
    }

    #[test]
    fn test_extract_exported_function() {
        let defs = definitions("export function foo(): number { return 1; }\n");
        assert_eq!(defs, vec![(SymbolKind::Function, "foo".to_string())]);
    }

    #[test]
    fn test_extract_interface_and_abstract_class() {
        let defs = definitions(
            "interface Shape { area(): number; }\nexport abstract class Base implements Shape {\n  abstract area(): number;\n  describe(): string { return ''; }\n}\n",
        );
        assert_eq!(
            defs,
            vec![
                (SymbolKind::Interface, "Shape".to_string()),
                (SymbolKind::Class, "Base".to_string()),
                (SymbolKind::Method, "describe".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_arrow_field_as_method() {
        let defs = definitions("class Store {\n  load = async () => { fetchAll(); };\n  count = 0;\n}\n");
        assert_eq!(
            defs,
            vec![
                (SymbolKind::Class, "Store".to_string()),
                (SymbolKind::Method, "load".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_typed_arrow_binding() {
        let defs = definitions("export const handler = (req: Request): void => {};\n");
        assert_eq!(defs, vec![(SymbolKind::Function, "handler".to_string())]);
    }

    #[test]
    fn test_import_forms() {
        let source = "import { foo } from './a';\nimport type { T } from './types';\nimport fs = require('fs');\nexport { bar } from './b';\n";
        let tree = parse(Language::TypeScript, source);
        let imports = TypeScriptExtractor.imports(&tree, source.as_bytes());

        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].names, vec![ImportedName::named("foo", "foo")]);
        assert_eq!(imports[1].specifier, "./types");
        assert_eq!(imports[2].kind, ImportKind::Require);
        assert_eq!(imports[2].specifier, "fs");
        assert_eq!(imports[2].names, vec![ImportedName::namespace("fs")]);
        assert_eq!(imports[3].kind, ImportKind::ReExport);
        assert!(!imports[3].is_glob);
    }

    #[test]
    fn test_tsx_component_calls() {
        let source = "export const App = () => {\n  const data = useData();\n  return <div>{render(data)}</div>;\n};\n";
        let tree = parse(Language::Tsx, source);
        let calls = TypeScriptExtractor.calls(&tree, source.as_bytes());
        let names: Vec<_> = calls.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(names, vec!["useData", "render"]);

        let defs = TypeScriptExtractor.definitions(&tree, source.as_bytes());
        assert_eq!(defs[0].name, "App");
    }
}
