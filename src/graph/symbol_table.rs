//! Dual-scope index of declared symbols
//!
//! The file index answers "what does this name mean inside this file"; the
//! global index answers "who declares this name anywhere". Both store node ids
//! of definitions that were already added to the graph, so a lookup can never
//! return a dangling id.
//!
//! There is no removal: a table lives for one pipeline run.

use serde::Serialize;
use std::collections::HashMap;

use crate::ingest::SymbolKind;

/// A declared symbol, as recorded in the global index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolDefinition {
    pub name: String,
    pub node_id: String,
    pub file_path: String,
    pub kind: SymbolKind,
}

/// In-memory index: file → (name → node id), name → definitions
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_file: HashMap<String, HashMap<String, String>>,
    global: HashMap<String, Vec<SymbolDefinition>>,
    registered: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration
    ///
    /// A file that declares the same name twice keeps the later node id in the
    /// file index; the global index keeps both, in registration order.
    pub fn register(&mut self, file_path: &str, name: &str, node_id: &str, kind: SymbolKind) {
        self.by_file
            .entry(file_path.to_string())
            .or_default()
            .insert(name.to_string(), node_id.to_string());

        self.global
            .entry(name.to_string())
            .or_default()
            .push(SymbolDefinition {
                name: name.to_string(),
                node_id: node_id.to_string(),
                file_path: file_path.to_string(),
                kind,
            });

        self.registered += 1;
    }

    /// Exact-match lookup within one file
    pub fn lookup_local(&self, file_path: &str, name: &str) -> Option<&str> {
        self.by_file
            .get(file_path)
            .and_then(|names| names.get(name))
            .map(String::as_str)
    }

    /// All definitions of `name`, earliest registered first
    pub fn lookup_global(&self, name: &str) -> &[SymbolDefinition] {
        self.global.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names declared in `file_path`, sorted
    pub fn file_symbols(&self, file_path: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_file
            .get(file_path)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Total registrations, including redeclarations
    pub fn len(&self) -> usize {
        self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    /// Every node id held by either index
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.by_file
            .values()
            .flat_map(|m| m.values().map(String::as_str))
            .chain(
                self.global
                    .values()
                    .flat_map(|defs| defs.iter().map(|d| d.node_id.as_str())),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_local_exact_match() {
        let mut table = SymbolTable::new();
        table.register("a.ts", "foo", "Function:a.ts:foo:1", SymbolKind::Function);

        assert_eq!(table.lookup_local("a.ts", "foo"), Some("Function:a.ts:foo:1"));
        assert_eq!(table.lookup_local("a.ts", "Foo"), None);
        assert_eq!(table.lookup_local("b.ts", "foo"), None);
    }

    #[test]
    fn test_lookup_global_preserves_registration_order() {
        let mut table = SymbolTable::new();
        table.register("a.ts", "init", "Function:a.ts:init:1", SymbolKind::Function);
        table.register("b.py", "init", "Function:b.py:init:4", SymbolKind::Function);
        table.register("c.js", "init", "Method:c.js:init:9", SymbolKind::Method);

        let files: Vec<_> = table
            .lookup_global("init")
            .iter()
            .map(|d| d.file_path.as_str())
            .collect();
        assert_eq!(files, vec!["a.ts", "b.py", "c.js"]);
        assert!(table.lookup_global("missing").is_empty());
    }

    #[test]
    fn test_redeclaration_last_write_wins_locally() {
        let mut table = SymbolTable::new();
        table.register("a.py", "run", "Function:a.py:run:1", SymbolKind::Function);
        table.register("a.py", "run", "Function:a.py:run:10", SymbolKind::Function);

        assert_eq!(table.lookup_local("a.py", "run"), Some("Function:a.py:run:10"));
        assert_eq!(table.lookup_global("run").len(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_file_symbols_sorted() {
        let mut table = SymbolTable::new();
        table.register("a.ts", "zeta", "Function:a.ts:zeta:1", SymbolKind::Function);
        table.register("a.ts", "Alpha", "Class:a.ts:Alpha:3", SymbolKind::Class);

        assert_eq!(table.file_symbols("a.ts"), vec!["Alpha", "zeta"]);
        assert!(table.file_symbols("none.ts").is_empty());
    }
}
