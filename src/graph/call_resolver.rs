//! Call-site resolution with tiered confidence
//!
//! A call is matched against, in order:
//!
//! 1. the enclosing file's import map (explicit binding),
//! 2. the enclosing file's own declarations,
//! 3. the global index, taking the earliest registered definition.
//!
//! The first tier that yields a node wins. An explicit import is never
//! overridden by a same-named declaration elsewhere.

use serde::Serialize;
use std::fmt;

use super::import_resolver::ImportMap;
use super::symbol_table::SymbolTable;
use crate::ingest::CallFact;

/// Which strategy produced a CALLS edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    ImportMap,
    Local,
    Global,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::ImportMap => "import_map",
            ResolutionTier::Local => "local",
            ResolutionTier::Global => "global",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved call target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResolution {
    pub node_id: String,
    pub tier: ResolutionTier,
}

/// Resolves call facts against a populated symbol table
#[derive(Debug, Clone, Copy)]
pub struct CallResolver<'a> {
    symbols: &'a SymbolTable,
}

impl<'a> CallResolver<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols }
    }

    /// Resolve one call made in `file`
    ///
    /// Returns None when no tier matches; the caller drops the call.
    pub fn resolve(
        &self,
        file: &str,
        call: &CallFact,
        imports: Option<&ImportMap>,
    ) -> Option<CallResolution> {
        if let Some(node_id) = imports.and_then(|map| self.via_imports(call, map)) {
            return Some(CallResolution {
                node_id: node_id.to_string(),
                tier: ResolutionTier::ImportMap,
            });
        }

        if let Some(node_id) = self.symbols.lookup_local(file, &call.callee) {
            return Some(CallResolution {
                node_id: node_id.to_string(),
                tier: ResolutionTier::Local,
            });
        }

        self.symbols
            .lookup_global(&call.callee)
            .first()
            .map(|def| CallResolution {
                node_id: def.node_id.clone(),
                tier: ResolutionTier::Global,
            })
    }

    fn via_imports(&self, call: &CallFact, map: &ImportMap) -> Option<&'a str> {
        match &call.receiver {
            // ns.fn() where ns is a module alias
            Some(receiver) => {
                let binding = map.get(receiver).filter(|b| b.namespace)?;
                self.symbols.lookup_local(&binding.target_file, &call.callee)
            }
            None => {
                if let Some(binding) = map.get(&call.callee) {
                    let name = if binding.namespace {
                        &call.callee
                    } else {
                        &binding.imported_name
                    };
                    if let Some(id) = self.symbols.lookup_local(&binding.target_file, name) {
                        return Some(id);
                    }
                }
                map.wildcards()
                    .iter()
                    .find_map(|target| self.symbols.lookup_local(target, &call.callee))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ImportBinding;
    use crate::ingest::SymbolKind;

    fn call(callee: &str) -> CallFact {
        CallFact {
            callee: callee.to_string(),
            receiver: None,
            line: 1,
        }
    }

    fn member_call(receiver: &str, callee: &str) -> CallFact {
        CallFact {
            callee: callee.to_string(),
            receiver: Some(receiver.to_string()),
            line: 1,
        }
    }

    fn binding(target: &str, imported: &str, namespace: bool) -> ImportBinding {
        ImportBinding {
            target_file: target.to_string(),
            imported_name: imported.to_string(),
            namespace,
        }
    }

    #[test]
    fn test_import_map_beats_local_declaration() {
        let mut symbols = SymbolTable::new();
        symbols.register("x.ts", "foo", "Function:x.ts:foo:1", SymbolKind::Function);
        symbols.register("b.ts", "foo", "Function:b.ts:foo:1", SymbolKind::Function);

        let mut imports = ImportMap::new();
        imports.insert("foo", binding("x.ts", "foo", false));

        let resolved = CallResolver::new(&symbols)
            .resolve("b.ts", &call("foo"), Some(&imports))
            .unwrap();
        assert_eq!(resolved.node_id, "Function:x.ts:foo:1");
        assert_eq!(resolved.tier, ResolutionTier::ImportMap);
    }

    #[test]
    fn test_aliased_import_looks_up_imported_name() {
        let mut symbols = SymbolTable::new();
        symbols.register("a.ts", "original", "Function:a.ts:original:2", SymbolKind::Function);

        let mut imports = ImportMap::new();
        imports.insert("renamed", binding("a.ts", "original", false));

        let resolved = CallResolver::new(&symbols)
            .resolve("b.ts", &call("renamed"), Some(&imports))
            .unwrap();
        assert_eq!(resolved.node_id, "Function:a.ts:original:2");
    }

    #[test]
    fn test_namespace_member_call() {
        let mut symbols = SymbolTable::new();
        symbols.register("util.py", "slugify", "Function:util.py:slugify:1", SymbolKind::Function);

        let mut imports = ImportMap::new();
        imports.insert("u", binding("util.py", "u", true));

        let resolved = CallResolver::new(&symbols)
            .resolve("main.py", &member_call("u", "slugify"), Some(&imports))
            .unwrap();
        assert_eq!(resolved.tier, ResolutionTier::ImportMap);
    }

    #[test]
    fn test_local_scope_when_not_imported() {
        let mut symbols = SymbolTable::new();
        symbols.register("a.ts", "helper", "Function:a.ts:helper:1", SymbolKind::Function);
        symbols.register("b.ts", "helper", "Function:b.ts:helper:5", SymbolKind::Function);

        let resolved = CallResolver::new(&symbols)
            .resolve("b.ts", &call("helper"), None)
            .unwrap();
        assert_eq!(resolved.node_id, "Function:b.ts:helper:5");
        assert_eq!(resolved.tier, ResolutionTier::Local);
    }

    #[test]
    fn test_global_fallback_takes_earliest_registration() {
        let mut symbols = SymbolTable::new();
        symbols.register("a.ts", "init", "Function:a.ts:init:1", SymbolKind::Function);
        symbols.register("b.ts", "init", "Function:b.ts:init:1", SymbolKind::Function);

        let resolved = CallResolver::new(&symbols)
            .resolve("c.ts", &call("init"), None)
            .unwrap();
        assert_eq!(resolved.node_id, "Function:a.ts:init:1");
        assert_eq!(resolved.tier, ResolutionTier::Global);
    }

    #[test]
    fn test_import_miss_falls_through() {
        let mut symbols = SymbolTable::new();
        symbols.register("c.ts", "foo", "Function:c.ts:foo:1", SymbolKind::Function);

        // Bound to a file that does not declare foo
        let mut imports = ImportMap::new();
        imports.insert("foo", binding("a.ts", "foo", false));

        let resolved = CallResolver::new(&symbols)
            .resolve("b.ts", &call("foo"), Some(&imports))
            .unwrap();
        assert_eq!(resolved.tier, ResolutionTier::Global);
    }

    #[test]
    fn test_wildcard_import() {
        let mut symbols = SymbolTable::new();
        symbols.register("early.py", "run", "Function:early.py:run:1", SymbolKind::Function);
        symbols.register("helpers.py", "run", "Function:helpers.py:run:3", SymbolKind::Function);

        let mut imports = ImportMap::new();
        imports.add_wildcard("helpers.py");

        let resolved = CallResolver::new(&symbols)
            .resolve("main.py", &call("run"), Some(&imports))
            .unwrap();
        assert_eq!(resolved.node_id, "Function:helpers.py:run:3");
        assert_eq!(resolved.tier, ResolutionTier::ImportMap);
    }

    #[test]
    fn test_unknown_call_is_dropped() {
        let symbols = SymbolTable::new();
        assert!(CallResolver::new(&symbols)
            .resolve("b.ts", &call("bar"), None)
            .is_none());
    }
}
