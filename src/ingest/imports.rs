//! Import statement facts
//!
//! Extractors describe each import syntactically; resolving a specifier to a
//! file is the job of `graph::ImportResolver`.

use serde::{Deserialize, Serialize};

/// Kind of import statement
///
/// The kind decides how a specifier is interpreted: ECMAScript kinds carry a
/// path-like module specifier, Python kinds a dotted module name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `import ... from "x"` or `import "x"`
    EsImport,
    /// `export ... from "x"`
    ReExport,
    /// `require("x")`, including TypeScript `import x = require("x")`
    Require,
    /// Python `import a.b [as c]`
    PythonImport,
    /// Python `from a.b import c [as d]`
    PythonFrom,
}

impl ImportKind {
    /// Return the normalized string key for this import kind (used for storage)
    pub fn normalized_key(&self) -> &'static str {
        match self {
            ImportKind::EsImport => "es_import",
            ImportKind::ReExport => "re_export",
            ImportKind::Require => "require",
            ImportKind::PythonImport => "import_statement",
            ImportKind::PythonFrom => "from_import",
        }
    }

    pub fn is_python(&self) -> bool {
        matches!(self, ImportKind::PythonImport | ImportKind::PythonFrom)
    }
}

/// One name bound by an import
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedName {
    /// Name visible in the importing file
    pub local: String,
    /// Name looked up in the target module
    pub imported: String,
    /// The local name refers to the whole module object
    pub namespace: bool,
}

impl ImportedName {
    pub fn named(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            imported: imported.into(),
            namespace: false,
        }
    }

    pub fn namespace(local: impl Into<String>) -> Self {
        let local = local.into();
        Self {
            imported: local.clone(),
            local,
            namespace: true,
        }
    }
}

/// A fact about an import statement extracted from source code
///
/// Pure data structure. No behavior. No semantic analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportFact {
    /// Raw specifier: `./util`, `../a`, `pkg.mod`, `..sibling`
    pub specifier: String,
    pub kind: ImportKind,
    /// Names bound in the importing file (empty for side-effect imports)
    pub names: Vec<ImportedName>,
    /// `*` import: every name of the target becomes visible
    pub is_glob: bool,
    /// Line where the import starts (1-indexed)
    pub line: usize,
}

impl ImportFact {
    pub fn new(specifier: impl Into<String>, kind: ImportKind, line: usize) -> Self {
        Self {
            specifier: specifier.into(),
            kind,
            names: Vec::new(),
            is_glob: false,
            line,
        }
    }

    pub fn with_names(mut self, names: Vec<ImportedName>) -> Self {
        self.names = names;
        self
    }
}

/// Strip the quotes from a string literal node's text
pub(crate) fn unquote(literal: &str) -> &str {
    literal.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"./a\""), "./a");
        assert_eq!(unquote("'./b'"), "./b");
        assert_eq!(unquote("`c`"), "c");
    }

    #[test]
    fn test_namespace_binding_imports_itself() {
        let name = ImportedName::namespace("utils");
        assert_eq!(name.local, "utils");
        assert_eq!(name.imported, "utils");
        assert!(name.namespace);
    }
}
