//! Language-specific fact extraction over parsed syntax trees
//!
//! Parsing and extraction are separate steps: `parse` produces a
//! [`SyntaxTree`] that the pipeline caches, and the per-language
//! [`LanguageExtractor`] reads definitions, imports and calls from it.

pub mod detect;
pub mod imports;
pub mod javascript;
pub mod parse;
pub mod pool;
pub mod python;
pub mod typescript;

pub use detect::{detect_language, Language};
pub use imports::{ImportFact, ImportKind, ImportedName};
pub use parse::{ParseCapability, ParseError, SyntaxTree, TreeSitterParser};

use serde::{Deserialize, Serialize};

/// Kind of symbol extracted from source code
///
/// Each kind maps to exactly one definition node label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Free function, or a function value bound to a name
    Function,
    /// Function declared inside a class body
    Method,
    Class,
    /// TypeScript interface
    Interface,
}

impl SymbolKind {
    /// Return the normalized string key for this symbol kind (used for CLI/JSON)
    pub fn normalized_key(&self) -> &'static str {
        match self {
            SymbolKind::Function => "fn",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
        }
    }
}

/// A fact about a declaration extracted from source code
///
/// Pure data structure. No behavior. No semantic analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolFact {
    pub kind: SymbolKind,
    pub name: String,
    /// Byte offset where the declaration starts
    pub byte_start: usize,
    /// Byte offset where the declaration ends
    pub byte_end: usize,
    /// Line where the declaration starts (1-indexed)
    pub start_line: usize,
    /// Line where the declaration ends (1-indexed)
    pub end_line: usize,
}

/// A call site: `callee(...)`, `receiver.callee(...)` or `new callee(...)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallFact {
    pub callee: String,
    /// Source text of the object a member call is made on
    pub receiver: Option<String>,
    /// Line of the call (1-indexed)
    pub line: usize,
}

/// Reads facts out of a parsed tree for one language family
///
/// Implementations are pure: same tree and source, same facts, in source order.
pub trait LanguageExtractor {
    fn definitions(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<SymbolFact>;
    fn imports(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<ImportFact>;
    fn calls(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Vec<CallFact>;
}

/// Extractor for a detected language
pub fn extractor_for(language: Language) -> &'static dyn LanguageExtractor {
    match language {
        Language::TypeScript | Language::Tsx => &typescript::TypeScriptExtractor,
        Language::JavaScript => &javascript::JavaScriptExtractor,
        Language::Python => &python::PythonExtractor,
    }
}

/// UTF-8 text of a node, or None if the range is not valid UTF-8
pub(crate) fn node_text<'a>(node: &tree_sitter::Node, source: &'a [u8]) -> Option<&'a str> {
    crate::common::safe_slice(source, node.start_byte(), node.end_byte())
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
}

/// Text of the node's `name` field
pub(crate) fn field_text(node: &tree_sitter::Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|child| node_text(&child, source))
        .map(str::to_string)
}

/// Build a fact spanning `node`
pub(crate) fn symbol_fact(node: &tree_sitter::Node, kind: SymbolKind, name: String) -> SymbolFact {
    SymbolFact {
        kind,
        name,
        byte_start: node.start_byte(),
        byte_end: node.end_byte(),
        start_line: node.start_position().row + 1, // tree-sitter is 0-indexed
        end_line: node.end_position().row + 1,
    }
}
