//! Parse capability consumed by the pipeline
//!
//! The pipeline only needs "text in, tree handle out". Everything about the
//! grammar stays behind [`ParseCapability`], and the produced tree is a
//! [`TreeHandle`] so its lifetime is governed by the AST cache.

use crate::graph::TreeHandle;
use crate::ingest::detect::Language;
use crate::ingest::pool::with_parser;

/// Errors from the parse capability
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The grammar could not be loaded into a parser
    #[error("cannot load {language} grammar: {message}")]
    Grammar { language: Language, message: String },

    #[error("no {0} parser available on this thread")]
    ParserUnavailable(Language),

    /// The parser gave up without producing a tree
    #[error("parser produced no tree for {path}")]
    NoTree { path: String },
}

/// Turns source text into a syntax tree
pub trait ParseCapability {
    /// Parse `source` as `language`. `path` is used for error context only.
    fn parse(&mut self, path: &str, source: &str, language: Language)
        -> Result<SyntaxTree, ParseError>;
}

/// A parsed file
///
/// Owns the native tree-sitter tree; releasing the handle frees it.
#[derive(Debug)]
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    language: Language,
}

impl SyntaxTree {
    pub fn new(tree: tree_sitter::Tree, language: Language) -> Self {
        Self { tree, language }
    }

    pub fn tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// True if the parser had to recover from syntax errors
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

impl TreeHandle for SyntaxTree {
    fn release(self) {
        drop(self.tree);
    }
}

/// tree-sitter backed parse capability using the thread-local parser pool
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterParser;

impl TreeSitterParser {
    pub fn new() -> Self {
        Self
    }
}

impl ParseCapability for TreeSitterParser {
    fn parse(
        &mut self,
        path: &str,
        source: &str,
        language: Language,
    ) -> Result<SyntaxTree, ParseError> {
        let tree = with_parser(language, |parser| parser.parse(source, None))?;
        tree.map(|tree| SyntaxTree::new(tree, language))
            .ok_or_else(|| ParseError::NoTree {
                path: path.to_string(),
            })
    }
}
