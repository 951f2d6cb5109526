//! In-memory code graph and the components that populate it
//!
//! `CodeGraph` is the node/edge set a pipeline run produces. It enforces the
//! one structural invariant every phase relies on: an edge can only be added
//! once both of its endpoints exist.

pub mod cache;
pub mod call_resolver;
pub mod import_resolver;
pub mod model;
pub mod structure;
pub mod symbol_table;
pub mod tree_pool;

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

pub use cache::{AstCache, CacheStats, DEFAULT_AST_CACHE_CAPACITY};
pub use call_resolver::{CallResolution, CallResolver, ResolutionTier};
pub use import_resolver::{FileImports, ImportBinding, ImportMap, ImportResolver, ResolvedImport};
pub use model::{CodeNode, CodeRelation, NodeLabel, RelationType};
pub use structure::StructureBuilder;
pub use symbol_table::{SymbolDefinition, SymbolTable};
pub use tree_pool::{TreeHandle, TreePool, TreeSlot};

/// Errors raised when mutating the graph
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    /// An edge endpoint does not exist in the node set
    #[error("relation {relation} references missing node {missing}")]
    DanglingEndpoint { relation: String, missing: String },
}

/// Ordered node and edge set
///
/// Insertion order is preserved, so two runs over identical input produce
/// identical vectors. Nodes are unique by id; relations are unique by
/// (from, kind, to).
#[derive(Debug, Default, Clone)]
pub struct CodeGraph {
    nodes: Vec<CodeNode>,
    node_index: HashMap<String, usize>,
    relations: Vec<CodeRelation>,
    relation_index: HashSet<String>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns false if a node with the same id already exists.
    pub fn add_node(&mut self, node: CodeNode) -> bool {
        if self.node_index.contains_key(&node.id) {
            return false;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Add a relation whose endpoints must already exist.
    ///
    /// Returns Ok(false) when an identical relation is already present.
    pub fn add_relation(&mut self, relation: CodeRelation) -> Result<bool, GraphError> {
        for endpoint in [&relation.from, &relation.to] {
            if !self.node_index.contains_key(endpoint) {
                return Err(GraphError::DanglingEndpoint {
                    relation: relation.id(),
                    missing: endpoint.clone(),
                });
            }
        }

        if !self.relation_index.insert(relation.id()) {
            return Ok(false);
        }
        self.relations.push(relation);
        Ok(true)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&CodeNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn nodes(&self) -> &[CodeNode] {
        &self.nodes
    }

    pub fn relations(&self) -> &[CodeRelation] {
        &self.relations
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn nodes_with_label(&self, label: NodeLabel) -> impl Iterator<Item = &CodeNode> {
        self.nodes.iter().filter(move |n| n.label == label)
    }

    pub fn relations_of_kind(&self, kind: RelationType) -> impl Iterator<Item = &CodeRelation> {
        self.relations.iter().filter(move |r| r.kind == kind)
    }

    /// True if the exact relation exists
    pub fn has_relation(&self, from: &str, to: &str, kind: RelationType) -> bool {
        self.relation_index
            .contains(&CodeRelation::new(from, to, kind).id())
    }

    /// Consume the graph, yielding the node and relation batches for a sink
    pub fn into_parts(self) -> (Vec<CodeNode>, Vec<CodeRelation>) {
        (self.nodes, self.relations)
    }

    /// SHA-256 over the serialized node and relation sequences (hex)
    ///
    /// Two graphs with the same fingerprint have byte-identical batches.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for node in &self.nodes {
            // Serializing plain data structs cannot fail
            if let Ok(bytes) = serde_json::to_vec(node) {
                hasher.update(&bytes);
            }
            hasher.update(b"\n");
        }
        for relation in &self.relations {
            hasher.update(relation.id().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
