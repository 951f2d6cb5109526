//! Folder/file containment tree
//!
//! Builds one Folder node per unique path prefix plus one File node per path,
//! linked by CONTAINS edges. All top-level entries hang off the root folder
//! (empty path), so the result is always a single-rooted tree.

use std::collections::HashSet;

use super::model::{file_id, folder_id, CodeNode, CodeRelation, RelationType};
use super::{CodeGraph, GraphError};

/// Builds the containment tree into a `CodeGraph`
///
/// Memoizes folder prefixes across calls, so feeding the same path twice is a
/// no-op and repeated prefixes reuse the existing node.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    seen_folders: HashSet<String>,
    seen_files: HashSet<String>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the root folder exists
    pub fn add_root(&mut self, graph: &mut CodeGraph) {
        if self.seen_folders.insert(String::new()) {
            graph.add_node(CodeNode::folder(""));
        }
    }

    /// Add a single file path and all of its ancestor folders
    ///
    /// `content` becomes the File node content. Paths are expected in the
    /// normalized form produced by the extractor (forward slashes, no leading
    /// `./` or `/`).
    pub fn add_path(
        &mut self,
        graph: &mut CodeGraph,
        path: &str,
        content: String,
    ) -> Result<(), GraphError> {
        self.add_root(graph);

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Ok(());
        }

        let mut parent_id = folder_id("");
        let mut prefix = String::new();

        for segment in &segments[..segments.len() - 1] {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            if self.seen_folders.insert(prefix.clone()) {
                graph.add_node(CodeNode::folder(&prefix));
                graph.add_relation(CodeRelation::new(
                    parent_id.clone(),
                    folder_id(&prefix),
                    RelationType::Contains,
                ))?;
            }
            parent_id = folder_id(&prefix);
        }

        let file_path = segments.join("/");
        if self.seen_files.insert(file_path.clone()) {
            graph.add_node(CodeNode::file(&file_path, content));
            graph.add_relation(CodeRelation::new(
                parent_id,
                file_id(&file_path),
                RelationType::Contains,
            ))?;
        }

        Ok(())
    }

    /// Build the tree for a whole path sequence (content left empty)
    pub fn build<'a, I>(paths: I) -> Result<CodeGraph, GraphError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut graph = CodeGraph::new();
        let mut builder = StructureBuilder::new();
        builder.add_root(&mut graph);
        for path in paths {
            builder.add_path(&mut graph, path, String::new())?;
        }
        Ok(graph)
    }

    pub fn folder_count(&self) -> usize {
        self.seen_folders.len()
    }

    pub fn file_count(&self) -> usize {
        self.seen_files.len()
    }
}
