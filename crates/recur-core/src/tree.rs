//! Nested JSON form of a host document.
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": "1:2", "kind": { "type": "RECTANGLE" }, "width": 100, "height": 100 },
//!     { "id": "1:3", "kind": { "type": "GROUP" }, "children": [ ... ] }
//!   ],
//!   "selection": ["1:2"]
//! }
//! ```

use crate::error::GraphError;
use crate::id::NodeId;
use crate::model::{SceneGraph, SceneNode};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// One node with its children inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTree {
    #[serde(flatten)]
    pub node: SceneNode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentTree>,
}

impl DocumentTree {
    pub fn leaf(node: SceneNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

/// A page worth of top-level nodes plus the current selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<DocumentTree>,
    #[serde(default)]
    pub selection: Vec<NodeId>,
}

impl SceneGraph {
    /// Build a graph from a nested document. Ids must be unique, and every
    /// selected id must exist.
    pub fn from_document(doc: Document) -> Result<Self, GraphError> {
        let mut sg = SceneGraph::new();
        let root = sg.root;
        for tree in doc.nodes {
            insert_tree(&mut sg, root, tree)?;
        }

        let selection = doc
            .selection
            .into_iter()
            .map(|id| sg.index_of(id).ok_or(GraphError::UnknownId(id)))
            .collect::<Result<Vec<_>, _>>()?;
        sg.set_selection(selection);
        Ok(sg)
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let doc: Document =
            serde_json::from_str(json).map_err(|e| GraphError::json(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Snapshot the graph as a nested document.
    pub fn to_document(&self) -> Document {
        let nodes = self
            .children(self.root)
            .iter()
            .filter_map(|&idx| self.subtree(idx))
            .collect();
        let selection = self
            .selection()
            .iter()
            .filter_map(|&idx| self.get(idx).map(|n| n.id))
            .collect();
        Document { nodes, selection }
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string(&self.to_document()).map_err(|e| GraphError::json(e.to_string()))
    }

    fn subtree(&self, idx: NodeIndex) -> Option<DocumentTree> {
        let node = self.get(idx)?.clone();
        let children = self
            .children(idx)
            .iter()
            .filter_map(|&c| self.subtree(c))
            .collect();
        Some(DocumentTree { node, children })
    }
}

fn insert_tree(sg: &mut SceneGraph, parent: NodeIndex, tree: DocumentTree) -> Result<(), GraphError> {
    let DocumentTree { mut node, children } = tree;
    if sg.index_of(node.id).is_some() {
        return Err(GraphError::DuplicateId(node.id));
    }
    node.fill_missing_paints();
    let idx = sg.add_node(parent, node);
    for child in children {
        insert_tree(sg, idx, child)?;
    }
    Ok(())
}
