use std::collections::HashMap;

use crate::{
    assets::decode::{PreparedAudio, PreparedImage},
    foundation::core::NodeId,
    foundation::error::{ViewerError, ViewerResult},
    graph::node_graph::NodeGraph,
};

#[derive(Clone, Debug)]
/// Both decoded assets of one node.
pub struct NodeAssets {
    /// Decoded image.
    pub image: PreparedImage,
    /// Decoded sound.
    pub audio: PreparedAudio,
}

#[derive(Clone, Debug, Default)]
/// Immutable per-node asset table produced by the loader.
pub struct LoadedAssets {
    by_node: HashMap<NodeId, NodeAssets>,
}

impl LoadedAssets {
    /// Build a table from already decoded assets.
    pub fn from_map(by_node: HashMap<NodeId, NodeAssets>) -> Self {
        Self { by_node }
    }

    /// Assets of node `id`.
    pub fn get(&self, id: &str) -> ViewerResult<&NodeAssets> {
        self.by_node.get(id).ok_or_else(|| {
            ViewerError::validation(format!("no loaded assets for node '{id}'"))
        })
    }

    /// Fail unless every node of `graph` has its assets.
    pub fn ensure_covers(&self, graph: &NodeGraph) -> ViewerResult<()> {
        for node in graph.nodes() {
            self.get(node.id.as_str())?;
        }
        Ok(())
    }

    /// Number of nodes with assets.
    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    /// Whether no node has assets.
    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}
