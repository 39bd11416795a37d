use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use anyhow::Context;

use crate::{
    foundation::core::NodeId,
    foundation::error::{ViewerError, ViewerResult},
    graph::model::Node,
};

#[derive(serde::Deserialize)]
struct GraphFile {
    nodes: Vec<Node>,
}

#[derive(Clone, Debug)]
/// Validated, immutable node graph.
///
/// Nodes keep their declaration order; the first one is the start node. Every hotspot target
/// is checked against the graph at construction, so lookups through hotspots never dangle.
pub struct NodeGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
}

impl NodeGraph {
    /// Validate `nodes` and build the lookup index.
    pub fn new(nodes: Vec<Node>) -> ViewerResult<Self> {
        if nodes.is_empty() {
            return Err(ViewerError::validation("graph must declare at least one node"));
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            node.validate()?;
            if index.insert(node.id.clone(), i).is_some() {
                return Err(ViewerError::validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        for node in &nodes {
            for hotspot in &node.hotspots {
                if !index.contains_key(&hotspot.target) {
                    tracing::error!(
                        node = %node.id,
                        target = %hotspot.target,
                        "hotspot targets an undeclared node"
                    );
                    return Err(ViewerError::UnknownNode(hotspot.target.clone()));
                }
            }
        }

        Ok(Self { nodes, index })
    }

    /// Parse the JSON authoring format (`{ "nodes": [...] }`) and validate it.
    pub fn from_json_str(json: &str) -> ViewerResult<Self> {
        let file: GraphFile =
            serde_json::from_str(json).map_err(|e| ViewerError::serde(e.to_string()))?;
        Self::new(file.nodes)
    }

    /// Read and validate a JSON graph file.
    pub fn from_json_file(path: &Path) -> ViewerResult<Self> {
        let f = File::open(path).with_context(|| format!("open graph '{}'", path.display()))?;
        let file: GraphFile = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ViewerError::serde(format!("graph '{}': {e}", path.display())))?;
        Self::new(file.nodes)
    }

    /// Lookup a node by id.
    pub fn by_id(&self, id: &str) -> ViewerResult<&Node> {
        self.index
            .get(id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| ViewerError::unknown_node(id))
    }

    /// First declared node.
    pub fn start(&self) -> &Node {
        &self.nodes[0]
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed graph.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/node_graph.rs"]
mod tests;
