pub(crate) mod model;
pub(crate) mod node_graph;
