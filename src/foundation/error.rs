use crate::{assets::source::AssetKind, foundation::core::NodeId};

/// Convenience result type used across the viewer.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Boxed lower-level failure carried by [`ViewerError::AssetLoad`].
pub type LoadCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error taxonomy used by viewer APIs.
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    /// Invalid authoring data, scripts, or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// A node id that is not declared in the graph.
    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),

    /// Fetching or decoding one asset failed or stalled.
    #[error("failed to load {kind} asset for node '{node_id}': {cause}")]
    AssetLoad {
        /// Node that owns the asset.
        node_id: NodeId,
        /// Which of the node's assets failed.
        kind: AssetKind,
        /// Underlying failure.
        #[source]
        cause: LoadCause,
    },

    /// The host has no usable audio output.
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ViewerError {
    /// Build a [`ViewerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ViewerError::UnknownNode`] value.
    pub fn unknown_node(id: impl Into<NodeId>) -> Self {
        Self::UnknownNode(id.into())
    }

    /// Build a [`ViewerError::AssetLoad`] value.
    pub fn asset_load(node_id: NodeId, kind: AssetKind, cause: impl Into<LoadCause>) -> Self {
        Self::AssetLoad {
            node_id,
            kind,
            cause: cause.into(),
        }
    }

    /// Build a [`ViewerError::AudioUnavailable`] value.
    pub fn audio_unavailable(msg: impl Into<String>) -> Self {
        Self::AudioUnavailable(msg.into())
    }

    /// Build a [`ViewerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
