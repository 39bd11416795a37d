use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use crossbeam_channel::RecvTimeoutError;

use crate::{
    assets::decode::{self, PreparedAudio, PreparedImage},
    assets::source::{AssetKind, AssetSource},
    assets::store::{LoadedAssets, NodeAssets},
    foundation::core::NodeId,
    foundation::error::{ViewerError, ViewerResult},
    graph::node_graph::NodeGraph,
};

#[derive(Clone, Debug)]
/// Asset loading options.
pub struct LoadOpts {
    /// Longest wait for the *next* completion before the load is declared stalled.
    pub stall_timeout: Duration,
}

impl Default for LoadOpts {
    fn default() -> Self {
        Self {
            stall_timeout: Duration::from_secs(30),
        }
    }
}

/// Readiness barrier over `2 × node_count` asset completions.
///
/// Completions may arrive in any order; a repeated completion for the same asset is ignored so a
/// double report can never release the barrier early.
#[derive(Clone, Debug)]
pub struct LoadCountdown {
    remaining: usize,
    done: HashSet<(NodeId, AssetKind)>,
}

impl LoadCountdown {
    /// Countdown for `node_count` nodes.
    pub fn new(node_count: usize) -> Self {
        Self {
            remaining: node_count * AssetKind::ALL.len(),
            done: HashSet::new(),
        }
    }

    /// Record one completion. Returns `true` once every asset has completed.
    pub fn complete(&mut self, node_id: &NodeId, kind: AssetKind) -> bool {
        if self.remaining > 0 && self.done.insert((node_id.clone(), kind)) {
            self.remaining -= 1;
        }
        self.is_ready()
    }

    /// Completions still missing.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whether readiness has fired.
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    /// Whether a given asset already completed.
    pub fn is_done(&self, node_id: &NodeId, kind: AssetKind) -> bool {
        self.done.contains(&(node_id.clone(), kind))
    }

    /// First outstanding asset in declaration order, image before audio.
    pub fn first_pending<'g>(&self, graph: &'g NodeGraph) -> Option<(&'g NodeId, AssetKind)> {
        graph.nodes().iter().find_map(|node| {
            AssetKind::ALL
                .into_iter()
                .find(|&kind| !self.is_done(&node.id, kind))
                .map(|kind| (&node.id, kind))
        })
    }
}

enum Loaded {
    Image(PreparedImage),
    Audio(PreparedAudio),
}

struct Completion {
    node_id: NodeId,
    kind: AssetKind,
    result: anyhow::Result<Loaded>,
}

/// Fetch and decode every node's image and sound, concurrently.
///
/// Returns only once all `2 × graph.len()` assets are decoded. The first failing asset aborts
/// the load with [`ViewerError::AssetLoad`]; so does a stall longer than
/// [`LoadOpts::stall_timeout`], reported against the first outstanding asset.
#[tracing::instrument(skip_all, fields(nodes = graph.len()))]
pub fn load_all(
    graph: &NodeGraph,
    source: Arc<dyn AssetSource>,
    opts: &LoadOpts,
) -> ViewerResult<LoadedAssets> {
    let (tx, rx) = crossbeam_channel::unbounded::<Completion>();

    for node in graph.nodes() {
        for kind in AssetKind::ALL {
            let tx = tx.clone();
            let source = Arc::clone(&source);
            let node_id = node.id.clone();
            let file_name = match kind {
                AssetKind::Image => node.image.file_name.clone(),
                AssetKind::Audio => node.audio.file_name.clone(),
            };
            rayon::spawn(move || {
                let result = load_one(source.as_ref(), kind, &file_name);
                // The receiver is gone once loading failed or timed out.
                let _ = tx.send(Completion {
                    node_id,
                    kind,
                    result,
                });
            });
        }
    }
    drop(tx);

    let mut countdown = LoadCountdown::new(graph.len());
    let mut images = HashMap::<NodeId, PreparedImage>::new();
    let mut sounds = HashMap::<NodeId, PreparedAudio>::new();

    while !countdown.is_ready() {
        let completion = match rx.recv_timeout(opts.stall_timeout) {
            Ok(c) => c,
            Err(RecvTimeoutError::Timeout) => {
                let (node_id, kind) = countdown
                    .first_pending(graph)
                    .map(|(id, kind)| (id.clone(), kind))
                    .unwrap_or_else(|| (graph.start().id.clone(), AssetKind::Image));
                tracing::error!(node = %node_id, %kind, "asset load stalled");
                return Err(ViewerError::asset_load(
                    node_id,
                    kind,
                    format!(
                        "no progress within {:.3}s",
                        opts.stall_timeout.as_secs_f64()
                    ),
                ));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ViewerError::Other(anyhow::anyhow!(
                    "asset workers exited with {} asset(s) outstanding",
                    countdown.remaining()
                )));
            }
        };

        match completion.result {
            Ok(Loaded::Image(img)) => {
                images.insert(completion.node_id.clone(), img);
            }
            Ok(Loaded::Audio(audio)) => {
                sounds.insert(completion.node_id.clone(), audio);
            }
            Err(cause) => {
                tracing::error!(
                    node = %completion.node_id,
                    kind = %completion.kind,
                    "asset load failed: {cause:#}"
                );
                return Err(ViewerError::asset_load(
                    completion.node_id,
                    completion.kind,
                    cause,
                ));
            }
        }

        tracing::debug!(
            node = %completion.node_id,
            kind = %completion.kind,
            remaining = countdown.remaining().saturating_sub(1),
            "asset loaded"
        );
        countdown.complete(&completion.node_id, completion.kind);
    }

    let mut by_node = HashMap::with_capacity(graph.len());
    for node in graph.nodes() {
        let (Some(image), Some(audio)) = (images.remove(&node.id), sounds.remove(&node.id))
        else {
            return Err(ViewerError::Other(anyhow::anyhow!(
                "readiness fired without both assets of node '{}'",
                node.id
            )));
        };
        by_node.insert(node.id.clone(), NodeAssets { image, audio });
    }

    tracing::info!(nodes = by_node.len(), "all assets loaded");
    Ok(LoadedAssets::from_map(by_node))
}

fn load_one(source: &dyn AssetSource, kind: AssetKind, file_name: &str) -> anyhow::Result<Loaded> {
    let bytes = source.fetch(kind, file_name)?;
    Ok(match kind {
        AssetKind::Image => Loaded::Image(decode::decode_image(&bytes)?),
        AssetKind::Audio => Loaded::Audio(decode::decode_wav(&bytes)?),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
