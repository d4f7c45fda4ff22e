// src/types.rs
//
// Common shared types for the flexgrid RSA core.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Topology node identifier.
pub type NodeId = u32;

/// Index of a frequency slot in `[0, num_channels)`.
pub type SlotIndex = usize;

/// Map from (source, destination) to the precomputed ordered candidate
/// paths for that pair. The position of a path in its list is the path
/// index used by the action codec, so list order must stay stable for
/// the lifetime of an agent.
pub type KPaths = HashMap<(NodeId, NodeId), Vec<Path>>;

/// An ordered sequence of nodes from source to destination.
///
/// Identity is the node sequence itself: two `Path` values compare equal
/// iff they traverse the same nodes in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    nodes: Vec<NodeId>,
}

impl Path {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Number of hops (edges) on the path.
    pub fn hop_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Iterate the fiber edges traversed by the path, as normalized keys.
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.nodes.windows(2).map(|w| EdgeKey::new(w[0], w[1]))
    }

    pub fn source(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

impl From<Vec<NodeId>> for Path {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self::new(nodes)
    }
}

/// Normalized key for an undirected fiber edge.
///
/// The smaller node id always comes first, so `(a, b)` and `(b, a)`
/// address the same occupancy bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    a: NodeId,
    b: NodeId,
}

impl EdgeKey {
    pub fn new(u: NodeId, v: NodeId) -> Self {
        if u <= v {
            Self { a: u, b: v }
        } else {
            Self { a: v, b: u }
        }
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.a, self.b)
    }
}

/// A modulation format and the minimum end-to-end GSNR it tolerates.
///
/// The position of a format in the configured list is the modulation
/// index used by the action codec; the list order must stay stable for
/// the lifetime of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulationFormat {
    /// Stable format name, e.g. `"16QAM"`.
    pub name: String,
    /// Feasibility threshold: every slot of an allocated block must see
    /// at least this GSNR (dB) along the whole path.
    pub gsnr_threshold_db: f64,
}

impl ModulationFormat {
    pub fn new(name: &str, gsnr_threshold_db: f64) -> Self {
        Self {
            name: name.to_string(),
            gsnr_threshold_db,
        }
    }
}

/// A fully specified allocation decision for one connection request:
/// which candidate path, which modulation format, and which contiguous
/// slot block `[start_slot, start_slot + required_slots)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub path: Path,
    /// Modulation format name; must match an entry of the configured
    /// format list.
    pub modulation: String,
    pub start_slot: SlotIndex,
    /// Width of the slot block, in `[1, max_required_slots]`.
    pub required_slots: usize,
}
