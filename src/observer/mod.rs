#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::link::Link;
use crate::network::{Diagnostics, Network};
use crate::node::{Node, NodeId, NodeState, Polarity};

/// A read-only snapshot of the network for renderers and charts.
///
/// Design intent:
/// - Observers cannot mutate or steer the network.
/// - Snapshotting is *on-demand* and allocates; stepping stays unchanged.
/// - Layout (positions, colors) is the consumer's business; only node and
///   link attributes are exported.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkSnapshot {
    pub shape: Vec<usize>,
    pub nodes: Vec<NodeSnapshot>,
    pub links: Vec<LinkSnapshot>,
    pub diagnostics: Diagnostics,
    pub avalanche_counts: Vec<usize>,
    pub avalanche_sizes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub layer: usize,
    pub polarity: Polarity,
    pub state: NodeState,
    pub total_input: f64,
    pub output: f64,
    pub in_degree: usize,
    pub out_degree: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkSnapshot {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub is_active: bool,
    pub is_same_layer: bool,
}

impl From<&Node> for NodeSnapshot {
    fn from(n: &Node) -> Self {
        Self {
            id: n.id(),
            layer: n.layer(),
            polarity: n.polarity(),
            state: n.state(),
            total_input: n.total_input(),
            output: n.output(),
            in_degree: n.in_degree(),
            out_degree: n.out_degree(),
        }
    }
}

impl From<&Link> for LinkSnapshot {
    fn from(l: &Link) -> Self {
        Self {
            id: l.id(),
            source: l.source(),
            target: l.target(),
            weight: l.weight(),
            is_active: l.is_active(),
            is_same_layer: l.is_same_layer(),
        }
    }
}

pub struct NetworkAdapter<'a> {
    net: &'a Network,
}

impl<'a> NetworkAdapter<'a> {
    pub fn new(net: &'a Network) -> Self {
        Self { net }
    }

    /// Every node and every active link.
    pub fn snapshot(&self) -> NetworkSnapshot {
        self.build(
            self.net.nodes().iter().collect(),
            self.net.active_links(false),
        )
    }

    /// Hidden nodes and the active lateral links between them.
    pub fn snapshot_hidden(&self) -> NetworkSnapshot {
        self.build(self.net.hidden_nodes(), self.net.active_links(true))
    }

    fn build(&self, nodes: Vec<&Node>, links: Vec<&Link>) -> NetworkSnapshot {
        NetworkSnapshot {
            shape: self.net.shape().to_vec(),
            nodes: nodes.into_iter().map(NodeSnapshot::from).collect(),
            links: links.into_iter().map(LinkSnapshot::from).collect(),
            diagnostics: self.net.diagnostics(),
            avalanche_counts: self.net.avalanche_count_history().to_vec(),
            avalanche_sizes: self.net.avalanche_size_history().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramBin {
    /// Inclusive.
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    pub count: usize,
}

/// Fixed-width histogram over `[0, max]`.
///
/// `bins = None` uses as many bins as the largest value.
pub fn histogram(values: &[usize], bins: Option<usize>) -> Vec<HistogramBin> {
    let max = match values.iter().max() {
        Some(&m) => m,
        None => return Vec::new(),
    };
    let bins = bins.unwrap_or(max).max(1);
    let width = (max + 1).div_ceil(bins).max(1);

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|b| HistogramBin {
            start: b * width,
            end: (b + 1) * width,
            count: 0,
        })
        .collect();
    for &v in values {
        let b = (v / width).min(bins - 1);
        out[b].count += 1;
    }
    out
}
