//! Incremental hidden-layer growth by degree-preferential attachment.
//!
//! Each step adds one hidden node and makes up to `m` attachment attempts.
//! An attempt walks a fresh random permutation of the existing nodes and
//! links the new node to the first candidate it accepts, where a candidate
//! is accepted with probability `in_degree / all_incoming_edges`.

use tracing::{debug, info};

use crate::link::{Endpoint, Link};
use crate::network::Network;
use crate::node::NodeId;
use crate::prng::RandomSource;

/// Layer that growth appends to.
const GROWTH_LAYER: usize = 1;

impl Network {
    /// Add one hidden node. Returns its id, or `None` once the hidden layer
    /// already holds `max_m` nodes.
    pub fn grow_step(&mut self) -> Option<NodeId> {
        if self.layer_count() < 3 || self.layer(GROWTH_LAYER).count() >= self.max_m {
            return None;
        }

        let mut node = self.make_node(GROWTH_LAYER);
        let new_idx = self.nodes.len();
        let source = Endpoint {
            index: new_idx,
            id: node.id(),
            layer: GROWTH_LAYER,
        };

        // Fixed for the whole step, even as attachments raise in-degrees.
        let all_incoming_edges: usize = self.nodes.iter().map(|n| n.in_degree()).sum();
        let growth_threshold = self.config().wiring.growth;

        let mut attached = 0usize;
        if all_incoming_edges > 0 {
            let mut order: Vec<usize> = Vec::with_capacity(self.nodes.len());
            for _ in 0..self.m {
                order.clear();
                order.extend(0..self.nodes.len());
                self.rng.shuffle_indices(&mut order);

                for &cn in &order {
                    let p = self.nodes[cn].in_degree() as f64 / all_incoming_edges as f64;
                    if self.rng.next_f64() < p {
                        let link = Link::new(source, self.endpoint(cn), 1.0, growth_threshold);
                        let link_idx = self.links.len();
                        self.links.push(link);
                        node.outputs.push(link_idx);
                        self.nodes[cn].inputs.push(link_idx);
                        attached += 1;
                        break;
                    }
                }
            }
        }

        let id = node.id();
        self.push_node(node);
        debug!(%id, attached, all_incoming_edges, "grew hidden node");
        Some(id)
    }

    /// Grow until the hidden layer reaches `max_m`. Returns nodes added.
    pub fn grow(&mut self) -> usize {
        let mut added = 0;
        while self.grow_step().is_some() {
            added += 1;
        }
        if added > 0 {
            info!(added, hidden = self.hidden_count(), "hidden layer fully grown");
        }
        added
    }
}
