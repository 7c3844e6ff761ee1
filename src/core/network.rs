use core::fmt;

use hashbrown::HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{NetworkError, Result};
use crate::link::{Endpoint, Link, NodeIndex};
use crate::node::{LinkIndex, Node, NodeId, NodeState, Polarity};
use crate::prng::{Prng, RandomSource};

/// Active-link thresholds, one per wiring pass.
///
/// A link is active when its weight is strictly above the threshold of the
/// pass that created it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WiringThresholds {
    /// Full topology: previous layer -> current layer.
    pub full_feedforward: f64,
    /// Full topology: ordered pairs inside one layer.
    pub full_lateral: f64,
    /// Growable topology: hidden <-> hidden.
    pub hidden_lateral: f64,
    /// Growable topology: input -> hidden.
    pub input_to_hidden: f64,
    /// Growable topology: hidden -> output.
    pub hidden_to_output: f64,
    /// Links added by preferential attachment (always weight 1.0).
    pub growth: f64,
    /// Links added explicitly through [`Network::connect`].
    pub link_default: f64,
}

impl Default for WiringThresholds {
    fn default() -> Self {
        Self {
            full_feedforward: 0.9,
            full_lateral: 0.9,
            hidden_lateral: 0.4,
            input_to_hidden: 0.75,
            hidden_to_output: 0.75,
            growth: 0.95,
            link_default: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Topology {
    /// Every layer fully connected to the next, plus all lateral pairs.
    Full,
    /// Three layers; the hidden layer starts at `m` nodes and can grow.
    Growable,
    /// Same sizing as `Growable`, no links. Wire by hand with `connect`.
    Bare,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    pub topology: Topology,

    // Firing threshold shared by every node.
    pub threshold: f64,

    // Probability that a new node is inhibitory.
    pub inhibitory_ratio: f64,

    pub wiring: WiringThresholds,

    // Divide spike amplitude by out-degree.
    pub normalize_by_out_degree: bool,

    // Initial hidden width and attachment attempts per growth step.
    pub m: usize,
    pub grow_at_once: bool,

    // Upper bound on sweeps per `stabilize_all`, at least 1. `None` runs to
    // settlement.
    pub sweep_cap: Option<usize>,

    // If set, makes construction and growth reproducible.
    pub seed: Option<u64>,
}

impl NetworkConfig {
    pub fn full() -> Self {
        Self {
            topology: Topology::Full,
            threshold: 4.0,
            inhibitory_ratio: 0.2,
            wiring: WiringThresholds::default(),
            normalize_by_out_degree: false,
            m: 1,
            grow_at_once: false,
            sweep_cap: None,
            seed: None,
        }
    }

    pub fn growable(m: usize, grow_at_once: bool) -> Self {
        Self {
            topology: Topology::Growable,
            normalize_by_out_degree: true,
            m,
            grow_at_once,
            ..Self::full()
        }
    }

    pub fn bare(m: usize) -> Self {
        Self {
            topology: Topology::Bare,
            ..Self::growable(m, false)
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::full()
    }
}

/// One settled (or truncated) cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Avalanche {
    /// Sweeps run, including the final quiet one.
    pub sweeps: usize,
    /// Positive firings summed over all sweeps.
    pub size: usize,
    /// Stopped by a sweep cap before a quiet sweep.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    pub node_count: usize,
    pub link_count: usize,
    pub active_link_count: usize,
    pub hidden_count: usize,
    pub spiking: usize,
    pub refractory: usize,
    pub mean_total_input: f64,
}

/// A layered spiking network.
///
/// Nodes and links live in two append-only arenas and refer to each other by
/// index. Layers hold node indices in construction order, which is also the
/// update order within a sweep.
pub struct Network {
    cfg: NetworkConfig,
    shape: Vec<usize>,
    layers: Vec<Vec<NodeIndex>>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    by_id: HashMap<NodeId, NodeIndex>,
    next_id: u32,

    pub(crate) m: usize,
    pub(crate) max_m: usize,

    avalanche_count_history: Vec<usize>,
    avalanche_size_history: Vec<usize>,
    last_avalanche: Option<Avalanche>,

    pub(crate) rng: Box<dyn RandomSource>,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("topology", &self.cfg.topology)
            .field("shape", &self.shape)
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("m", &self.m)
            .field("max_m", &self.max_m)
            .finish_non_exhaustive()
    }
}

impl Network {
    /// Growable network with the default parameters and seed.
    pub fn new(shape: &[usize], grow_at_once: bool, m: usize) -> Result<Self> {
        Self::with_config(shape, NetworkConfig::growable(m, grow_at_once))
    }

    pub fn with_config(shape: &[usize], cfg: NetworkConfig) -> Result<Self> {
        let rng = Prng::new(cfg.seed.unwrap_or(1));
        Self::with_rng(shape, cfg, Box::new(rng))
    }

    /// Build with an injected random source. All stochastic decisions
    /// (polarity, weights, growth permutations) draw from it.
    pub fn with_rng(
        shape: &[usize],
        cfg: NetworkConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        validate(shape, &cfg)?;

        let (m, max_m) = match cfg.topology {
            Topology::Full => {
                let hidden = if shape.len() >= 3 { shape[1] } else { 0 };
                (hidden, hidden)
            }
            Topology::Growable | Topology::Bare => (cfg.m, shape[1]),
        };

        let mut net = Self {
            shape: shape.to_vec(),
            layers: vec![Vec::new(); shape.len()],
            nodes: Vec::new(),
            links: Vec::new(),
            by_id: HashMap::new(),
            next_id: 1,
            m,
            max_m,
            avalanche_count_history: Vec::new(),
            avalanche_size_history: Vec::new(),
            last_avalanche: None,
            rng,
            cfg,
        };

        match net.cfg.topology {
            Topology::Full => net.build_full(),
            Topology::Growable => net.build_growable(),
            Topology::Bare => net.build_bare(),
        }

        info!(
            topology = ?net.cfg.topology,
            shape = ?net.shape,
            nodes = net.nodes.len(),
            links = net.links.len(),
            "network constructed"
        );

        if net.cfg.topology == Topology::Growable && net.cfg.grow_at_once {
            net.grow();
        }

        Ok(net)
    }

    fn build_full(&mut self) {
        let wiring = self.cfg.wiring;
        for layer_idx in 0..self.shape.len() {
            for _ in 0..self.shape[layer_idx] {
                let node = self.spawn_node(layer_idx);
                if layer_idx >= 1 {
                    for slot in 0..self.layers[layer_idx - 1].len() {
                        let prev = self.layers[layer_idx - 1][slot];
                        self.random_wire(prev, node, wiring.full_feedforward);
                    }
                }
            }
            self.wire_lateral(layer_idx, wiring.full_lateral);
        }
    }

    fn build_growable(&mut self) {
        self.build_bare();

        let wiring = self.cfg.wiring;
        self.wire_lateral(1, wiring.hidden_lateral);
        self.wire_between(0, 1, wiring.input_to_hidden);
        self.wire_between(1, 2, wiring.hidden_to_output);
    }

    fn build_bare(&mut self) {
        let widths = [self.shape[0], self.m, self.shape[2]];
        for (layer_idx, &width) in widths.iter().enumerate() {
            for _ in 0..width {
                self.spawn_node(layer_idx);
            }
        }
    }

    /// Every ordered pair of distinct nodes inside one layer.
    fn wire_lateral(&mut self, layer_idx: usize, threshold: f64) {
        let members = self.layers[layer_idx].clone();
        for &a in &members {
            for &b in &members {
                if a != b {
                    self.random_wire(a, b, threshold);
                }
            }
        }
    }

    /// Every node of `from` to every node of `to`, target-major.
    fn wire_between(&mut self, from: usize, to: usize, threshold: f64) {
        let sources = self.layers[from].clone();
        let targets = self.layers[to].clone();
        for &t in &targets {
            for &s in &sources {
                self.random_wire(s, t, threshold);
            }
        }
    }

    /// Draw polarity, assign the next id. The node is not yet in any arena.
    pub(crate) fn make_node(&mut self, layer_idx: usize) -> Node {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let polarity = if self.rng.next_f64() > 1.0 - self.cfg.inhibitory_ratio {
            Polarity::Inhibitory
        } else {
            Polarity::Excitatory
        };
        Node::new(id, layer_idx, polarity, self.cfg.threshold)
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeIndex {
        let idx = self.nodes.len();
        self.by_id.insert(node.id(), idx);
        self.layers[node.layer()].push(idx);
        self.nodes.push(node);
        idx
    }

    fn spawn_node(&mut self, layer_idx: usize) -> NodeIndex {
        let node = self.make_node(layer_idx);
        self.push_node(node)
    }

    pub(crate) fn endpoint(&self, idx: NodeIndex) -> Endpoint {
        let n = &self.nodes[idx];
        Endpoint {
            index: idx,
            id: n.id(),
            layer: n.layer(),
        }
    }

    fn random_wire(&mut self, source: NodeIndex, target: NodeIndex, threshold: f64) -> LinkIndex {
        let weight = self.rng.next_f64();
        self.wire(source, target, weight, threshold)
    }

    fn wire(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        weight: f64,
        threshold: f64,
    ) -> LinkIndex {
        let link = Link::new(self.endpoint(source), self.endpoint(target), weight, threshold);
        let idx = self.links.len();
        self.links.push(link);
        self.nodes[source].outputs.push(idx);
        self.nodes[target].inputs.push(idx);
        idx
    }

    /// Add one link between existing nodes, thresholded by
    /// `wiring.link_default`. Returns `None` if either id is unknown.
    pub fn connect(&mut self, source: NodeId, target: NodeId, weight: f64) -> Option<&Link> {
        let s = *self.by_id.get(&source)?;
        let t = *self.by_id.get(&target)?;
        let idx = self.wire(s, t, weight, self.cfg.wiring.link_default);
        self.links.get(idx)
    }

    // Structural operations kept for interface completeness. They do not
    // change the network.

    pub fn add_neuron(&mut self, _layer_idx: usize) {}

    pub fn remove_neuron(&mut self, _layer_idx: usize) {}

    pub fn add_edges(&mut self, _layer_idx: usize) {}

    pub fn rewire_edges(&mut self, _layer_idx: usize) {}

    /// Inject the stimulus and sweep layers `1..` once.
    ///
    /// Returns `true` when no non-input node emitted a positive spike.
    /// Inputs shorter than the input layer leave the remaining input nodes
    /// at 0.
    pub fn forward_step(&mut self, inputs: &[f64]) -> Result<bool> {
        let capacity = self.layers[0].len();
        if inputs.len() > capacity {
            return Err(NetworkError::InvalidInput {
                got: inputs.len(),
                capacity,
            });
        }

        for (slot, &idx) in self.layers[0].iter().enumerate() {
            let value = inputs.get(slot).copied().unwrap_or(0.0);
            self.nodes[idx].set_output(value);
        }

        Ok(self.sweep() == 0)
    }

    /// One sweep without touching the input layer. Returns how many nodes
    /// emitted a positive spike.
    pub fn stabilize_step(&mut self) -> u32 {
        self.sweep()
    }

    /// Sweep until a quiet sweep (or the configured cap), record the
    /// avalanche, and read the output layer.
    pub fn stabilize_all(&mut self) -> Vec<f64> {
        let cap = self.cfg.sweep_cap;
        self.settle(cap);
        self.read_output()
    }

    /// Like [`Network::stabilize_all`] but with an explicit sweep budget.
    /// The recorded avalanche is marked truncated if the budget ran out.
    /// At least one sweep always runs, so a budget of 0 acts as 1.
    pub fn stabilize_bounded(&mut self, max_sweeps: usize) -> Vec<f64> {
        self.settle(Some(max_sweeps.max(1)));
        self.read_output()
    }

    /// Inject, settle if needed, read.
    pub fn forward_input_maybe_stabilize(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if self.forward_step(inputs)? {
            Ok(self.read_output())
        } else {
            Ok(self.stabilize_all())
        }
    }

    /// Residual charge (`total_input`) of each output node, not its last spike.
    pub fn read_output(&self) -> Vec<f64> {
        self.layer(self.layers.len() - 1)
            .map(|n| n.total_input())
            .collect()
    }

    fn settle(&mut self, cap: Option<usize>) -> Avalanche {
        let mut sweeps = 0usize;
        let mut size = 0usize;
        let mut truncated = false;

        loop {
            sweeps += 1;
            let fired = self.stabilize_step();
            if fired == 0 {
                break;
            }
            size += fired as usize;
            if cap.is_some_and(|cap| sweeps >= cap) {
                truncated = true;
                warn!(sweeps, size, "avalanche stopped by sweep cap");
                break;
            }
        }

        let avalanche = Avalanche {
            sweeps,
            size,
            truncated,
        };
        self.avalanche_count_history.push(sweeps);
        self.avalanche_size_history.push(size);
        self.last_avalanche = Some(avalanche);
        debug!(sweeps, size, "avalanche settled");
        avalanche
    }

    fn sweep(&mut self) -> u32 {
        let normalize = self.cfg.normalize_by_out_degree;
        let mut fired = 0;
        for layer_idx in 1..self.layers.len() {
            for slot in 0..self.layers[layer_idx].len() {
                let idx = self.layers[layer_idx][slot];
                let incoming = self.incoming(idx);
                if self.nodes[idx].update_state(incoming, normalize) > 0.0 {
                    fired += 1;
                }
            }
        }
        fired
    }

    fn incoming(&self, idx: NodeIndex) -> f64 {
        self.nodes[idx]
            .inputs
            .iter()
            .map(|&l| &self.links[l])
            .filter(|l| l.is_active())
            .map(|l| self.nodes[l.source_index()].output())
            .sum()
    }

    /// Inject charge into one node and tick it. `None` for an unknown id.
    pub fn raise_potential(&mut self, id: NodeId, x: f64) -> Option<f64> {
        let idx = *self.by_id.get(&id)?;
        let incoming = self.incoming(idx);
        let normalize = self.cfg.normalize_by_out_degree;
        Some(self.nodes[idx].raise_potential(x, incoming, normalize))
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.by_id.get(&id).map(|&idx| &self.nodes[idx])
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.cfg
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Nodes of one layer in construction order. Empty past the last layer.
    pub fn layer(&self, layer_idx: usize) -> impl Iterator<Item = &Node> + '_ {
        self.layers
            .get(layer_idx)
            .map(|l| l.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&idx| &self.nodes[idx])
    }

    /// Every layer, input first, each in construction order.
    pub fn layers(&self) -> impl Iterator<Item = impl Iterator<Item = &Node> + '_> + '_ {
        (0..self.layers.len()).map(move |i| self.layer(i))
    }

    pub fn layer_widths(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.len()).collect()
    }

    pub fn input_links(&self, id: NodeId) -> Option<impl Iterator<Item = &Link> + '_> {
        let node = self.get_node(id)?;
        Some(node.input_links().iter().map(move |&l| &self.links[l]))
    }

    pub fn output_links(&self, id: NodeId) -> Option<impl Iterator<Item = &Link> + '_> {
        let node = self.get_node(id)?;
        Some(node.output_links().iter().map(move |&l| &self.links[l]))
    }

    pub(crate) fn is_interior(&self, layer_idx: usize) -> bool {
        layer_idx > 0 && layer_idx + 1 < self.layers.len()
    }

    /// Active links. With `hidden_only`, restricted to lateral links whose
    /// source sits in an interior layer.
    pub fn active_links(&self, hidden_only: bool) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| l.is_active())
            .filter(|l| !hidden_only || (l.is_same_layer() && self.is_interior(l.source_layer())))
            .collect()
    }

    pub fn hidden_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| self.is_interior(n.layer()))
            .collect()
    }

    pub fn hidden_count(&self) -> usize {
        (1..self.layers.len().saturating_sub(1))
            .map(|i| self.layers[i].len())
            .sum()
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn max_m(&self) -> usize {
        self.max_m
    }

    pub fn avalanche_count_history(&self) -> &[usize] {
        &self.avalanche_count_history
    }

    pub fn avalanche_size_history(&self) -> &[usize] {
        &self.avalanche_size_history
    }

    pub fn last_avalanche(&self) -> Option<Avalanche> {
        self.last_avalanche
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let spiking = self
            .nodes
            .iter()
            .filter(|n| n.state() == NodeState::Spiking)
            .count();
        let refractory = self
            .nodes
            .iter()
            .filter(|n| n.state() == NodeState::Refractory)
            .count();
        let mean_total_input = if self.nodes.is_empty() {
            0.0
        } else {
            self.nodes.iter().map(|n| n.total_input()).sum::<f64>() / self.nodes.len() as f64
        };
        Diagnostics {
            node_count: self.nodes.len(),
            link_count: self.links.len(),
            active_link_count: self.links.iter().filter(|l| l.is_active()).count(),
            hidden_count: self.hidden_count(),
            spiking,
            refractory,
            mean_total_input,
        }
    }
}

fn validate(shape: &[usize], cfg: &NetworkConfig) -> Result<()> {
    if cfg.sweep_cap == Some(0) {
        return Err(NetworkError::InvalidConfig(
            "sweep_cap must allow at least one sweep".into(),
        ));
    }
    if shape.len() < 2 {
        return Err(NetworkError::InvalidShape(format!(
            "need at least an input and an output layer, got {} layers",
            shape.len()
        )));
    }
    if let Some(pos) = shape.iter().position(|&w| w == 0) {
        return Err(NetworkError::InvalidShape(format!("layer {pos} is empty")));
    }
    match cfg.topology {
        Topology::Full => Ok(()),
        Topology::Growable | Topology::Bare => {
            if shape.len() != 3 {
                return Err(NetworkError::InvalidShape(format!(
                    "growable networks have exactly 3 layers, got {}",
                    shape.len()
                )));
            }
            if cfg.m == 0 || cfg.m > shape[1] {
                return Err(NetworkError::InvalidShape(format!(
                    "m must be in 1..={}, got {}",
                    shape[1], cfg.m
                )));
            }
            Ok(())
        }
    }
}
