use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a link in the owning network's link arena.
pub type LinkIndex = usize;

/// Stable, sequentially assigned node identity. Ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Polarity {
    Excitatory,
    Inhibitory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeState {
    Default,
    Spiking,
    Refractory,
}

/// A single spiking unit.
///
/// A node only knows the indices of its incoming and outgoing links; the
/// network owns both arenas and resolves them. Incoming signal is summed by
/// the network and handed to [`Node::update_state`].
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    layer: usize,
    polarity: Polarity,
    state: NodeState,
    wait_count: u8,
    total_input: f64,
    output: f64,
    threshold: f64,

    pub(crate) inputs: Vec<LinkIndex>,
    pub(crate) outputs: Vec<LinkIndex>,
}

impl Node {
    pub fn new(id: NodeId, layer: usize, polarity: Polarity, threshold: f64) -> Self {
        Self {
            id,
            layer,
            polarity,
            state: NodeState::Default,
            wait_count: 0,
            total_input: 0.0,
            output: 0.0,
            threshold,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn wait_count(&self) -> u8 {
        self.wait_count
    }

    pub fn total_input(&self) -> f64 {
        self.total_input
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn in_degree(&self) -> usize {
        self.inputs.len()
    }

    pub fn out_degree(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_links(&self) -> &[LinkIndex] {
        &self.inputs
    }

    pub fn output_links(&self) -> &[LinkIndex] {
        &self.outputs
    }

    /// Input-layer nodes are stimulus sources: their output is written
    /// directly and they never run the state machine during a sweep.
    pub(crate) fn set_output(&mut self, value: f64) {
        self.output = value;
    }

    /// Advance the state machine by one tick and return the emitted signal.
    ///
    /// `incoming` is the summed output of all active source links. It is
    /// ignored while the node is spiking or in the first refractory tick.
    /// With `normalize` set, a spike is divided by the out-degree.
    pub fn update_state(&mut self, incoming: f64, normalize: bool) -> f64 {
        match (self.state, self.wait_count) {
            (NodeState::Spiking, _) => {
                self.state = NodeState::Refractory;
                self.wait_count = 1;
                self.output = 0.0;
                return 0.0;
            }
            (NodeState::Refractory, 1) => {
                self.wait_count = 2;
                self.output = 0.0;
                return 0.0;
            }
            (NodeState::Refractory, _) => {
                self.wait_count = 0;
                self.state = NodeState::Default;
            }
            (NodeState::Default, _) => {}
        }

        // Inhibitory input may leave the charge below zero.
        self.total_input += incoming;

        if self.total_input > self.threshold {
            let amplitude = if normalize && !self.outputs.is_empty() {
                self.total_input / self.outputs.len() as f64
            } else {
                self.total_input
            };
            self.output = match self.polarity {
                Polarity::Excitatory => amplitude,
                Polarity::Inhibitory => -amplitude,
            };
            self.state = NodeState::Spiking;
            self.total_input = 0.0;
        } else {
            self.state = NodeState::Default;
            self.output = 0.0;
        }
        self.output
    }

    /// Inject charge directly, then tick once.
    pub fn raise_potential(&mut self, x: f64, incoming: f64, normalize: bool) -> f64 {
        self.total_input += x;
        self.update_state(incoming, normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(polarity: Polarity) -> Node {
        Node::new(NodeId(1), 1, polarity, 4.0)
    }

    #[test]
    fn accumulates_below_threshold() {
        let mut n = node(Polarity::Excitatory);
        assert_eq!(n.update_state(1.5, false), 0.0);
        assert_eq!(n.update_state(2.0, false), 0.0);
        assert_eq!(n.state(), NodeState::Default);
        assert_eq!(n.total_input(), 3.5);
    }

    #[test]
    fn fires_then_cycles_through_refractory() {
        let mut n = node(Polarity::Excitatory);
        assert_eq!(n.update_state(5.0, false), 5.0);
        assert_eq!(n.state(), NodeState::Spiking);
        assert_eq!(n.total_input(), 0.0);

        // Input during refractory ticks is dropped.
        assert_eq!(n.update_state(100.0, false), 0.0);
        assert_eq!((n.state(), n.wait_count()), (NodeState::Refractory, 1));
        assert_eq!(n.update_state(100.0, false), 0.0);
        assert_eq!((n.state(), n.wait_count()), (NodeState::Refractory, 2));
        assert_eq!(n.total_input(), 0.0);

        // Third tick leaves refractory and accumulates again.
        assert_eq!(n.update_state(4.5, false), 4.5);
        assert_eq!(n.state(), NodeState::Spiking);
        assert_eq!(n.wait_count(), 0);
    }

    #[test]
    fn inhibitory_spike_is_negative() {
        let mut n = node(Polarity::Inhibitory);
        assert_eq!(n.update_state(6.0, false), -6.0);
        assert_eq!(n.output(), -6.0);
    }

    #[test]
    fn normalizes_by_out_degree() {
        let mut n = node(Polarity::Excitatory);
        n.outputs = vec![0, 1, 2, 3];
        assert_eq!(n.update_state(8.0, true), 2.0);

        // No outgoing links: amplitude is left as is.
        let mut sink = node(Polarity::Excitatory);
        assert_eq!(sink.update_state(8.0, true), 8.0);
    }

    #[test]
    fn inhibitory_input_lowers_charge() {
        let mut n = node(Polarity::Excitatory);
        n.update_state(2.0, false);
        n.update_state(-3.0, false);
        assert_eq!(n.total_input(), -1.0);
        assert_eq!(n.state(), NodeState::Default);

        // The deficit has to be made up before the node can fire.
        assert_eq!(n.update_state(5.0, false), 0.0);
        assert_eq!(n.update_state(0.5, false), 4.5);
    }

    #[test]
    fn raise_potential_can_trigger_a_spike() {
        let mut n = node(Polarity::Excitatory);
        assert_eq!(n.raise_potential(3.0, 0.0, false), 0.0);
        assert_eq!(n.raise_potential(2.0, 0.0, false), 5.0);
        assert_eq!(n.state(), NodeState::Spiking);
    }

    #[test]
    fn never_spikes_twice_in_a_row() {
        let mut n = node(Polarity::Excitatory);
        let mut prev = n.state();
        for _ in 0..20 {
            n.update_state(10.0, false);
            assert!(!(prev == NodeState::Spiking && n.state() == NodeState::Spiking));
            if n.state() == NodeState::Refractory {
                assert!(matches!(n.wait_count(), 1 | 2));
            }
            prev = n.state();
        }
    }
}
