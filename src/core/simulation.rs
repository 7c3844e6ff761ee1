use tracing::trace;

use crate::error::Result;
use crate::network::{Avalanche, Network};
use crate::node::NodeId;
use crate::stimulus::StimulusSource;

/// What one tick of a [`Simulation`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub output: Vec<f64>,
    /// Avalanche recorded this tick, if the stimulus destabilized the network.
    pub avalanche: Option<Avalanche>,
    /// Hidden node added this tick.
    pub grew: Option<NodeId>,
}

/// Caller-driven timeline: one stimulus per tick, optional growth every
/// `grow_every` ticks.
pub struct Simulation<S: StimulusSource> {
    network: Network,
    source: S,
    grow_every: Option<u64>,
    tick: u64,
}

impl<S: StimulusSource> Simulation<S> {
    pub fn new(network: Network, source: S) -> Self {
        Self {
            network,
            source,
            grow_every: None,
            tick: 0,
        }
    }

    /// Add one hidden node every `n` ticks until the layer is full.
    /// `0` disables growth.
    pub fn with_growth_every(mut self, n: u64) -> Self {
        self.grow_every = (n > 0).then_some(n);
        self
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn tick(&mut self) -> Result<TickReport> {
        self.tick += 1;

        let inputs = self.source.next_data();
        let recorded = self.network.avalanche_size_history().len();
        let output = self.network.forward_input_maybe_stabilize(&inputs)?;
        let avalanche = if self.network.avalanche_size_history().len() > recorded {
            self.network.last_avalanche()
        } else {
            None
        };

        let grew = match self.grow_every {
            Some(n) if self.tick % n == 0 => self.network.grow_step(),
            _ => None,
        };

        trace!(tick = self.tick, ?avalanche, ?grew, "tick");
        Ok(TickReport {
            tick: self.tick,
            output,
            avalanche,
            grew,
        })
    }

    pub fn run(&mut self, ticks: u64) -> Result<Vec<TickReport>> {
        (0..ticks).map(|_| self.tick()).collect()
    }
}
