//! # spikenet
//!
//! Layered spiking network simulation: threshold-firing nodes with a
//! three-state cycle, stochastic wiring, cascading avalanche stabilization
//! and preferential-attachment growth of the hidden layer.
//!
//! Rendering is out of scope; [`observer`] exports read-only snapshots.

pub mod error;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/node.rs"]
pub mod node;

#[path = "core/link.rs"]
pub mod link;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/growth.rs"]
mod growth;

#[path = "core/stimulus.rs"]
pub mod stimulus;

#[path = "core/simulation.rs"]
pub mod simulation;

pub mod observer;

pub use error::{NetworkError, Result};
pub use link::Link;
pub use network::{Avalanche, Diagnostics, Network, NetworkConfig, Topology, WiringThresholds};
pub use node::{Node, NodeId, NodeState, Polarity};
pub use prng::{Prng, RandomSource, ScriptedSource};
pub use simulation::{Simulation, TickReport};
pub use stimulus::{CyclicSamples, NoiseStimulus, StimulusSource};
