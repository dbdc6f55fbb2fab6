//! Gene types for CPPN genomes.
//!
//! This module defines the fundamental building blocks of a network:
//! - [`NodeGene`]: a neuron, with its derived layer and evaluation scratch state
//! - [`ConnectionGene`]: a weighted link between two nodes

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::activation::Activation;

new_key_type! {
    /// Arena key for a node within a genome.
    ///
    /// Keys are local to one [`Network`](crate::Network); the stable identity
    /// shared across genomes is [`NodeGene::id`].
    pub struct NodeId;

    /// Arena key for a connection within a genome.
    pub struct ConnectionId;
}

/// The role of a node in the network, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Input node - receives one coordinate value.
    Input,
    /// Output node - produces one channel of the network output.
    Output,
    /// Hidden node - added through structural mutation.
    Hidden,
}

/// A node gene representing a neuron in the CPPN.
#[derive(Debug, Clone)]
pub struct NodeGene {
    /// Innovation number of this node, stable across serialization and
    /// shared between genomes descending from the same mutation.
    pub id: u64,
    /// The role of this node in the network.
    pub node_type: NodeType,
    /// The activation function applied to the accumulated signal.
    pub activation: Activation,
    /// Derived layer: inputs are 1, every connection points to a higher layer.
    pub layer: u32,
    /// Signal gathered during the current evaluation pass.
    pub(crate) accumulator: f32,
    /// Outgoing connections, rebuilt from the connection arena on every
    /// topology update.
    pub(crate) out_conns: Vec<ConnectionId>,
}

impl NodeGene {
    fn with_type(id: u64, node_type: NodeType, activation: Activation) -> Self {
        Self {
            id,
            node_type,
            activation,
            layer: 0,
            accumulator: 0.0,
            out_conns: Vec::new(),
        }
    }

    /// Create a new input node.
    #[must_use]
    pub fn input(id: u64, activation: Activation) -> Self {
        Self::with_type(id, NodeType::Input, activation)
    }

    /// Create a new output node.
    #[must_use]
    pub fn output(id: u64, activation: Activation) -> Self {
        Self::with_type(id, NodeType::Output, activation)
    }

    /// Create a new hidden node.
    #[must_use]
    pub fn hidden(id: u64, activation: Activation) -> Self {
        Self::with_type(id, NodeType::Hidden, activation)
    }

    /// Outgoing connections as of the last topology update.
    #[must_use]
    pub fn out_conns(&self) -> &[ConnectionId] {
        &self.out_conns
    }
}

/// A connection gene representing a weighted link between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionGene {
    /// Innovation number, allocated from the run-wide counter and never reused.
    pub innovation: u64,
    /// The source node of this connection.
    pub input: NodeId,
    /// The target node of this connection.
    pub output: NodeId,
    /// The connection weight, kept in `[-1, 1]` by mutation.
    pub weight: f32,
    /// Whether this connection carries signal.
    /// Disabled connections are kept for crossover alignment.
    pub enabled: bool,
}

impl ConnectionGene {
    /// Create a new enabled connection.
    #[must_use]
    pub fn new(innovation: u64, input: NodeId, output: NodeId, weight: f32) -> Self {
        Self {
            innovation,
            input,
            output,
            weight,
            enabled: true,
        }
    }

    /// Signal forwarded along this connection for a source value.
    #[inline]
    #[must_use]
    pub fn transmit(&self, value: f32) -> f32 {
        if self.enabled {
            self.weight * value
        } else {
            0.0
        }
    }
}
