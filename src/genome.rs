//! CPPN genome with arena-allocated graph topology.
//!
//! A [`Network`] owns its nodes and connections in `SlotMap` arenas. The
//! connection arena is the single source of truth for topology; per-node
//! outgoing lists and layers are derived from it by [`Network::update`]
//! (see [`crate::topology`]) after every structural change.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::activation::Activation;
use crate::error::MutationError;
use crate::gene::{ConnectionGene, ConnectionId, NodeGene, NodeId, NodeType};
use crate::innovation::InnovationCounter;

/// Which coordinates are fed to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Inputs are `[x, y]`.
    Planar,
    /// Inputs are `[x, y, d]` with `d = sqrt(x² + y²)`.
    #[default]
    Radial,
}

impl InputMode {
    /// Number of input nodes this mode needs.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Planar => 2,
            Self::Radial => 3,
        }
    }
}

/// Input/output shape of every network in a run.
///
/// Inputs take ids `1..=num_inputs()`, outputs the next `num_outputs` ids.
/// Everything above that is a hidden node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    /// Coordinate arity.
    pub input_mode: InputMode,
    /// Number of output channels.
    pub num_outputs: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(InputMode::Radial, 3)
    }
}

impl Layout {
    #[must_use]
    pub const fn new(input_mode: InputMode, num_outputs: usize) -> Self {
        Self {
            input_mode,
            num_outputs,
        }
    }

    #[must_use]
    pub const fn num_inputs(&self) -> usize {
        self.input_mode.arity()
    }

    /// Ids reserved for input nodes.
    pub fn input_node_ids(&self) -> std::ops::RangeInclusive<u64> {
        1..=self.num_inputs() as u64
    }

    /// Ids reserved for output nodes.
    pub fn output_node_ids(&self) -> std::ops::RangeInclusive<u64> {
        let first = self.num_inputs() as u64 + 1;
        first..=self.num_inputs() as u64 + self.num_outputs as u64
    }

    /// Role implied by a node id.
    #[must_use]
    pub fn role_of(&self, id: u64) -> NodeType {
        if self.input_node_ids().contains(&id) {
            NodeType::Input
        } else if self.output_node_ids().contains(&id) {
            NodeType::Output
        } else {
            NodeType::Hidden
        }
    }
}

/// A CPPN genome.
///
/// Nodes are kept in three ordered role lists; input and output order is
/// positional (coordinate `i` feeds input `i`, output `j` is channel `j`).
/// The connection arena is never shrunk, so its iteration order is
/// insertion order.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) layout: Layout,
    pub(crate) nodes: SlotMap<NodeId, NodeGene>,
    pub(crate) connections: SlotMap<ConnectionId, ConnectionGene>,
    pub(crate) input_ids: Vec<NodeId>,
    pub(crate) output_ids: Vec<NodeId>,
    pub(crate) hidden_ids: Vec<NodeId>,
    /// Hidden nodes grouped by layer, ascending, for layers strictly between
    /// the input layer and the output layer.
    pub(crate) middle_layers: Vec<Vec<NodeId>>,
    /// Shared layer of every output node.
    pub(crate) out_layer: u32,
}

impl Network {
    /// A network with no nodes at all. Callers must push the layout's input
    /// and output nodes before evaluating.
    pub(crate) fn empty(layout: Layout) -> Self {
        Self {
            layout,
            nodes: SlotMap::with_key(),
            connections: SlotMap::with_key(),
            input_ids: Vec::with_capacity(layout.num_inputs()),
            output_ids: Vec::with_capacity(layout.num_outputs),
            hidden_ids: Vec::new(),
            middle_layers: Vec::new(),
            out_layer: 0,
        }
    }

    /// Create a genome with only the layout's input and output nodes.
    ///
    /// Inputs use the identity activation; every output uses
    /// `output_activation`.
    #[must_use]
    pub fn minimal(layout: Layout, output_activation: Activation) -> Self {
        let mut network = Self::empty(layout);
        for id in layout.input_node_ids() {
            network.push_node(NodeGene::input(id, Activation::Identity));
        }
        for id in layout.output_node_ids() {
            network.push_node(NodeGene::output(id, output_activation));
        }
        network.update();
        network
    }

    /// Create the seed topology: every input connected to every output.
    ///
    /// Connection innovations run `1..=inputs*outputs` in input-major order,
    /// matching [`InnovationCounter::after_seed`]. Weights are uniform in
    /// `[-1, 1]` and each output draws its own activation.
    #[must_use]
    pub fn fully_connected<R: Rng>(layout: Layout, rng: &mut R) -> Self {
        let mut network = Self::minimal(layout, Activation::Identity);
        for &output_id in &network.output_ids {
            network.nodes[output_id].activation = Activation::random(rng);
        }

        let mut innovation = 0;
        for i in 0..network.input_ids.len() {
            for j in 0..network.output_ids.len() {
                innovation += 1;
                let weight = random_weight(rng);
                let conn = ConnectionGene::new(
                    innovation,
                    network.input_ids[i],
                    network.output_ids[j],
                    weight,
                );
                network.connections.insert(conn);
            }
        }

        network.update();
        network
    }

    /// Append a node to the arena and its role list.
    pub(crate) fn push_node(&mut self, node: NodeGene) -> NodeId {
        let node_type = node.node_type;
        let id = self.nodes.insert(node);
        match node_type {
            NodeType::Input => self.input_ids.push(id),
            NodeType::Output => self.output_ids.push(id),
            NodeType::Hidden => self.hidden_ids.push(id),
        }
        id
    }

    /// The input/output shape of this genome.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// All nodes in internal order: inputs, outputs, then hidden nodes in
    /// creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> + '_ {
        self.input_ids
            .iter()
            .chain(&self.output_ids)
            .chain(&self.hidden_ids)
            .map(|&id| &self.nodes[id])
    }

    /// All connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> + '_ {
        self.connections.values()
    }

    /// Ids of the input nodes, in positional order.
    pub fn input_node_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.input_ids.iter().map(|&id| self.nodes[id].id)
    }

    /// Ids of the output nodes, in positional order.
    pub fn output_node_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.output_ids.iter().map(|&id| self.nodes[id].id)
    }

    /// Ids of the hidden nodes, in creation order.
    pub fn hidden_node_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.hidden_ids.iter().map(|&id| self.nodes[id].id)
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of enabled connections.
    #[must_use]
    pub fn num_enabled_connections(&self) -> usize {
        self.connections.values().filter(|c| c.enabled).count()
    }

    /// Find a node's arena key by its id.
    #[must_use]
    pub fn find_node(&self, id: u64) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.id == id)
            .map(|(key, _)| key)
    }

    /// Find a connection's arena key by its innovation number.
    #[must_use]
    pub fn find_connection(&self, innovation: u64) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|(_, c)| c.innovation == innovation)
            .map(|(key, _)| key)
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: u64) -> Option<&NodeGene> {
        self.find_node(id).map(|key| &self.nodes[key])
    }

    /// Look up a connection by innovation number.
    #[must_use]
    pub fn connection(&self, innovation: u64) -> Option<&ConnectionGene> {
        self.find_connection(innovation)
            .map(|key| &self.connections[key])
    }

    /// Source and target node ids of a connection.
    #[must_use]
    pub fn endpoints(&self, conn: &ConnectionGene) -> (u64, u64) {
        (self.nodes[conn.input].id, self.nodes[conn.output].id)
    }

    /// Overwrite a connection weight, clamped to `[-1, 1]`.
    ///
    /// Returns `false` if no connection has this innovation number.
    pub fn set_weight(&mut self, innovation: u64, weight: f32) -> bool {
        match self.find_connection(innovation) {
            Some(key) => {
                self.connections[key].weight = weight.clamp(-1.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// Replace a node's activation function.
    ///
    /// Returns `false` if no node has this id.
    pub fn set_activation(&mut self, id: u64, activation: Activation) -> bool {
        match self.find_node(id) {
            Some(key) => {
                self.nodes[key].activation = activation;
                true
            }
            None => false,
        }
    }

    /// Shared layer of the output nodes after the last update.
    #[must_use]
    pub const fn out_layer(&self) -> u32 {
        self.out_layer
    }

    /// Hidden node ids grouped by evaluation layer, ascending.
    #[must_use]
    pub fn middle_layers(&self) -> Vec<Vec<u64>> {
        self.middle_layers
            .iter()
            .map(|layer| layer.iter().map(|&id| self.nodes[id].id).collect())
            .collect()
    }

    /// Resolve and validate a candidate `source -> target` edge.
    fn check_endpoints(
        &self,
        source: u64,
        target: u64,
    ) -> Result<(NodeId, NodeId), MutationError> {
        if source == target {
            return Err(MutationError::SelfLoop(source));
        }
        let source_id = self
            .find_node(source)
            .ok_or(MutationError::UnknownNode(source))?;
        let target_id = self
            .find_node(target)
            .ok_or(MutationError::UnknownNode(target))?;

        if self.nodes[target_id].node_type == NodeType::Input {
            return Err(MutationError::TargetIsInput(target));
        }
        if self.nodes[source_id].node_type == NodeType::Output {
            return Err(MutationError::SourceIsOutput(source));
        }
        if self.reaches(target_id, source_id) {
            return Err(MutationError::WouldCreateCycle {
                from: source,
                to: target,
            });
        }

        Ok((source_id, target_id))
    }

    /// Add a new enabled connection between two nodes.
    ///
    /// Allocates one innovation number from `innovations` on success and
    /// returns it. Nothing is allocated when the pair is rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationError`] if the pair is a self-loop, targets an
    /// input, starts at an output, names an unknown node, or would close a
    /// cycle.
    pub fn add_connection<R: Rng>(
        &mut self,
        source: u64,
        target: u64,
        innovations: &mut InnovationCounter,
        rng: &mut R,
    ) -> Result<u64, MutationError> {
        let (source_id, target_id) = self.check_endpoints(source, target)?;

        let innovation = innovations.allocate_connection();
        let weight = random_weight(rng);
        self.connections
            .insert(ConnectionGene::new(innovation, source_id, target_id, weight));

        self.update();
        Ok(innovation)
    }

    /// Insert a hidden node between `before` and `after`.
    ///
    /// Every existing `before -> after` connection is disabled, then a hidden
    /// node with a random activation is wired in as `before -> new -> after`.
    /// Allocates one node id and two innovation numbers on success and
    /// returns the new node id.
    ///
    /// # Errors
    ///
    /// Same rejection rules as [`add_connection`](Self::add_connection),
    /// applied to the `before -> after` pair.
    pub fn add_node<R: Rng>(
        &mut self,
        before: u64,
        after: u64,
        innovations: &mut InnovationCounter,
        rng: &mut R,
    ) -> Result<u64, MutationError> {
        let (before_id, after_id) = self.check_endpoints(before, after)?;

        for conn in self.connections.values_mut() {
            if conn.input == before_id && conn.output == after_id {
                conn.enabled = false;
            }
        }

        let node = innovations.allocate_node();
        let new_id = self.push_node(NodeGene::hidden(node, Activation::random(rng)));

        let conn_a = innovations.allocate_connection();
        let weight = random_weight(rng);
        self.connections
            .insert(ConnectionGene::new(conn_a, before_id, new_id, weight));

        let conn_b = innovations.allocate_connection();
        let weight = random_weight(rng);
        self.connections
            .insert(ConnectionGene::new(conn_b, new_id, after_id, weight));

        self.update();
        Ok(node)
    }
}

/// Uniform weight in `[-1, 1]`.
pub(crate) fn random_weight<R: Rng>(rng: &mut R) -> f32 {
    rng.random_range(-1.0..=1.0)
}
