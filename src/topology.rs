//! Derived topology: outgoing adjacency, layers and evaluation order.
//!
//! The connection arena is authoritative. Each structural change rebuilds the
//! per-node outgoing lists and reassigns layers so that every enabled
//! connection points from a lower to a strictly higher layer.
//!
//! ## Layering
//!
//! Inputs sit on layer 1. Layers are raised along every connection, enabled
//! or not, with an explicit worklist (target layer becomes `source + 1`
//! whenever it is not already higher). Outputs are then pinned to the highest output layer so
//! they all fire in the final pass. A node climbing past the node count can
//! only mean a cycle, which the mutation operators rule out; reaching it is a
//! logic fault and panics.

use std::collections::{BTreeMap, VecDeque};

use slotmap::SecondaryMap;

use crate::gene::NodeId;
use crate::genome::Network;

impl Network {
    /// Rebuild adjacency and layers. Call after any structural change.
    pub fn update(&mut self) {
        self.update_conns();
        self.update_layers();
    }

    /// Rebuild every node's outgoing-connection list from the arena.
    ///
    /// Idempotent: redundant calls leave the lists unchanged.
    pub fn update_conns(&mut self) {
        for node in self.nodes.values_mut() {
            node.out_conns.clear();
        }
        for (conn_id, conn) in &self.connections {
            if let Some(source) = self.nodes.get_mut(conn.input) {
                source.out_conns.push(conn_id);
            }
        }
    }

    /// Recompute node layers and the middle-layer evaluation groups.
    ///
    /// # Panics
    ///
    /// Panics if the connections contain a cycle.
    pub fn update_layers(&mut self) {
        for node in self.nodes.values_mut() {
            node.layer = 0;
        }

        let bound = self.nodes.len() as u32;
        let mut queue: VecDeque<NodeId> = VecDeque::with_capacity(self.nodes.len());
        for &id in &self.input_ids {
            self.nodes[id].layer = 1;
            queue.push_back(id);
        }

        while let Some(current) = queue.pop_front() {
            let raised = self.nodes[current].layer + 1;
            for i in 0..self.nodes[current].out_conns.len() {
                let conn = &self.connections[self.nodes[current].out_conns[i]];
                let target = &mut self.nodes[conn.output];
                if target.layer < raised {
                    assert!(
                        raised <= bound,
                        "connection cycle through node {}: layer {} exceeds node count {}",
                        target.id,
                        raised,
                        bound
                    );
                    target.layer = raised;
                    queue.push_back(conn.output);
                }
            }
        }

        self.out_layer = self
            .output_ids
            .iter()
            .map(|&id| self.nodes[id].layer)
            .max()
            .unwrap_or(0);
        for &id in &self.output_ids {
            self.nodes[id].layer = self.out_layer;
        }

        let mut groups: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
        for &id in &self.hidden_ids {
            let layer = self.nodes[id].layer;
            if layer > 1 && layer < self.out_layer {
                groups.entry(layer).or_default().push(id);
            }
        }
        self.middle_layers = groups.into_values().collect();
    }

    /// Whether `to` is reachable from `from` along any connections.
    ///
    /// Uses the outgoing lists, so they must be current.
    pub(crate) fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }

        let mut visited: SecondaryMap<NodeId, ()> = SecondaryMap::with_capacity(self.nodes.len());
        let mut queue = VecDeque::new();
        queue.push_back(from);
        visited.insert(from, ());

        while let Some(current) = queue.pop_front() {
            for &conn_id in &self.nodes[current].out_conns {
                let conn = &self.connections[conn_id];
                if conn.output == to {
                    return true;
                }
                if visited.insert(conn.output, ()).is_none() {
                    queue.push_back(conn.output);
                }
            }
        }

        false
    }

    /// Innovation of the newest connection lying on a cycle, if any.
    ///
    /// Uses the outgoing lists, so they must be current.
    #[must_use]
    pub fn find_cycle(&self) -> Option<u64> {
        self.connections
            .values()
            .filter(|c| self.reaches(c.output, c.input))
            .map(|c| c.innovation)
            .max()
    }

    /// Check if the connections contain a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }
}
